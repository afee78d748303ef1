//! # GlucoLink Backend
//!
//! HTTP backend for a diabetes companion app: accounts, threaded
//! patient-provider messaging, emergency contacts and calls, and health
//! metric logs, all kept in a document store.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (services, models)
//!     ↓
//! Storage Layer (document store on SQLite)
//! ```
//!
//! Outbound calls go through the `telephony` module; `config` is read once at
//! startup.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;
pub mod telephony;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use url::Url;

use crate::config::AppConfig;
use crate::domain::{
    AccountService, CallService, Clock, ContactService, ConversationService, MetricsService,
    PatientDirectory, ProfileService, SystemClock, ThreadCounter,
};
use crate::storage::{DbConnection, DocumentStore};
use crate::telephony::{CallProvider, TwilioCallProvider, UnconfiguredCallProvider};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub conversation_service: ConversationService,
    pub contact_service: ContactService,
    pub metrics_service: MetricsService,
    pub profile_service: ProfileService,
    pub call_service: CallService,
}

impl AppState {
    /// Wire every service onto one store
    pub fn new(
        store: Arc<dyn DocumentStore>,
        call_provider: Arc<dyn CallProvider>,
        clock: Arc<dyn Clock>,
        public_base_url: Url,
    ) -> Self {
        let counter = ThreadCounter::new(store.clone());
        let directory = PatientDirectory::new(store.clone());

        Self {
            account_service: AccountService::new(store.clone(), directory, counter.clone()),
            conversation_service: ConversationService::new(store.clone(), counter, clock.clone()),
            contact_service: ContactService::new(store.clone()),
            metrics_service: MetricsService::new(store.clone(), clock),
            profile_service: ProfileService::new(store),
            call_service: CallService::new(call_provider, public_base_url),
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up database at {}", config.database_url);
    let db = DbConnection::new(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;

    let call_provider: Arc<dyn CallProvider> = match &config.twilio {
        Some(twilio) => {
            info!("Outbound calls enabled from {}", twilio.from_number);
            Arc::new(TwilioCallProvider::new(twilio.clone()))
        }
        None => {
            warn!("TWILIO_* not set, emergency calls are disabled");
            Arc::new(UnconfiguredCallProvider)
        }
    };

    info!("Setting up application state");
    Ok(AppState::new(
        Arc::new(db),
        call_provider,
        Arc::new(SystemClock),
        config.public_base_url.clone(),
    ))
}

/// CORS for the given origin, or for any origin when `None`
pub fn cors_layer(allow_origin: Option<&str>) -> Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Ok(match allow_origin {
        Some(origin) => cors.allow_origin(
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin {origin}"))?,
        ),
        None => cors.allow_origin(Any),
    })
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .merge(io::rest::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_rejects_invalid_origin() {
        assert!(cors_layer(Some("https://app.example.com")).is_ok());
        assert!(cors_layer(None).is_ok());
        assert!(cors_layer(Some("bad\norigin")).is_err());
    }
}
