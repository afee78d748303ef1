//! # REST API Interface Layer
//!
//! HTTP endpoints of the companion backend. Handlers only extract and log
//! the request, call one domain service and wrap the outcome in the
//! `{success, message|data|error}` envelope. Domain errors become HTTP
//! statuses in [`error::ApiError`].

pub mod account_apis;
pub mod call_apis;
pub mod contact_apis;
pub mod conversation_apis;
pub mod error;
pub mod mappers;
pub mod metrics_apis;
pub mod profile_apis;

#[cfg(test)]
mod test_support;

use axum::{response::Json, routing::get, Router};
use shared::HealthResponse;

use crate::AppState;

/// Every endpoint of the API, mounted at the root
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(account_apis::router())
        .merge(conversation_apis::router())
        .merge(contact_apis::router())
        .merge(call_apis::router())
        .merge(metrics_apis::router())
        .merge(profile_apis::router())
}

/// Liveness probe
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        message: "GlucoLink backend is running".to_string(),
    })
}
