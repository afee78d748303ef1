//! Outbound voice calls.
//!
//! The backend only places calls; what the callee hears is served by the
//! `/voice` endpoint, whose URL is handed to the provider with each call.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info};
use url::Url;

use crate::config::TwilioConfig;

const TWILIO_API_BASE: &str = "https://api.twilio.com";

#[derive(Debug, thiserror::Error)]
pub enum TelephonyError {
    #[error("call provider is not configured")]
    NotConfigured,
    #[error("request to call provider failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("call provider rejected the call with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Places outbound calls that fetch their script from `callback`
#[async_trait]
pub trait CallProvider: Send + Sync {
    /// Dial `to` and return the provider's call id
    async fn place_call(&self, to: &str, callback: &Url) -> Result<String, TelephonyError>;
}

/// Twilio's REST Calls API
pub struct TwilioCallProvider {
    client: reqwest::Client,
    config: TwilioConfig,
    api_base: String,
}

#[derive(Deserialize)]
struct CallResource {
    sid: String,
}

impl TwilioCallProvider {
    pub fn new(config: TwilioConfig) -> Self {
        Self::with_api_base(config, TWILIO_API_BASE)
    }

    pub fn with_api_base(config: TwilioConfig, api_base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn calls_endpoint(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.api_base, self.config.account_sid
        )
    }
}

#[async_trait]
impl CallProvider for TwilioCallProvider {
    async fn place_call(&self, to: &str, callback: &Url) -> Result<String, TelephonyError> {
        info!("Placing call to {}", to);

        let response = self
            .client
            .post(self.calls_endpoint())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", to),
                ("From", self.config.from_number.as_str()),
                ("Url", callback.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Call provider returned {}: {}", status, body);
            return Err(TelephonyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let call: CallResource = response.json().await?;
        info!("Call {} queued", call.sid);
        Ok(call.sid)
    }
}

/// Used when no provider credentials are configured; every call fails
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredCallProvider;

#[async_trait]
impl CallProvider for UnconfiguredCallProvider {
    async fn place_call(&self, _to: &str, _callback: &Url) -> Result<String, TelephonyError> {
        Err(TelephonyError::NotConfigured)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Form, Path, State},
        http::{header, HeaderMap, StatusCode},
        response::{IntoResponse, Json, Response},
        routing::post,
        Router,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn config() -> TwilioConfig {
        TwilioConfig {
            account_sid: "AC123".into(),
            auth_token: "secret".into(),
            from_number: "+15550009999".into(),
        }
    }

    /// account sid, Authorization header, form fields
    type SeenRequest = (String, Option<String>, HashMap<String, String>);

    #[derive(Clone, Default)]
    struct FakeTwilio {
        requests: Arc<Mutex<Vec<SeenRequest>>>,
    }

    async fn create_call(
        State(fake): State<FakeTwilio>,
        Path(account): Path<String>,
        headers: HeaderMap,
        Form(form): Form<HashMap<String, String>>,
    ) -> Response {
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        fake.requests.lock().unwrap().push((account.clone(), auth, form));

        if account == "ACbad" {
            return (
                StatusCode::UNAUTHORIZED,
                r#"{"code":20003,"message":"Authenticate"}"#,
            )
                .into_response();
        }
        (
            StatusCode::CREATED,
            Json(json!({"sid": "CA0123456789abcdef0123456789abcdef", "status": "queued"})),
        )
            .into_response()
    }

    /// Serve the Calls endpoint on an ephemeral local port
    async fn spawn_fake_twilio() -> (String, FakeTwilio) {
        let fake = FakeTwilio::default();
        let app = Router::new()
            .route("/2010-04-01/Accounts/:account/Calls.json", post(create_call))
            .with_state(fake.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}"), fake)
    }

    #[tokio::test]
    async fn test_place_call_posts_form_with_basic_auth() {
        let (base, fake) = spawn_fake_twilio().await;
        let provider = TwilioCallProvider::with_api_base(config(), &base);
        let callback = Url::parse("http://localhost:5000/voice?message=Help%3F").unwrap();

        let sid = provider.place_call("+15550001111", &callback).await.unwrap();
        assert_eq!(sid, "CA0123456789abcdef0123456789abcdef");

        let requests = fake.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (account, auth, form) = &requests[0];
        assert_eq!(account, "AC123");
        assert_eq!(auth.as_deref(), Some("Basic QUMxMjM6c2VjcmV0"));
        assert_eq!(form["To"], "+15550001111");
        assert_eq!(form["From"], "+15550009999");
        assert_eq!(form["Url"], "http://localhost:5000/voice?message=Help%3F");
    }

    #[tokio::test]
    async fn test_non_success_status_is_rejected() {
        let (base, _fake) = spawn_fake_twilio().await;
        let provider = TwilioCallProvider::with_api_base(
            TwilioConfig {
                account_sid: "ACbad".into(),
                ..config()
            },
            &base,
        );
        let callback = Url::parse("http://localhost:5000/voice").unwrap();

        match provider.place_call("+15550001111", &callback).await {
            Err(TelephonyError::Rejected { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("Authenticate"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_calls_endpoint_includes_account() {
        let provider = TwilioCallProvider::with_api_base(config(), "http://localhost:9000/");
        assert_eq!(
            provider.calls_endpoint(),
            "http://localhost:9000/2010-04-01/Accounts/AC123/Calls.json"
        );
    }

    #[tokio::test]
    async fn test_unconfigured_provider_refuses() {
        let callback = Url::parse("http://localhost:5000/voice").unwrap();
        assert!(matches!(
            UnconfiguredCallProvider.place_call("+15550001111", &callback).await,
            Err(TelephonyError::NotConfigured)
        ));
    }
}
