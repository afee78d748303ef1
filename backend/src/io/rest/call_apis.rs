//! # REST API for Emergency Calls
//!
//! `make_call` asks the call provider to dial out; the provider then fetches
//! `voice` to learn what to say.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Deserialize;
use shared::{ApiEnvelope, MakeCallRequest, MakeCallResponse};
use tracing::{error, info};

use crate::domain::voice_response;
use crate::io::rest::error::ApiError;
use crate::AppState;

/// Create a router for call related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/make_call", get(make_call_from_query).post(make_call))
        .route("/voice", get(voice).post(voice))
}

/// Query parameters of the voice callback
#[derive(Deserialize, Debug)]
pub struct VoiceQuery {
    #[serde(default)]
    pub message: Option<String>,
}

/// Place an emergency call, parameters in a JSON body
pub async fn make_call(
    State(state): State<AppState>,
    Json(request): Json<MakeCallRequest>,
) -> impl IntoResponse {
    info!("POST /make_call - to: {}", request.to);
    place_call(state, request).await
}

/// Place an emergency call, parameters in the query string
pub async fn make_call_from_query(
    State(state): State<AppState>,
    Query(request): Query<MakeCallRequest>,
) -> impl IntoResponse {
    info!("GET /make_call - to: {}", request.to);
    place_call(state, request).await
}

async fn place_call(state: AppState, request: MakeCallRequest) -> axum::response::Response {
    match state.call_service.make_call(&request.to, &request.message).await {
        Ok(call_sid) => (
            StatusCode::OK,
            Json(ApiEnvelope::with_message("Call initiated", MakeCallResponse { call_sid })),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to call {}: {}", request.to, e);
            ApiError::from(e).into_response()
        }
    }
}

/// Voice document for the provider to read out
pub async fn voice(Query(query): Query<VoiceQuery>) -> impl IntoResponse {
    info!("/voice - message: {:?}", query.message);

    let xml = voice_response(query.message.as_deref().unwrap_or_default());
    (StatusCode::OK, [(header::CONTENT_TYPE, "application/xml")], xml)
}

#[cfg(test)]
mod tests {
    use crate::io::rest::test_support::{send, setup_test_app};
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::json;
    use tower::util::ServiceExt; // for `oneshot`

    #[tokio::test]
    async fn test_make_call_by_body_and_query() {
        let app = setup_test_app().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/make_call",
            Some(json!({"to": "+15550001111", "message": "Alice needs help"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["call_sid"].as_str().unwrap().starts_with("CA"));

        let (status, _) = send(&app, Method::GET, "/make_call?to=%2B15550001111&message=hi", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::GET, "/make_call?to=nobody&message=hi", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_voice_returns_xml() {
        let app = setup_test_app().await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/voice?message=Are%20you%20ok%3F")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/xml");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let xml = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(xml.contains(r#"<Say>Are you ok?</Say><Pause length="2"/>"#));
    }
}
