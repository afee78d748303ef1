//! Shared fixtures for the router tests in each `*_apis` module

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`
use url::Url;

use crate::domain::clock::FixedClock;
use crate::storage::DbConnection;
use crate::telephony::testing::RecordingCallProvider;
use crate::AppState;

/// Full API router over a fresh in-memory store, with the clock pinned to
/// 2024-03-05 14:07 and calls recorded instead of placed
pub async fn setup_test_app() -> Router {
    let db = Arc::new(DbConnection::init_test().await.expect("Failed to create test database"));
    let app_state = AppState::new(
        db,
        Arc::new(RecordingCallProvider::default()),
        Arc::new(FixedClock::at("2024-03-05 14:07:00")),
        Url::parse("http://localhost:5000").unwrap(),
    );
    super::router().with_state(app_state)
}

/// Send one request and decode the JSON reply (`Null` for an empty body)
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Sign up `username` with password `hunter2`
pub async fn signup(app: &Router, username: &str, role: &str, patient_id: Option<&str>) -> (StatusCode, Value) {
    let mut body = json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "fullName": format!("{username} Example"),
        "role": role,
        "password": "hunter2"
    });
    if let Some(patient_id) = patient_id {
        body["patientID"] = json!(patient_id);
    }
    send(app, Method::POST, "/signup", Some(body)).await
}
