//! # REST API for Accounts
//!
//! Signup, signin, thread counter initialization and the patient/doctor
//! lookups.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use shared::{
    ApiEnvelope, InitializeCounterRequest, MyDoctorResponse, SigninRequest, SignupRequest,
    UsernameResponse,
};
use tracing::{error, info};

use crate::io::rest::error::ApiError;
use crate::io::rest::mappers::UserMapper;
use crate::AppState;

/// Create a router for account related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/initialize_counter", post(initialize_counter))
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/get_username_by_patient_id/:patient_id", get(get_username_by_patient_id))
        .route("/get_my_doctor/:username", get(get_my_doctor))
}

/// Reset a user's thread numbering
pub async fn initialize_counter(
    State(state): State<AppState>,
    Json(request): Json<InitializeCounterRequest>,
) -> impl IntoResponse {
    info!("POST /initialize_counter - username: {}", request.username);

    match state.account_service.initialize_counter(&request.username).await {
        Ok(()) => (StatusCode::OK, Json(ApiEnvelope::message("Thread counter initialized"))).into_response(),
        Err(e) => {
            error!("Failed to initialize counter for {}: {}", request.username, e);
            ApiError::from(e).into_response()
        }
    }
}

/// Create a new user
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> impl IntoResponse {
    info!("POST /signup - username: {}, role: {}", request.username, request.role);

    let username = request.username.clone();
    match state.account_service.signup(UserMapper::to_signup_command(request)).await {
        Ok(user) => (
            StatusCode::CREATED,
            Json(ApiEnvelope::with_message(
                "User registered successfully",
                UserMapper::to_dto(user),
            )),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to sign up {}: {}", username, e);
            ApiError::from(e).into_response()
        }
    }
}

/// Authenticate a user and return their record
pub async fn signin(
    State(state): State<AppState>,
    Json(request): Json<SigninRequest>,
) -> impl IntoResponse {
    info!("POST /signin - username: {}", request.username);

    match state.account_service.signin(&request.username, &request.password).await {
        Ok(user) => (
            StatusCode::OK,
            Json(ApiEnvelope::with_message("Signin successful", UserMapper::to_dto(user))),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to sign in {}: {}", request.username, e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn get_username_by_patient_id(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /get_username_by_patient_id/{}", patient_id);

    match state.account_service.username_for_patient(&patient_id).await {
        Ok(username) => (StatusCode::OK, Json(ApiEnvelope::data(UsernameResponse { username }))).into_response(),
        Err(e) => {
            error!("Failed to resolve patient ID {}: {}", patient_id, e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn get_my_doctor(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    info!("GET /get_my_doctor/{}", username);

    match state.account_service.my_doctor(&username).await {
        Ok(my_doctor) => (StatusCode::OK, Json(ApiEnvelope::data(MyDoctorResponse { my_doctor }))).into_response(),
        Err(e) => {
            error!("Failed to get doctor of {}: {}", username, e);
            ApiError::from(e).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::io::rest::test_support::{send, setup_test_app, signup};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_signup_signin_and_doctor_link() {
        let app = setup_test_app().await;

        let (status, body) = signup(&app, "alice", "Patient", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert!(body["data"].get("password").is_none());
        let patient_id = body["data"]["patientID"].as_str().unwrap().to_string();

        let (status, _) = signup(&app, "alice", "Patient", None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(&app, Method::GET, &format!("/get_username_by_patient_id/{patient_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["username"], "alice");

        let (status, _) = signup(&app, "drsmith", "Doctor", Some(&patient_id)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, Method::GET, "/get_my_doctor/alice", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["myDoctor"], "drsmith");
    }

    #[tokio::test]
    async fn test_signin_statuses() {
        let app = setup_test_app().await;
        signup(&app, "alice", "Patient", None).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/signin",
            Some(json!({"username": "alice", "password": "hunter2"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["username"], "alice");

        let (status, body) = send(
            &app,
            Method::POST,
            "/signin",
            Some(json!({"username": "alice", "password": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _) = send(
            &app,
            Method::POST,
            "/signin",
            Some(json!({"username": "ghost", "password": "hunter2"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_patient_id_and_missing_doctor() {
        let app = setup_test_app().await;
        signup(&app, "alice", "Patient", None).await;

        let (status, _) = send(&app, Method::GET, "/get_username_by_patient_id/00000", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::GET, "/get_my_doctor/alice", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
