//! # REST API for Profiles
//!
//! Single-field updates of the user record and of the personal metrics
//! document, plus the combined profile read.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use shared::{
    AddPersonalMetricsRequest, ApiEnvelope, UpdateAllergiesRequest, UpdateBloodGlucoseLevelRequest,
    UpdateDateOfBirthRequest, UpdateEmailRequest, UpdateEmergencyContactRequest, UpdateHeightRequest,
    UpdateInsulinDosageRequest, UpdateNameRequest, UpdatePhoneNumberRequest, UpdateWeightRequest,
};
use tracing::{error, info};

use crate::domain::ServiceResult;
use crate::io::rest::error::ApiError;
use crate::io::rest::mappers::UserMapper;
use crate::AppState;

/// Create a router for profile related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/update_name", post(update_name))
        .route("/update_email", post(update_email))
        .route("/update_phone_number", post(update_phone_number))
        .route("/update_date_of_birth", post(update_date_of_birth))
        .route("/update_emergency_contact", post(update_emergency_contact))
        .route("/add_personal_metrics", post(add_personal_metrics))
        .route("/update_weight", post(update_weight))
        .route("/update_height", post(update_height))
        .route("/update_blood_glucose_level", post(update_blood_glucose_level))
        .route("/update_insulin_dosage", post(update_insulin_dosage))
        .route("/update_allergies", post(update_allergies))
        .route("/get_profile_data/:username", get(get_profile_data))
}

/// Shared response for the single-field updates
fn updated(field: &str, username: &str, result: ServiceResult<()>) -> Response {
    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiEnvelope::message(format!("{field} updated successfully"))),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to update {} for {}: {}", field, username, e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn update_name(
    State(state): State<AppState>,
    Json(request): Json<UpdateNameRequest>,
) -> impl IntoResponse {
    info!("POST /update_name - username: {}", request.username);
    let result = state.profile_service.update_name(&request.username, &request.full_name).await;
    updated("Name", &request.username, result)
}

pub async fn update_email(
    State(state): State<AppState>,
    Json(request): Json<UpdateEmailRequest>,
) -> impl IntoResponse {
    info!("POST /update_email - username: {}", request.username);
    let result = state.profile_service.update_email(&request.username, &request.email).await;
    updated("Email", &request.username, result)
}

pub async fn update_phone_number(
    State(state): State<AppState>,
    Json(request): Json<UpdatePhoneNumberRequest>,
) -> impl IntoResponse {
    info!("POST /update_phone_number - username: {}", request.username);
    let result = state
        .profile_service
        .update_phone_number(&request.username, &request.phone_number)
        .await;
    updated("Phone number", &request.username, result)
}

pub async fn update_date_of_birth(
    State(state): State<AppState>,
    Json(request): Json<UpdateDateOfBirthRequest>,
) -> impl IntoResponse {
    info!("POST /update_date_of_birth - username: {}", request.username);
    let result = state
        .profile_service
        .update_date_of_birth(&request.username, &request.date_of_birth)
        .await;
    updated("Date of birth", &request.username, result)
}

pub async fn update_emergency_contact(
    State(state): State<AppState>,
    Json(request): Json<UpdateEmergencyContactRequest>,
) -> impl IntoResponse {
    info!("POST /update_emergency_contact - username: {}", request.username);
    let result = state
        .profile_service
        .update_emergency_contact(&request.username, &request.emergency_contact)
        .await;
    updated("Emergency contact", &request.username, result)
}

/// Create or replace the personal metrics document
pub async fn add_personal_metrics(
    State(state): State<AppState>,
    Json(request): Json<AddPersonalMetricsRequest>,
) -> impl IntoResponse {
    info!("POST /add_personal_metrics - username: {}", request.username);

    let metrics = UserMapper::metrics_to_domain(request.metrics);
    match state.profile_service.save_personal_metrics(&request.username, metrics).await {
        Ok(()) => (StatusCode::CREATED, Json(ApiEnvelope::message("Personal metrics saved"))).into_response(),
        Err(e) => {
            error!("Failed to save personal metrics for {}: {}", request.username, e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn update_weight(
    State(state): State<AppState>,
    Json(request): Json<UpdateWeightRequest>,
) -> impl IntoResponse {
    info!("POST /update_weight - username: {}", request.username);
    let result = state.profile_service.update_weight(&request.username, request.weight).await;
    updated("Weight", &request.username, result)
}

pub async fn update_height(
    State(state): State<AppState>,
    Json(request): Json<UpdateHeightRequest>,
) -> impl IntoResponse {
    info!("POST /update_height - username: {}", request.username);
    let result = state.profile_service.update_height(&request.username, request.height).await;
    updated("Height", &request.username, result)
}

pub async fn update_blood_glucose_level(
    State(state): State<AppState>,
    Json(request): Json<UpdateBloodGlucoseLevelRequest>,
) -> impl IntoResponse {
    info!("POST /update_blood_glucose_level - username: {}", request.username);
    let result = state
        .profile_service
        .update_blood_glucose_level(&request.username, request.blood_glucose_level)
        .await;
    updated("Blood glucose level", &request.username, result)
}

pub async fn update_insulin_dosage(
    State(state): State<AppState>,
    Json(request): Json<UpdateInsulinDosageRequest>,
) -> impl IntoResponse {
    info!("POST /update_insulin_dosage - username: {}", request.username);
    let result = state
        .profile_service
        .update_insulin_dosage(&request.username, request.insulin_dosage)
        .await;
    updated("Insulin dosage", &request.username, result)
}

pub async fn update_allergies(
    State(state): State<AppState>,
    Json(request): Json<UpdateAllergiesRequest>,
) -> impl IntoResponse {
    info!("POST /update_allergies - username: {}", request.username);
    let result = state
        .profile_service
        .update_allergies(&request.username, &request.allergies)
        .await;
    updated("Allergies", &request.username, result)
}

/// User record plus personal metrics
pub async fn get_profile_data(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    info!("GET /get_profile_data/{}", username);

    match state.profile_service.get_profile(&username).await {
        Ok((user, metrics)) => (
            StatusCode::OK,
            Json(ApiEnvelope::data(UserMapper::to_profile_dto(user, metrics))),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to load profile of {}: {}", username, e);
            ApiError::from(e).into_response()
        }
    }
}
