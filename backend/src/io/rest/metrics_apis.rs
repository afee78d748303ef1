//! # REST API for Health Metrics
//!
//! Blood pressure, glucose and meal logs. Reads take optional `start` and
//! `end` ISO 8601 bounds.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use shared::{AddGlucoseRequest, AddMealRequest, AddPressureRequest, ApiEnvelope, CreatedResponse, MetricRangeQuery};
use tracing::{error, info};

use crate::io::rest::error::ApiError;
use crate::io::rest::mappers::MetricsMapper;
use crate::AppState;

/// Create a router for metric related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add_pressure_value", post(add_pressure_value))
        .route("/get_pressure_value/:username", get(get_pressure_value))
        .route("/add_glucose_value", post(add_glucose_value))
        .route("/get_glucose_value/:username", get(get_glucose_value))
        .route("/add_meal", post(add_meal))
        .route("/get_meals/:username", get(get_meals))
}

pub async fn add_pressure_value(
    State(state): State<AppState>,
    Json(request): Json<AddPressureRequest>,
) -> impl IntoResponse {
    info!("POST /add_pressure_value - username: {}", request.username);

    match state
        .metrics_service
        .add_pressure(
            &request.username,
            request.systolic,
            request.diastolic,
            request.timestamp.as_deref(),
        )
        .await
    {
        Ok(id) => (
            StatusCode::CREATED,
            Json(ApiEnvelope::with_message("Pressure value added", CreatedResponse { id })),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to add pressure value for {}: {}", request.username, e);
            ApiError::from(e).into_response()
        }
    }
}

/// Pressure readings in range, oldest first
pub async fn get_pressure_value(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(range): Query<MetricRangeQuery>,
) -> impl IntoResponse {
    info!("GET /get_pressure_value/{} - range: {:?}", username, range);

    let result = match MetricsMapper::to_time_range(&range) {
        Ok(range) => state.metrics_service.list_pressure(&username, range).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(readings) => {
            let readings: Vec<_> = readings.into_iter().map(MetricsMapper::pressure_to_dto).collect();
            (StatusCode::OK, Json(ApiEnvelope::data(readings))).into_response()
        }
        Err(e) => {
            error!("Failed to get pressure values for {}: {}", username, e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn add_glucose_value(
    State(state): State<AppState>,
    Json(request): Json<AddGlucoseRequest>,
) -> impl IntoResponse {
    info!("POST /add_glucose_value - username: {}", request.username);

    match state
        .metrics_service
        .add_glucose(&request.username, request.glucose_level, request.timestamp.as_deref())
        .await
    {
        Ok(id) => (
            StatusCode::CREATED,
            Json(ApiEnvelope::with_message("Glucose value added", CreatedResponse { id })),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to add glucose value for {}: {}", request.username, e);
            ApiError::from(e).into_response()
        }
    }
}

/// Glucose readings in range, oldest first
pub async fn get_glucose_value(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(range): Query<MetricRangeQuery>,
) -> impl IntoResponse {
    info!("GET /get_glucose_value/{} - range: {:?}", username, range);

    let result = match MetricsMapper::to_time_range(&range) {
        Ok(range) => state.metrics_service.list_glucose(&username, range).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(readings) => {
            let readings: Vec<_> = readings.into_iter().map(MetricsMapper::glucose_to_dto).collect();
            (StatusCode::OK, Json(ApiEnvelope::data(readings))).into_response()
        }
        Err(e) => {
            error!("Failed to get glucose values for {}: {}", username, e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn add_meal(
    State(state): State<AppState>,
    Json(request): Json<AddMealRequest>,
) -> impl IntoResponse {
    info!("POST /add_meal - username: {}, meal: {}", request.username, request.meal);

    match state
        .metrics_service
        .add_meal(
            &request.username,
            &request.meal,
            request.carbohydrates,
            request.calories,
            request.timestamp.as_deref(),
        )
        .await
    {
        Ok(id) => (
            StatusCode::CREATED,
            Json(ApiEnvelope::with_message("Meal added", CreatedResponse { id })),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to add meal for {}: {}", request.username, e);
            ApiError::from(e).into_response()
        }
    }
}

/// The ten most recent meals in range, newest first
pub async fn get_meals(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(range): Query<MetricRangeQuery>,
) -> impl IntoResponse {
    info!("GET /get_meals/{} - range: {:?}", username, range);

    let result = match MetricsMapper::to_time_range(&range) {
        Ok(range) => state.metrics_service.list_meals(&username, range).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(meals) => {
            let meals: Vec<_> = meals.into_iter().map(MetricsMapper::meal_to_dto).collect();
            (StatusCode::OK, Json(ApiEnvelope::data(meals))).into_response()
        }
        Err(e) => {
            error!("Failed to get meals for {}: {}", username, e);
            ApiError::from(e).into_response()
        }
    }
}
