//! # REST API for Conversations
//!
//! Endpoints for opening threads, appending messages and reading threads
//! back.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use shared::{AddMessageRequest, ApiEnvelope, StartThreadRequest};
use tracing::{error, info};

use crate::io::rest::error::ApiError;
use crate::io::rest::mappers::ConversationMapper;
use crate::AppState;

/// Create a router for conversation related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start_new_thread", post(start_new_thread))
        .route("/add_message", post(add_message))
        .route("/get_all_conversations/:username", get(get_all_conversations))
        .route("/get_one_conversation/:username/:index", get(get_one_conversation))
}

/// Open a new numbered thread seeded with one message
pub async fn start_new_thread(
    State(state): State<AppState>,
    Json(request): Json<StartThreadRequest>,
) -> impl IntoResponse {
    info!(
        "POST /start_new_thread - username: {}, sender: {}",
        request.username, request.sender
    );

    match state
        .conversation_service
        .start_thread(&request.username, &request.sender, &request.message)
        .await
    {
        Ok(thread) => (
            StatusCode::CREATED,
            Json(ApiEnvelope::with_message(
                "Thread started",
                ConversationMapper::to_start_thread_response(thread),
            )),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to start thread for {}: {}", request.username, e);
            ApiError::from(e).into_response()
        }
    }
}

/// Append a message to an existing thread
pub async fn add_message(
    State(state): State<AppState>,
    Json(request): Json<AddMessageRequest>,
) -> impl IntoResponse {
    info!(
        "POST /add_message - username: {}, index: {}, sender: {}",
        request.username, request.index, request.sender
    );

    match state
        .conversation_service
        .append_message(&request.username, request.index, &request.message, &request.sender)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(ApiEnvelope::message("Message added"))).into_response(),
        Err(e) => {
            error!("Failed to add message for {}: {}", request.username, e);
            ApiError::from(e).into_response()
        }
    }
}

/// First message and length of every thread
pub async fn get_all_conversations(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    info!("GET /get_all_conversations/{}", username);

    match state.conversation_service.list_conversation_summaries(&username).await {
        Ok(summaries) => {
            let summaries: Vec<_> = summaries
                .into_iter()
                .map(ConversationMapper::to_summary_dto)
                .collect();
            (StatusCode::OK, Json(ApiEnvelope::data(summaries))).into_response()
        }
        Err(e) => {
            error!("Failed to list conversations for {}: {}", username, e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn get_one_conversation(
    State(state): State<AppState>,
    Path((username, index)): Path<(String, u64)>,
) -> impl IntoResponse {
    info!("GET /get_one_conversation/{}/{}", username, index);

    match state.conversation_service.get_conversation(&username, index).await {
        Ok(Some(messages)) => {
            let messages: Vec<_> = messages
                .into_iter()
                .map(ConversationMapper::to_message_dto)
                .collect();
            (StatusCode::OK, Json(ApiEnvelope::data(messages))).into_response()
        }
        Ok(None) => ApiError::new(StatusCode::NOT_FOUND, "Conversation not found").into_response(),
        Err(e) => {
            error!("Failed to get conversation {} for {}: {}", index, username, e);
            ApiError::from(e).into_response()
        }
    }
}
