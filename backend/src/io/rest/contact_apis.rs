//! # REST API for Emergency Contacts

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use shared::{AddContactRequest, ApiEnvelope, CreatedResponse, DeleteContactRequest, DeleteContactResponse};
use tracing::{error, info};

use crate::io::rest::error::ApiError;
use crate::io::rest::mappers::ContactMapper;
use crate::AppState;

/// Create a router for contact related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add_contact", post(add_contact))
        .route("/delete_contact", post(delete_contact))
        .route("/get_all_contacts/:username", get(get_all_contacts))
}

pub async fn add_contact(
    State(state): State<AppState>,
    Json(request): Json<AddContactRequest>,
) -> impl IntoResponse {
    info!("POST /add_contact - username: {}, name: {}", request.username, request.name);

    let (username, contact) = ContactMapper::to_domain(request);
    match state.contact_service.add_contact(&username, contact).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(ApiEnvelope::with_message("Contact added", CreatedResponse { id })),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to add contact for {}: {}", username, e);
            ApiError::from(e).into_response()
        }
    }
}

/// Delete all contacts with the given name
pub async fn delete_contact(
    State(state): State<AppState>,
    Json(request): Json<DeleteContactRequest>,
) -> impl IntoResponse {
    info!("POST /delete_contact - username: {}, name: {}", request.username, request.name);

    match state.contact_service.delete_contact(&request.username, &request.name).await {
        Ok(deleted) => (
            StatusCode::OK,
            Json(ApiEnvelope::with_message("Contact deleted", DeleteContactResponse { deleted })),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to delete contact for {}: {}", request.username, e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn get_all_contacts(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    info!("GET /get_all_contacts/{}", username);

    match state.contact_service.list_contacts(&username).await {
        Ok(contacts) => {
            let contacts: Vec<_> = contacts.into_iter().map(ContactMapper::to_dto).collect();
            (StatusCode::OK, Json(ApiEnvelope::data(contacts))).into_response()
        }
        Err(e) => {
            error!("Failed to list contacts for {}: {}", username, e);
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
    async fn test_contacts_flow() {
        let app = setup_test_app().await;
        signup(&app, "alice", "Patient", None).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/add_contact",
            Some(json!({
                "username": "alice",
                "name": "Bob",
                "relationship": "Brother",
                "phone_number": "+15550001111",
                "glucose_level_alert": true
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (_, body) = send(&app, Method::GET, "/get_all_contacts/alice", None).await;
        assert_eq!(body["data"][0]["id"], id.as_str());
        assert_eq!(body["data"][0]["glucose_level_alert"], true);
        assert_eq!(body["data"][0]["medication_reminder"], false);

        let (status, body) = send(
            &app,
            Method::POST,
            "/delete_contact",
            Some(json!({"username": "alice", "name": "Bob"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["deleted"], 1);

        let (status, _) = send(
            &app,
            Method::POST,
            "/delete_contact",
            Some(json!({"username": "alice", "name": "Bob"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_add_contact_for_unknown_user() {
        let app = setup_test_app().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/add_contact",
            Some(json!({
                "username": "ghost",
                "name": "Bob",
                "relationship": "Brother",
                "phone_number": "+15550001111"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }
}
