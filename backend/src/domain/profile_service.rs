use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::info;

use crate::domain::account_service::require_user;
use crate::domain::error::{not_found_as, require, require_positive, ServiceError, ServiceResult};
use crate::domain::models::{decode_document, PersonalMetrics, UserRecord};
use crate::storage::{layout, DocumentStore};

/// Editable profile fields on the user document and the separate
/// personal-metrics document
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn update_name(&self, username: &str, full_name: &str) -> ServiceResult<()> {
        let full_name = require("fullName", full_name)?;
        self.update_user_field(username, "fullName", Value::from(full_name)).await
    }

    pub async fn update_email(&self, username: &str, email: &str) -> ServiceResult<()> {
        let email = require("email", email)?;
        if !email.contains('@') {
            return Err(ServiceError::Validation("email is not a valid address".into()));
        }
        self.update_user_field(username, "email", Value::from(email)).await
    }

    pub async fn update_phone_number(&self, username: &str, phone_number: &str) -> ServiceResult<()> {
        let phone_number = require("phone_number", phone_number)?;
        self.update_user_field(username, "phone_number", Value::from(phone_number))
            .await
    }

    pub async fn update_date_of_birth(&self, username: &str, date_of_birth: &str) -> ServiceResult<()> {
        let date_of_birth = require("date_of_birth", date_of_birth)?;
        self.update_user_field(username, "date_of_birth", Value::from(date_of_birth))
            .await
    }

    pub async fn update_emergency_contact(&self, username: &str, emergency_contact: &str) -> ServiceResult<()> {
        let emergency_contact = require("emergency_contact", emergency_contact)?;
        self.update_user_field(username, "emergency_contact", Value::from(emergency_contact))
            .await
    }

    /// Create or replace the personal-metrics document of an existing user
    pub async fn save_personal_metrics(&self, username: &str, metrics: PersonalMetrics) -> ServiceResult<()> {
        let username = require("username", username)?;
        let metrics = PersonalMetrics {
            weight: metrics.weight.map(|v| require_positive("weight", v)).transpose()?,
            height: metrics.height.map(|v| require_positive("height", v)).transpose()?,
            blood_glucose_level: metrics
                .blood_glucose_level
                .map(|v| require_positive("blood_glucose_level", v))
                .transpose()?,
            insulin_dosage: metrics
                .insulin_dosage
                .map(|v| require_positive("insulin_dosage", v))
                .transpose()?,
            allergies: metrics.allergies.map(|a| a.trim().to_string()),
        };
        require_user(self.store.as_ref(), username).await?;

        self.store
            .set(&layout::personal_info(username)?, serde_json::to_value(&metrics)?)
            .await?;

        info!("Saved personal metrics for {}", username);
        Ok(())
    }

    pub async fn update_weight(&self, username: &str, weight: f64) -> ServiceResult<()> {
        let weight = require_positive("weight", weight)?;
        self.update_metric(username, "weight", Value::from(weight)).await
    }

    pub async fn update_height(&self, username: &str, height: f64) -> ServiceResult<()> {
        let height = require_positive("height", height)?;
        self.update_metric(username, "height", Value::from(height)).await
    }

    pub async fn update_blood_glucose_level(&self, username: &str, level: f64) -> ServiceResult<()> {
        let level = require_positive("blood_glucose_level", level)?;
        self.update_metric(username, "blood_glucose_level", Value::from(level))
            .await
    }

    pub async fn update_insulin_dosage(&self, username: &str, dosage: f64) -> ServiceResult<()> {
        let dosage = require_positive("insulin_dosage", dosage)?;
        self.update_metric(username, "insulin_dosage", Value::from(dosage))
            .await
    }

    /// Allergies are free text; an empty string clears them
    pub async fn update_allergies(&self, username: &str, allergies: &str) -> ServiceResult<()> {
        self.update_metric(username, "allergies", Value::from(allergies.trim()))
            .await
    }

    /// The user record together with its personal metrics, if any were saved
    pub async fn get_profile(&self, username: &str) -> ServiceResult<(UserRecord, Option<PersonalMetrics>)> {
        let username = require("username", username)?;
        let user = require_user(self.store.as_ref(), username).await?;

        let path = layout::personal_info(username)?;
        let metrics = match self.store.get(&path).await? {
            Some(data) => Some(decode_document(&path.to_string(), data)?),
            None => None,
        };

        info!("Loaded profile for {}", username);
        Ok((user, metrics))
    }

    async fn update_user_field(&self, username: &str, field: &str, value: Value) -> ServiceResult<()> {
        let username = require("username", username)?;
        let mut fields = Map::new();
        fields.insert(field.to_string(), value);

        self.store
            .update(&layout::user(username)?, fields)
            .await
            .map_err(not_found_as("User not found"))?;

        info!("Updated {} for {}", field, username);
        Ok(())
    }

    /// Partial update of personal-info. Never creates the document.
    async fn update_metric(&self, username: &str, field: &str, value: Value) -> ServiceResult<()> {
        let username = require("username", username)?;
        let mut fields = Map::new();
        fields.insert(field.to_string(), value);

        self.store
            .update(&layout::personal_info(username)?, fields)
            .await
            .map_err(not_found_as("Personal metrics not found"))?;

        info!("Updated {} for {}", field, username);
        Ok(())
    }
}
