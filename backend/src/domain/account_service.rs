use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::domain::directory_service::PatientDirectory;
use crate::domain::error::{not_found_as, require, ServiceError, ServiceResult};
use crate::domain::models::{decode_document, Role, UserRecord};
use crate::domain::password::{hash_password, verify_password};
use crate::domain::thread_counter::ThreadCounter;
use crate::storage::{layout, DocumentStore, StoreError};

/// Everything a client supplies to create an account
#[derive(Debug, Clone)]
pub struct SignupCommand {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub password: String,
    /// Only used for doctors: the patient to link to
    pub patient_id: Option<String>,
}

/// Read the user document for `username`, `None` when it does not exist
pub(crate) async fn load_user(store: &dyn DocumentStore, username: &str) -> ServiceResult<Option<UserRecord>> {
    let path = layout::user(username)?;
    match store.get(&path).await? {
        Some(data) => Ok(Some(decode_document(&path.to_string(), data)?)),
        None => Ok(None),
    }
}

/// Like [`load_user`] but a missing user is a `NotFound` error
pub(crate) async fn require_user(store: &dyn DocumentStore, username: &str) -> ServiceResult<UserRecord> {
    load_user(store, username)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found".into()))
}

/// Service for signup, signin and the account links between patients and
/// doctors
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn DocumentStore>,
    directory: PatientDirectory,
    counter: ThreadCounter,
}

impl AccountService {
    pub fn new(store: Arc<dyn DocumentStore>, directory: PatientDirectory, counter: ThreadCounter) -> Self {
        Self {
            store,
            directory,
            counter,
        }
    }

    /// Create a user.
    ///
    /// Patients get a fresh patient ID registered in the directory. A doctor
    /// naming a patient ID becomes that patient's `myDoctor`; an unknown ID
    /// fails before anything is written. Every new user starts with a
    /// thread counter at 0.
    pub async fn signup(&self, command: SignupCommand) -> ServiceResult<UserRecord> {
        let username = require("username", &command.username)?.to_string();
        let email = require("email", &command.email)?.to_string();
        let full_name = require("fullName", &command.full_name)?.to_string();
        let role = Role::from(require("role", &command.role)?.to_string());
        if command.password.is_empty() {
            return Err(ServiceError::Validation("password is required".into()));
        }
        info!("Signing up {} as {:?}", username, role);

        let linked_patient = match (&role, command.patient_id.as_deref().map(str::trim)) {
            (Role::Doctor, Some(patient_id)) if !patient_id.is_empty() => {
                let patient = self
                    .directory
                    .resolve_username(patient_id)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound("Patient ID not found".into()))?;
                Some(patient)
            }
            _ => None,
        };

        let patient_id = match role {
            Role::Patient => Some(self.directory.generate_patient_id().await?),
            _ => None,
        };

        let record = UserRecord {
            username: username.clone(),
            email,
            full_name,
            role,
            password_hash: hash_password(&command.password).await?,
            patient_id,
            my_doctor: None,
            phone_number: None,
            date_of_birth: None,
            emergency_contact: None,
        };

        let path = layout::user(&username)?;
        self.store
            .create(&path, serde_json::to_value(&record)?)
            .await
            .map_err(|e| match e {
                StoreError::AlreadyExists(_) => ServiceError::Conflict("Username already exists".into()),
                other => other.into(),
            })?;

        if let Some(patient_id) = &record.patient_id {
            self.directory.register_patient_id(patient_id, &username).await?;
        }

        if let Some(patient) = &linked_patient {
            let mut link = Map::new();
            link.insert("myDoctor".to_string(), Value::String(username.clone()));
            self.store
                .update(&layout::user(patient)?, link)
                .await
                .map_err(not_found_as("Linked patient no longer exists"))?;
            info!("Linked doctor {} to patient {}", username, patient);
        }

        self.counter.initialize(&username).await?;

        info!("Created user {}", username);
        Ok(record)
    }

    /// Check credentials and return the stored user
    pub async fn signin(&self, username: &str, password: &str) -> ServiceResult<UserRecord> {
        let username = require("username", username)?;
        info!("Signing in {}", username);

        let user = require_user(self.store.as_ref(), username).await?;
        if !verify_password(password, &user.password_hash).await? {
            warn!("Password mismatch for {}", username);
            return Err(ServiceError::Unauthorized("Invalid password".into()));
        }

        Ok(user)
    }

    /// Reset the user's thread numbering to 0
    pub async fn initialize_counter(&self, username: &str) -> ServiceResult<()> {
        let username = require("username", username)?;
        self.counter.initialize(username).await
    }

    /// Username registered for `patient_id`
    pub async fn username_for_patient(&self, patient_id: &str) -> ServiceResult<String> {
        let patient_id = require("patientId", patient_id)?;
        self.directory
            .resolve_username(patient_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Patient ID not found".into()))
    }

    /// Username of the doctor linked to `username`
    pub async fn my_doctor(&self, username: &str) -> ServiceResult<String> {
        let username = require("username", username)?;
        let user = require_user(self.store.as_ref(), username).await?;

        user.my_doctor
            .filter(|doctor| !doctor.is_empty())
            .ok_or_else(|| ServiceError::NotFound("No doctor assigned".into()))
    }
}
