use std::sync::Arc;

use rand::Rng;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::domain::error::ServiceResult;
use crate::storage::{layout, DocumentStore, Query};

const PATIENT_ID_MIN: u32 = 10_000;
const PATIENT_ID_MAX: u32 = 99_999;

/// Maintains the `system_data/idmap` document mapping patient ids to usernames
#[derive(Clone)]
pub struct PatientDirectory {
    store: Arc<dyn DocumentStore>,
}

impl PatientDirectory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Merge `{patient_id: username}` into the directory inside a transaction.
    ///
    /// Concurrent registrations of different ids never lose each other. For
    /// the same id the last writer wins; ids are drawn to be unused, so that
    /// only happens if two signups draw the same id at the same moment.
    pub async fn register_patient_id(&self, patient_id: &str, username: &str) -> ServiceResult<()> {
        info!("Registering patient ID {} for {}", patient_id, username);

        let mut entry = Map::new();
        entry.insert(patient_id.to_string(), Value::String(username.to_string()));
        self.store.merge(&layout::patient_id_map(), entry).await?;

        Ok(())
    }

    /// Username owning `patient_id`. A missing directory document is an empty
    /// mapping.
    pub async fn resolve_username(&self, patient_id: &str) -> ServiceResult<Option<String>> {
        let directory = self.store.get(&layout::patient_id_map()).await?;

        Ok(directory
            .as_ref()
            .and_then(|doc| doc.get(patient_id.trim()))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Draw 5-digit ids until one is not held by any user.
    ///
    /// Termination is probabilistic: each draw collides with probability
    /// `users / 90_000`, and there is no upper bound on the number of draws.
    pub async fn generate_patient_id(&self) -> ServiceResult<String> {
        loop {
            let candidate = rand::thread_rng()
                .gen_range(PATIENT_ID_MIN..=PATIENT_ID_MAX)
                .to_string();

            let holders = self
                .store
                .query(
                    &layout::users(),
                    &Query::new().where_eq("patientID", candidate.as_str()).limit(1),
                )
                .await?;

            if holders.is_empty() {
                return Ok(candidate);
            }
            debug!("Patient ID {} already taken, drawing again", candidate);
        }
    }
}
