//! Domain records as they are persisted in the document store.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::storage::{StoreError, StoreResult};

pub mod contact;
pub mod message;
pub mod metrics;
pub mod user;

pub use contact::Contact;
pub use message::{ConversationSummary, Message, ThreadId};
pub use metrics::{GlucoseReading, MealEntry, PressureReading, TimeRange};
pub use user::{PersonalMetrics, Role, UserRecord};

/// A document read back from the store with its store-assigned id
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    pub id: String,
    pub value: T,
}

/// Deserialize a stored document, reporting shape mismatches against `path`
pub fn decode_document<T: DeserializeOwned>(path: &str, data: Value) -> StoreResult<T> {
    serde_json::from_value(data).map_err(|e| StoreError::MalformedDocument {
        path: path.to_string(),
        reason: e.to_string(),
    })
}
