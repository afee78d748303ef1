use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::info;

use crate::domain::error::ServiceResult;
use crate::storage::{layout, DocumentStore, StoreError, StoreResult};

const LAST_THREAD_NUMBER: &str = "last_thread_number";

/// Per-user monotonic thread number generator backed by
/// `users/{username}/feedback/thread_counter`
#[derive(Clone)]
pub struct ThreadCounter {
    store: Arc<dyn DocumentStore>,
}

impl ThreadCounter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Set the counter to 0.
    ///
    /// This is an unconditional overwrite: calling it for a user who already
    /// has threads restarts numbering at 1, and the next `start_thread` will
    /// overwrite `thread1`.
    pub async fn initialize(&self, username: &str) -> ServiceResult<()> {
        info!("Initializing thread counter for {}", username);

        let path = layout::thread_counter(username)?;
        let mut doc = Map::new();
        doc.insert(LAST_THREAD_NUMBER.to_string(), json!(0));
        self.store.set(&path, Value::Object(doc)).await?;

        Ok(())
    }

    /// Atomically increment the counter and return the new value.
    ///
    /// A missing counter counts as 0. Concurrent callers for the same user
    /// each receive a distinct value and no value is skipped.
    pub async fn increment_and_get(&self, username: &str) -> ServiceResult<u64> {
        let path = layout::thread_counter(username)?;

        let increment = |current: Option<&Value>| -> StoreResult<Value> {
            let mut doc = current.and_then(Value::as_object).cloned().unwrap_or_default();
            let last = doc.get(LAST_THREAD_NUMBER).and_then(Value::as_u64).unwrap_or(0);
            doc.insert(LAST_THREAD_NUMBER.to_string(), json!(last + 1));
            Ok(Value::Object(doc))
        };
        let written = self.store.run_transaction(&path, &increment).await?;

        let next = written
            .get(LAST_THREAD_NUMBER)
            .and_then(Value::as_u64)
            .ok_or_else(|| StoreError::MalformedDocument {
                path: path.to_string(),
                reason: format!("{LAST_THREAD_NUMBER} is not a non-negative integer"),
            })?;

        info!("Allocated thread number {} for {}", next, username);
        Ok(next)
    }
}
