//! # Storage Traits
//!
//! The document store abstraction the domain layer is written against.
//!
//! A document is a JSON object addressed by a [`DocPath`]. The store offers
//! strongly consistent single-document reads and one atomic primitive,
//! [`DocumentStore::run_transaction`], which performs a read-compute-write on
//! a single document while holding off every other writer. Merge-writes,
//! update-only writes, create-only writes and array unions are all built on
//! top of that primitive.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::paths::{CollectionPath, DocPath};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("document already exists: {0}")]
    AlreadyExists(String),
    #[error("invalid document path: {0}")]
    InvalidPath(String),
    #[error("malformed document at {path}: {reason}")]
    MalformedDocument { path: String, reason: String },
    #[error("unsupported filter value for field {0}")]
    UnsupportedFilter(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to (de)serialize document: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A stored document together with its id inside the collection
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lte,
}

impl FilterOp {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Gte => ">=",
            FilterOp::Lte => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Field filters, ordering and limit applied to one collection.
///
/// Without an explicit ordering, documents come back in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq, value.into())
    }

    pub fn where_gte(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Gte, value.into())
    }

    pub fn where_lte(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Lte, value.into())
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    fn filter(mut self, field: &str, op: FilterOp, value: Value) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op,
            value,
        });
        self
    }
}

/// Computes the next state of a document from its current state (`None` when
/// the document does not exist). Returning an error aborts the transaction
/// without writing.
pub type TransactionFn<'a> = &'a (dyn Fn(Option<&Value>) -> StoreResult<Value> + Send + Sync);

/// Trait defining the interface for document storage operations
///
/// This trait abstracts away the specific storage implementation details,
/// allowing the domain layer to work with different storage backends
/// without modification.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a single document
    async fn get(&self, path: &DocPath) -> StoreResult<Option<Value>>;

    /// Create or overwrite a document
    async fn set(&self, path: &DocPath, data: Value) -> StoreResult<()>;

    /// Store a document under a fresh store-assigned id and return that id
    async fn add(&self, collection: &CollectionPath, data: Value) -> StoreResult<String>;

    /// Delete a document. Returns true if it existed.
    async fn delete(&self, path: &DocPath) -> StoreResult<bool>;

    /// All documents of a collection, in insertion order
    async fn list(&self, collection: &CollectionPath) -> StoreResult<Vec<Document>>;

    /// Documents of a collection matching `query`
    async fn query(&self, collection: &CollectionPath, query: &Query) -> StoreResult<Vec<Document>>;

    /// Atomically replace a document with `apply(current)` and return the
    /// written value.
    ///
    /// Two concurrent transactions on the same document never both commit a
    /// value computed from the same snapshot: the second one waits and reads
    /// what the first wrote.
    async fn run_transaction(&self, path: &DocPath, apply: TransactionFn<'_>) -> StoreResult<Value>;

    /// Merge top-level `fields` into the document, creating it if absent
    async fn merge(&self, path: &DocPath, fields: Map<String, Value>) -> StoreResult<()> {
        let apply = |current: Option<&Value>| -> StoreResult<Value> {
            let mut doc = current.and_then(Value::as_object).cloned().unwrap_or_default();
            for (key, value) in &fields {
                doc.insert(key.clone(), value.clone());
            }
            Ok(Value::Object(doc))
        };
        self.run_transaction(path, &apply).await.map(|_| ())
    }

    /// Merge top-level `fields` into an existing document.
    /// Fails with `NotFound` instead of creating the document.
    async fn update(&self, path: &DocPath, fields: Map<String, Value>) -> StoreResult<()> {
        let apply = |current: Option<&Value>| -> StoreResult<Value> {
            let mut doc = current
                .and_then(Value::as_object)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
            for (key, value) in &fields {
                doc.insert(key.clone(), value.clone());
            }
            Ok(Value::Object(doc))
        };
        self.run_transaction(path, &apply).await.map(|_| ())
    }

    /// Write a document only if nothing exists at `path` yet
    async fn create(&self, path: &DocPath, data: Value) -> StoreResult<()> {
        let apply = |current: Option<&Value>| -> StoreResult<Value> {
            match current {
                Some(_) => Err(StoreError::AlreadyExists(path.to_string())),
                None => Ok(data.clone()),
            }
        };
        self.run_transaction(path, &apply).await.map(|_| ())
    }

    /// Append `items` to the array at `field`, skipping any item equal by
    /// value to one already present. Creates the document and the array when
    /// absent.
    async fn array_union(&self, path: &DocPath, field: &str, items: Vec<Value>) -> StoreResult<()> {
        let apply = |current: Option<&Value>| -> StoreResult<Value> {
            let mut doc = current.and_then(Value::as_object).cloned().unwrap_or_default();
            let mut array = match doc.remove(field) {
                Some(Value::Array(existing)) => existing,
                _ => Vec::new(),
            };
            for item in &items {
                if !array.contains(item) {
                    array.push(item.clone());
                }
            }
            doc.insert(field.to_string(), Value::Array(array));
            Ok(Value::Object(doc))
        };
        self.run_transaction(path, &apply).await.map(|_| ())
    }
}
