//! # Storage Module
//!
//! Handles all data persistence for the backend.
//!
//! The domain layer only sees the [`DocumentStore`] trait: documents are JSON
//! objects addressed by hierarchical paths, grouped into collections and
//! sub-collections. [`DbConnection`] implements the trait on SQLite.
//!
//! ## Guarantees
//!
//! - Single-document reads are strongly consistent
//! - [`DocumentStore::run_transaction`] is an atomic read-compute-write on one
//!   document; concurrent writers are serialized
//! - No cross-document transactions

pub mod layout;
pub mod paths;
pub mod sqlite;
pub mod traits;

pub use paths::{CollectionPath, DocPath};
pub use sqlite::DbConnection;
pub use traits::{Direction, Document, DocumentStore, Query, StoreError, StoreResult};
