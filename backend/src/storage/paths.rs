//! Hierarchical document addressing.
//!
//! A collection path alternates collection names and document ids
//! (`users/alice/feedback`); a document path is a collection path plus one id
//! (`users/alice/feedback/thread1`).

use std::fmt;

use super::traits::{StoreError, StoreResult};

/// Address of a collection or sub-collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

/// Address of a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
    collection: CollectionPath,
    id: String,
}

impl CollectionPath {
    /// Top-level collection. Names are compile-time constants, never user input.
    pub fn root(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Address a document inside this collection.
    ///
    /// Fails with `InvalidPath` when `id` is blank or contains a separator,
    /// since ids frequently come straight from request bodies.
    pub fn doc(&self, id: &str) -> StoreResult<DocPath> {
        validate_segment(id)?;
        Ok(DocPath {
            collection: self.clone(),
            id: id.to_string(),
        })
    }

    /// Address a document whose id is a compile-time constant
    pub fn fixed(&self, id: &'static str) -> DocPath {
        DocPath {
            collection: self.clone(),
            id: id.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl DocPath {
    /// Sub-collection nested under this document.
    pub fn collection(&self, name: &str) -> CollectionPath {
        CollectionPath(format!("{}/{}/{}", self.collection.0, self.id, name))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent(&self) -> &CollectionPath {
        &self.collection
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection.0, self.id)
    }
}

fn validate_segment(id: &str) -> StoreResult<()> {
    if id.trim().is_empty() {
        return Err(StoreError::InvalidPath("document id cannot be empty".into()));
    }
    if id.contains('/') {
        return Err(StoreError::InvalidPath(format!(
            "document id cannot contain '/': {id}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_paths_render_with_separators() {
        let user = CollectionPath::root("users").doc("alice").unwrap();
        let thread = user.collection("feedback").doc("thread1").unwrap();

        assert_eq!(user.to_string(), "users/alice");
        assert_eq!(thread.to_string(), "users/alice/feedback/thread1");
        assert_eq!(thread.parent().as_str(), "users/alice/feedback");
        assert_eq!(thread.id(), "thread1");
    }

    #[test]
    fn test_rejects_ids_that_would_escape_the_collection() {
        let users = CollectionPath::root("users");

        assert!(matches!(users.doc(""), Err(StoreError::InvalidPath(_))));
        assert!(matches!(users.doc("   "), Err(StoreError::InvalidPath(_))));
        assert!(matches!(
            users.doc("alice/feedback"),
            Err(StoreError::InvalidPath(_))
        ));
    }
}
