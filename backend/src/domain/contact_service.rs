use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::account_service::require_user;
use crate::domain::error::{require, ServiceError, ServiceResult};
use crate::domain::models::{decode_document, Contact, Stored};
use crate::storage::{layout, DocumentStore, Query};

/// Emergency contacts kept under each user
#[derive(Clone)]
pub struct ContactService {
    store: Arc<dyn DocumentStore>,
}

impl ContactService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Store a contact for an existing user and return its id
    pub async fn add_contact(&self, username: &str, contact: Contact) -> ServiceResult<String> {
        let username = require("username", username)?;
        let contact = Contact {
            name: require("name", &contact.name)?.to_string(),
            relationship: require("relationship", &contact.relationship)?.to_string(),
            phone_number: require("phone_number", &contact.phone_number)?.to_string(),
            email: contact
                .email
                .map(|email| email.trim().to_string())
                .filter(|email| !email.is_empty()),
            ..contact
        };
        require_user(self.store.as_ref(), username).await?;

        let id = self
            .store
            .add(&layout::contacts(username)?, serde_json::to_value(&contact)?)
            .await?;

        info!("Added contact {} ({}) for {}", contact.name, id, username);
        Ok(id)
    }

    /// Delete every contact of `username` named exactly `name`.
    ///
    /// Returns how many were removed; removing none is `NotFound`.
    pub async fn delete_contact(&self, username: &str, name: &str) -> ServiceResult<usize> {
        let username = require("username", username)?;
        let name = require("name", name)?;
        let collection = layout::contacts(username)?;

        let matches = self
            .store
            .query(&collection, &Query::new().where_eq("name", name))
            .await?;

        let mut deleted = 0;
        for doc in matches {
            if self.store.delete(&collection.doc(&doc.id)?).await? {
                deleted += 1;
            }
        }

        if deleted == 0 {
            warn!("No contact named {} for {}", name, username);
            return Err(ServiceError::NotFound("Contact not found".into()));
        }

        info!("Deleted {} contact(s) named {} for {}", deleted, name, username);
        Ok(deleted)
    }

    /// All contacts of `username` in the order they were added
    pub async fn list_contacts(&self, username: &str) -> ServiceResult<Vec<Stored<Contact>>> {
        let username = require("username", username)?;
        let collection = layout::contacts(username)?;

        let mut contacts = Vec::new();
        for doc in self.store.list(&collection).await? {
            let value = decode_document(&format!("{collection}/{}", doc.id), doc.data)?;
            contacts.push(Stored { id: doc.id, value });
        }

        info!("Found {} contacts for {}", contacts.len(), username);
        Ok(contacts)
    }
}
