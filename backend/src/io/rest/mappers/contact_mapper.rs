use shared::{AddContactRequest, ContactDto};

use crate::domain::models::{Contact, Stored};

pub struct ContactMapper;

impl ContactMapper {
    /// Split an add request into the owning username and the contact
    pub fn to_domain(request: AddContactRequest) -> (String, Contact) {
        (
            request.username,
            Contact {
                name: request.name,
                relationship: request.relationship,
                phone_number: request.phone_number,
                email: request.email,
                glucose_level_alert: request.glucose_level_alert,
                medication_reminder: request.medication_reminder,
            },
        )
    }

    pub fn to_dto(stored: Stored<Contact>) -> ContactDto {
        let contact = stored.value;
        ContactDto {
            id: stored.id,
            name: contact.name,
            relationship: contact.relationship,
            phone_number: contact.phone_number,
            email: contact.email,
            glucose_level_alert: contact.glucose_level_alert,
            medication_reminder: contact.medication_reminder,
        }
    }
}
