use serde::{Deserialize, Serialize};

/// Emergency contact stored under `users/{username}/contacts/{autoId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub relationship: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub glucose_level_alert: bool,
    #[serde(default)]
    pub medication_reminder: bool,
}
