use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Patient,
    Doctor,
    Other(String),
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Patient" => Role::Patient,
            "Doctor" => Role::Doctor,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Patient => "Patient".to_string(),
            Role::Doctor => "Doctor".to_string(),
            Role::Other(other) => other,
        }
    }
}

/// A user document as persisted at `users/{username}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub role: Role,
    /// Argon2 PHC string
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(rename = "patientID", default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(rename = "myDoctor", default, skip_serializing_if = "Option::is_none")]
    pub my_doctor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
}

/// `users/{username}/personal-metrics/personal-info`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalMetrics {
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub blood_glucose_level: Option<f64>,
    #[serde(default)]
    pub insulin_dosage: Option<f64>,
    #[serde(default)]
    pub allergies: Option<String>,
}
