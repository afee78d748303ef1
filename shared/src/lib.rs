use serde::{Deserialize, Serialize};

/// Response envelope returned by every endpoint.
///
/// Successful calls set `success: true` and carry either a `message`, a `data`
/// payload or both. Failed calls set `success: false` and carry `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Success carrying only a payload
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
        }
    }

    /// Success carrying a human readable message and a payload
    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            error: None,
        }
    }

    /// Failure carrying an error description
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            data: None,
            error: Some(error.into()),
        }
    }
}

impl ApiEnvelope<()> {
    /// Success carrying only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeCounterRequest {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    /// `Patient`, `Doctor` or any other free-text role
    pub role: String,
    pub password: String,
    /// Only meaningful for doctors: links the doctor to this patient
    #[serde(rename = "patientID", default)]
    pub patient_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigninRequest {
    pub username: String,
    pub password: String,
}

/// Client-facing view of a user record. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDto {
    pub username: String,
    pub email: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub role: String,
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsernameResponse {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MyDoctorResponse {
    #[serde(rename = "myDoctor")]
    pub my_doctor: String,
}

// ---------------------------------------------------------------------------
// Conversations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartThreadRequest {
    pub username: String,
    pub sender: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartThreadResponse {
    /// Document key of the thread, e.g. `thread3`
    pub thread_id: String,
    pub index: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddMessageRequest {
    pub username: String,
    pub index: u64,
    pub message: String,
    pub sender: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDto {
    pub message: String,
    /// `DD Month YYYY`
    pub date: String,
    /// `hh:mm AM/PM`
    pub time: String,
    pub sender: String,
}

/// First message of a thread plus the number of messages it holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummaryDto {
    pub index: u64,
    pub message: String,
    pub date: String,
    pub time: String,
    pub sender: String,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Contacts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddContactRequest {
    pub username: String,
    pub name: String,
    pub relationship: String,
    pub phone_number: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub glucose_level_alert: bool,
    #[serde(default)]
    pub medication_reminder: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactDto {
    pub id: String,
    pub name: String,
    pub relationship: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub glucose_level_alert: bool,
    pub medication_reminder: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteContactRequest {
    pub username: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteContactResponse {
    pub deleted: usize,
}

/// Identifier assigned by the store to a newly added document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: String,
}

// ---------------------------------------------------------------------------
// Emergency calls
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MakeCallRequest {
    /// Destination phone number in E.164 format
    pub to: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MakeCallResponse {
    pub call_sid: String,
}

// ---------------------------------------------------------------------------
// Health metrics
// ---------------------------------------------------------------------------

/// Optional ISO 8601 bounds applied to metric queries (both inclusive; a
/// date-only `end` covers that whole day)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricRangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddPressureRequest {
    pub username: String,
    pub systolic: f64,
    pub diastolic: f64,
    /// ISO 8601; defaults to the time of the request
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureEntryDto {
    pub id: String,
    pub systolic: f64,
    pub diastolic: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddGlucoseRequest {
    pub username: String,
    pub glucose_level: f64,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlucoseEntryDto {
    pub id: String,
    pub glucose_level: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddMealRequest {
    pub username: String,
    pub meal: String,
    #[serde(default)]
    pub carbohydrates: Option<f64>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntryDto {
    pub id: String,
    pub meal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbohydrates: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    pub timestamp: String,
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateNameRequest {
    pub username: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEmailRequest {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePhoneNumberRequest {
    pub username: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateDateOfBirthRequest {
    pub username: String,
    pub date_of_birth: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEmergencyContactRequest {
    pub username: String,
    pub emergency_contact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateWeightRequest {
    pub username: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateHeightRequest {
    pub username: String,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateBloodGlucoseLevelRequest {
    pub username: String,
    pub blood_glucose_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateInsulinDosageRequest {
    pub username: String,
    pub insulin_dosage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateAllergiesRequest {
    pub username: String,
    pub allergies: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalMetricsDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_glucose_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insulin_dosage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddPersonalMetricsRequest {
    pub username: String,
    #[serde(flatten)]
    pub metrics: PersonalMetricsDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDataDto {
    #[serde(flatten)]
    pub user: UserDto,
    #[serde(rename = "personalMetrics", default, skip_serializing_if = "Option::is_none")]
    pub personal_metrics: Option<PersonalMetricsDto>,
}
