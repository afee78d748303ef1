use crate::storage::StoreError;

/// Failure kinds surfaced by domain services.
///
/// The REST layer maps each kind to one HTTP status; only `Validation`,
/// `NotFound`, `Unauthorized` and `Conflict` messages are shown to clients.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Conflict(String),
    #[error("call provider error: {0}")]
    Upstream(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("storage error: {0}")]
    Storage(#[source] StoreError),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

impl From<StoreError> for ServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(_) => ServiceError::NotFound("Document not found".into()),
            StoreError::AlreadyExists(_) => {
                ServiceError::Conflict("Document already exists".into())
            }
            StoreError::InvalidPath(reason) => ServiceError::Validation(reason),
            other => ServiceError::Storage(other),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(error: serde_json::Error) -> Self {
        ServiceError::Storage(StoreError::Serialization(error))
    }
}

/// Report a missing document as `NotFound(message)` rather than the generic text
pub fn not_found_as(message: &'static str) -> impl Fn(StoreError) -> ServiceError {
    move |error| match error {
        StoreError::NotFound(_) => ServiceError::NotFound(message.to_string()),
        other => other.into(),
    }
}

/// Trim `value` and reject it when blank
pub fn require<'a>(field: &str, value: &'a str) -> ServiceResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!("{field} is required")));
    }
    Ok(trimmed)
}

/// Reject a blank `value` but hand it back untouched.
///
/// For free text such as message bodies, where surrounding whitespace is part
/// of what the user sent.
pub fn require_present<'a>(field: &str, value: &'a str) -> ServiceResult<&'a str> {
    require(field, value)?;
    Ok(value)
}

/// Reject NaN, infinities and non-positive measurements
pub fn require_positive(field: &str, value: f64) -> ServiceResult<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ServiceError::Validation(format!(
            "{field} must be a positive number"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_trims_and_rejects_blank() {
        assert_eq!(require("username", "  alice ").unwrap(), "alice");
        match require("username", "   ") {
            Err(ServiceError::Validation(msg)) => assert_eq!(msg, "username is required"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_require_present_keeps_whitespace() {
        assert_eq!(require_present("message", "  Hello\n").unwrap(), "  Hello\n");
        assert!(matches!(
            require_present("message", " \n\t"),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn test_require_positive() {
        assert_eq!(require_positive("weight", 70.2).unwrap(), 70.2);
        assert!(require_positive("weight", 0.0).is_err());
        assert!(require_positive("weight", -1.0).is_err());
        assert!(require_positive("weight", f64::NAN).is_err());
    }

    #[test]
    fn test_store_errors_map_to_service_kinds() {
        assert!(matches!(
            ServiceError::from(StoreError::NotFound("users/x".into())),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            ServiceError::from(StoreError::InvalidPath("bad".into())),
            ServiceError::Validation(_)
        ));
        assert!(matches!(
            ServiceError::from(StoreError::AlreadyExists("users/x".into())),
            ServiceError::Conflict(_)
        ));
        assert!(matches!(
            ServiceError::from(StoreError::UnsupportedFilter("f".into())),
            ServiceError::Storage(_)
        ));
    }

    #[test]
    fn test_not_found_as_rewrites_only_missing_documents() {
        let map = not_found_as("User not found");
        match map(StoreError::NotFound("users/bob".into())) {
            ServiceError::NotFound(msg) => assert_eq!(msg, "User not found"),
            other => panic!("expected not found, got {other:?}"),
        }
        assert!(matches!(
            map(StoreError::AlreadyExists("users/bob".into())),
            ServiceError::Conflict(_)
        ));
    }
}
