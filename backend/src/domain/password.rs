//! Password hashing for stored user records.
//!
//! Hashing and verification each take tens of milliseconds of CPU, so both
//! run on tokio's blocking pool.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tokio::task;

use crate::domain::error::{ServiceError, ServiceResult};

/// Hash `password` with Argon2id and a fresh random salt, returning the PHC string
pub async fn hash_password(password: &str) -> ServiceResult<String> {
    let password = password.to_owned();
    task::spawn_blocking(move || argon2_hash(&password))
        .await
        .map_err(|e| ServiceError::Internal(format!("password hashing task failed: {e}")))?
}

/// Check `password` against a stored PHC string.
///
/// A stored value that is not a valid PHC string never matches.
pub async fn verify_password(password: &str, stored: &str) -> ServiceResult<bool> {
    let (password, stored) = (password.to_owned(), stored.to_owned());
    task::spawn_blocking(move || argon2_matches(&password, &stored))
        .await
        .map_err(|e| ServiceError::Internal(format!("password check task failed: {e}")))
}

fn argon2_hash(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Internal(format!("password hashing failed: {e}")))
}

fn argon2_matches(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_then_verify() {
        let hash = hash_password("correct horse").await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).await.unwrap());
        assert!(!verify_password("battery staple", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_salts_differ() {
        assert_ne!(
            hash_password("pw").await.unwrap(),
            hash_password("pw").await.unwrap()
        );
    }

    #[test]
    fn test_garbage_hash_never_matches() {
        assert!(!argon2_matches("pw", "pw"));
        assert!(!argon2_matches("", ""));
    }
}
