//! Argon2 hashing for stored secrets (passwords and OTP codes).
//!
//! Plaintext codes and passwords never touch the database; only the
//! argon2 hash is stored.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use thiserror::Error;

/// Hashing errors.
#[derive(Debug, Error)]
pub enum HashingError {
    #[error("hashing failed: {0}")]
    Hash(String),
}

/// Hash a secret with argon2 and a fresh random salt.
///
/// # Errors
///
/// Returns `HashingError` if hashing fails.
pub fn hash(secret: &str) -> Result<String, HashingError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| HashingError::Hash(e.to_string()))
}

/// Verify a secret against a stored argon2 hash.
///
/// An unparseable stored hash verifies as `false` rather than erroring;
/// the caller treats it the same as a wrong secret.
#[must_use]
pub fn verify(secret: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hashed = hash("482913").expect("hash");
        assert!(verify("482913", &hashed));
        assert!(!verify("482914", &hashed));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify("482913", "not-a-phc-string"));
    }
}
