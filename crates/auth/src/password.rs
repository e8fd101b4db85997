//! Password hashing seam.
//!
//! The concrete algorithm is a pluggable detail behind the trait; the rest
//! of the system only needs one-way `hash` + `verify(plain, hash)`.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher as _, PasswordVerifier as _};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password")]
    Hash,
}

/// One-way password hash with verify semantics.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, PasswordError>;

    /// Constant-result verification: any malformed stored hash verifies
    /// as false rather than erroring.
    fn verify(&self, plain: &str, hash: &str) -> bool;
}

/// Argon2id implementation (PHC string format).
#[derive(Debug, Default)]
pub struct Argon2PasswordHasher;

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|_| PasswordError::Hash)?;
        Ok(hash.to_string())
    }

    fn verify(&self, plain: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let hasher = Argon2PasswordHasher;
        let hash = hasher.hash("Pw12345!").unwrap();

        assert!(hasher.verify("Pw12345!", &hash));
        assert!(!hasher.verify("wrong", &hash));
    }

    #[test]
    fn malformed_stored_hash_verifies_false() {
        let hasher = Argon2PasswordHasher;
        assert!(!hasher.verify("anything", "not-a-phc-string"));
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = Argon2PasswordHasher;
        let a = hasher.hash("Pw12345!").unwrap();
        let b = hasher.hash("Pw12345!").unwrap();
        assert_ne!(a, b);
    }
}
