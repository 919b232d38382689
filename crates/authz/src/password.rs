//! Password hashing and verification using Argon2id

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{AuthzError, Result};

/// Hash a password into a PHC-formatted Argon2id string with a random salt.
///
/// This is CPU-bound; async callers should run it on the blocking pool.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthzError::Hash(e.to_string()))
}

/// Verify a password against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch; errors only for malformed hashes.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(password_hash).map_err(|e| AuthzError::Hash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthzError::Hash(e.to_string())),
    }
}
