//! Password hashing for validated credentials.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

use crate::types::Secret;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordHashError {
    #[error("Password hashing failed")]
    HashingFailed,

    #[error("Invalid password hash")]
    InvalidHash,
}

/// Hash a password using Argon2
pub fn hash_password(password: &Secret) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.expose().as_bytes(), &salt)
        .map_err(|_| PasswordHashError::HashingFailed)?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against its hash
pub fn verify_password(password: &Secret, hash: &str) -> Result<bool, PasswordHashError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordHashError::InvalidHash)?;

    Ok(Argon2::default()
        .verify_password(password.expose().as_bytes(), &parsed_hash)
        .is_ok())
}
