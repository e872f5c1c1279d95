use serde::Serialize;

use crate::types::Secret;
use crate::utils::{hash_password, PasswordHashError};

/// Validated registration.
///
/// The plaintext password only survives until the caller hashes it with
/// [`Credential::password_hash`] and drops the value.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub username: String,
    /// Lowercase-normalized address
    pub email: String,
    pub password: Secret,
}

impl Credential {
    pub fn password_hash(&self) -> Result<String, PasswordHashError> {
        hash_password(&self.password)
    }
}

/// Validated login attempt
#[derive(Debug, Clone, PartialEq)]
pub struct Login {
    /// Email or username, as typed
    pub identifier: String,
    pub password: Secret,
    pub remember_me: bool,
}

/// Request for a password reset mail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Completion of a password reset
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordReset {
    pub token: String,
    pub password: Secret,
}

/// Authenticated password change
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordChange {
    pub current_password: Secret,
    pub new_password: Secret,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MfaSetup {
    pub secret: Secret,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MfaVerification {
    pub code: String,
}

/// Partial update of the account holder's own profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl UserProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.first_name.is_none() && self.last_name.is_none()
    }
}
