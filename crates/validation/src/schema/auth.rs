//! Account and authentication schemas.

use serde_json::Value;

use super::{non_empty, optional, required};
use crate::entities::{
    Credential, Login, MfaSetup, MfaVerification, PasswordChange, PasswordReset, PasswordResetRequest,
    UserProfileUpdate,
};
use crate::types::{Secret, ValidationError};
use crate::utils::fields::{FieldErrors, Record};
use crate::utils::{
    validate_email, validate_mfa_code, validate_password, validate_person_name, validate_username,
};

/// Registration draft; the confirmation is only kept for the equality check
#[derive(Debug)]
pub struct RegistrationDraft {
    pub credential: Credential,
    pub confirm_password: Secret,
}

#[derive(Debug)]
pub struct PasswordResetDraft {
    pub reset: PasswordReset,
    pub confirm_password: Secret,
}

#[derive(Debug)]
pub struct PasswordChangeDraft {
    pub change: PasswordChange,
    pub confirm_password: Secret,
}

fn confirmation(record: &Record<'_>, errors: &mut FieldErrors) -> Option<Secret> {
    record
        .required_str("confirm_password", "Password confirmation", errors)
        .map(Secret::new)
}

pub fn parse_registration(input: &Value) -> Result<RegistrationDraft, ValidationError> {
    let mut errors = FieldErrors::new();
    let Some(record) = Record::root(input, &mut errors) else {
        return errors.finish("registration", None);
    };

    let username = required(&record, "username", "Username", &mut errors, validate_username);
    let email = required(&record, "email", "Email", &mut errors, validate_email);
    let password = required(&record, "password", "Password", &mut errors, validate_password);
    let confirm_password = confirmation(&record, &mut errors);

    let draft = match (username, email, password, confirm_password) {
        (Some(username), Some(email), Some(password), Some(confirm_password)) => Some(RegistrationDraft {
            credential: Credential {
                username,
                email,
                password,
            },
            confirm_password,
        }),
        _ => None,
    };
    errors.finish("registration", draft)
}

pub fn parse_login(input: &Value) -> Result<Login, ValidationError> {
    let mut errors = FieldErrors::new();
    let Some(record) = Record::root(input, &mut errors) else {
        return errors.finish("login", None);
    };

    let identifier = required(&record, "identifier", "Email or username", &mut errors, |value, field| {
        non_empty(value, field, "Email or username is required")
    });
    let password = required(&record, "password", "Password", &mut errors, |value, field| {
        non_empty(value, field, "Password is required").map(Secret::new)
    });
    let remember_me = record.optional_bool("remember_me", &mut errors);

    let login = match (identifier, password, remember_me) {
        (Some(identifier), Some(password), Ok(remember_me)) => Some(Login {
            identifier,
            password,
            remember_me: remember_me.unwrap_or(false),
        }),
        _ => None,
    };
    errors.finish("login", login)
}

pub fn parse_password_reset_request(input: &Value) -> Result<PasswordResetRequest, ValidationError> {
    let mut errors = FieldErrors::new();
    let Some(record) = Record::root(input, &mut errors) else {
        return errors.finish("password_reset_request", None);
    };

    let email = required(&record, "email", "Email", &mut errors, validate_email);
    errors.finish("password_reset_request", email.map(|email| PasswordResetRequest { email }))
}

pub fn parse_password_reset(input: &Value) -> Result<PasswordResetDraft, ValidationError> {
    let mut errors = FieldErrors::new();
    let Some(record) = Record::root(input, &mut errors) else {
        return errors.finish("password_reset", None);
    };

    let token = required(&record, "token", "Reset token", &mut errors, |value, field| {
        non_empty(value, field, "Reset token is required")
    });
    let password = required(&record, "password", "Password", &mut errors, validate_password);
    let confirm_password = confirmation(&record, &mut errors);

    let draft = match (token, password, confirm_password) {
        (Some(token), Some(password), Some(confirm_password)) => Some(PasswordResetDraft {
            reset: PasswordReset { token, password },
            confirm_password,
        }),
        _ => None,
    };
    errors.finish("password_reset", draft)
}

pub fn parse_password_change(input: &Value) -> Result<PasswordChangeDraft, ValidationError> {
    let mut errors = FieldErrors::new();
    let Some(record) = Record::root(input, &mut errors) else {
        return errors.finish("password_change", None);
    };

    let current_password = required(&record, "current_password", "Current password", &mut errors, |value, field| {
        non_empty(value, field, "Current password is required").map(Secret::new)
    });
    let new_password = required(&record, "new_password", "New password", &mut errors, validate_password);
    let confirm_password = confirmation(&record, &mut errors);

    let draft = match (current_password, new_password, confirm_password) {
        (Some(current_password), Some(new_password), Some(confirm_password)) => Some(PasswordChangeDraft {
            change: PasswordChange {
                current_password,
                new_password,
            },
            confirm_password,
        }),
        _ => None,
    };
    errors.finish("password_change", draft)
}

pub fn parse_mfa_setup(input: &Value) -> Result<MfaSetup, ValidationError> {
    let mut errors = FieldErrors::new();
    let Some(record) = Record::root(input, &mut errors) else {
        return errors.finish("mfa_setup", None);
    };

    let secret = required(&record, "secret", "MFA secret", &mut errors, |value, field| {
        non_empty(value, field, "MFA secret is required").map(Secret::new)
    });
    let code = required(&record, "code", "MFA code", &mut errors, validate_mfa_code);

    let setup = match (secret, code) {
        (Some(secret), Some(code)) => Some(MfaSetup { secret, code }),
        _ => None,
    };
    errors.finish("mfa_setup", setup)
}

pub fn parse_mfa_verification(input: &Value) -> Result<MfaVerification, ValidationError> {
    let mut errors = FieldErrors::new();
    let Some(record) = Record::root(input, &mut errors) else {
        return errors.finish("mfa_verification", None);
    };

    let code = required(&record, "code", "MFA code", &mut errors, validate_mfa_code);
    errors.finish("mfa_verification", code.map(|code| MfaVerification { code }))
}

pub fn parse_user_profile_update(input: &Value) -> Result<UserProfileUpdate, ValidationError> {
    let mut errors = FieldErrors::new();
    let Some(record) = Record::root(input, &mut errors) else {
        return errors.finish("user_profile_update", None);
    };

    let username = optional(&record, "username", &mut errors, validate_username);
    let email = optional(&record, "email", &mut errors, validate_email);
    let first_name = optional(&record, "first_name", &mut errors, |value, field| {
        validate_person_name(value, field, "First name")
    });
    let last_name = optional(&record, "last_name", &mut errors, |value, field| {
        validate_person_name(value, field, "Last name")
    });

    let update = match (username, email, first_name, last_name) {
        (Ok(username), Ok(email), Ok(first_name), Ok(last_name)) => Some(UserProfileUpdate {
            username,
            email,
            first_name,
            last_name,
        }),
        _ => None,
    };
    errors.finish("user_profile_update", update)
}
