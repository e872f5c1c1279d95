//! Primitive field validators.
//!
//! Each validator takes the field path it is checking so the error can be
//! reported against the right form field. Invalid input is a normal return
//! value, never a panic.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;
use uuid::Uuid;

use super::blocklist::{is_common_password, is_disposable_domain, is_reserved_username};
use crate::types::{FieldError, FieldRule, Secret};

pub const PASSWORD_MIN_LENGTH: usize = 12;
pub const PASSWORD_MAX_LENGTH: usize = 128;
pub const EMAIL_MAX_LENGTH: usize = 320;
pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 30;
pub const MFA_CODE_LENGTH: usize = 6;

// Patterns are static; a failed compile leaves `None` and the field fails closed.
static EMAIL_REGEX: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_%+'-]+(\.[a-zA-Z0-9_%+'-]+)*@([a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}$").ok()
});

static USERNAME_REGEX: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").ok());

static JWT_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]*$").ok());

static PERSON_NAME_REGEX: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[a-zA-Z\s'-]+$").ok());

pub(crate) fn is_match(pattern: &Lazy<Option<Regex>>, value: &str) -> bool {
    pattern.as_ref().is_some_and(|regex| regex.is_match(value))
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Validate password length, composition and blocklist membership
pub fn validate_password(password: &str, field: &str) -> Result<Secret, FieldError> {
    let length = char_len(password);
    if length < PASSWORD_MIN_LENGTH {
        return Err(FieldError::new(
            field,
            FieldRule::TooShort,
            format!("Password must be at least {PASSWORD_MIN_LENGTH} characters long"),
        ));
    }

    if length > PASSWORD_MAX_LENGTH {
        return Err(FieldError::new(
            field,
            FieldRule::TooLong,
            format!("Password must be less than {PASSWORD_MAX_LENGTH} characters"),
        ));
    }

    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_ascii_alphanumeric());

    if !has_lowercase {
        return Err(FieldError::new(
            field,
            FieldRule::InvalidFormat,
            "Password must contain at least one lowercase letter",
        ));
    }

    if !has_uppercase {
        return Err(FieldError::new(
            field,
            FieldRule::InvalidFormat,
            "Password must contain at least one uppercase letter",
        ));
    }

    if !has_digit {
        return Err(FieldError::new(
            field,
            FieldRule::InvalidFormat,
            "Password must contain at least one number",
        ));
    }

    if !has_symbol {
        return Err(FieldError::new(
            field,
            FieldRule::InvalidFormat,
            "Password must contain at least one special character",
        ));
    }

    if is_common_password(password) {
        return Err(FieldError::new(
            field,
            FieldRule::PolicyViolation,
            "Password is too common, please choose a stronger password",
        ));
    }

    Ok(Secret::new(password))
}

/// Validate an email address and return it lowercased
pub fn validate_email(email: &str, field: &str) -> Result<String, FieldError> {
    if !is_match(&EMAIL_REGEX, email) {
        return Err(FieldError::new(field, FieldRule::InvalidFormat, "Invalid email address"));
    }

    if char_len(email) > EMAIL_MAX_LENGTH {
        return Err(FieldError::new(field, FieldRule::TooLong, "Email address too long"));
    }

    let normalized = email.to_lowercase();
    let domain = normalized.rsplit_once('@').map(|(_, domain)| domain).unwrap_or_default();
    if is_disposable_domain(domain) {
        return Err(FieldError::new(
            field,
            FieldRule::PolicyViolation,
            "Disposable email addresses are not allowed",
        ));
    }

    Ok(normalized)
}

/// Validate a username
pub fn validate_username(username: &str, field: &str) -> Result<String, FieldError> {
    let length = char_len(username);
    if length < USERNAME_MIN_LENGTH {
        return Err(FieldError::new(
            field,
            FieldRule::TooShort,
            format!("Username must be at least {USERNAME_MIN_LENGTH} characters long"),
        ));
    }

    if length > USERNAME_MAX_LENGTH {
        return Err(FieldError::new(
            field,
            FieldRule::TooLong,
            format!("Username must be less than {USERNAME_MAX_LENGTH} characters"),
        ));
    }

    if !is_match(&USERNAME_REGEX, username) {
        return Err(FieldError::new(
            field,
            FieldRule::InvalidFormat,
            "Username can only contain letters, numbers, underscores, and hyphens",
        ));
    }

    if is_reserved_username(username) {
        return Err(FieldError::new(field, FieldRule::PolicyViolation, "This username is reserved"));
    }

    Ok(username.to_string())
}

/// Validate the three-segment shape of a JWT without decoding it
pub fn validate_jwt(token: &str, field: &str) -> Result<String, FieldError> {
    if !is_match(&JWT_REGEX, token) {
        return Err(FieldError::new(field, FieldRule::InvalidFormat, "Invalid JWT token format"));
    }
    Ok(token.to_string())
}

/// Validate a six-digit MFA code
pub fn validate_mfa_code(code: &str, field: &str) -> Result<String, FieldError> {
    if code.chars().count() != MFA_CODE_LENGTH {
        return Err(FieldError::new(
            field,
            FieldRule::InvalidFormat,
            "MFA code must be exactly 6 digits",
        ));
    }

    if !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError::new(
            field,
            FieldRule::InvalidFormat,
            "MFA code must contain only numbers",
        ));
    }

    Ok(code.to_string())
}

/// Validate a hyphenated UUID
pub fn validate_uuid(value: &str, field: &str, label: &str) -> Result<Uuid, FieldError> {
    // Hyphenated form only; `Uuid::parse_str` would also take simple and urn forms.
    if value.len() != 36 {
        return Err(FieldError::new(field, FieldRule::InvalidFormat, format!("Invalid {label}")));
    }
    Uuid::parse_str(value)
        .map_err(|_| FieldError::new(field, FieldRule::InvalidFormat, format!("Invalid {label}")))
}

/// Validate an absolute URL
pub fn validate_url(value: &str, field: &str, label: &str) -> Result<Url, FieldError> {
    Url::parse(value).map_err(|_| FieldError::new(field, FieldRule::InvalidFormat, format!("Invalid {label}")))
}

/// Validate an RFC 3339 timestamp and normalise it to UTC
pub fn validate_timestamp(value: &str, field: &str) -> Result<DateTime<Utc>, FieldError> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| FieldError::new(field, FieldRule::InvalidFormat, "Invalid ISO-8601 datetime"))
}

/// Validate a first or last name
pub fn validate_person_name(value: &str, field: &str, label: &str) -> Result<String, FieldError> {
    if char_len(value) > 50 {
        return Err(FieldError::new(field, FieldRule::TooLong, format!("{label} too long")));
    }
    if !is_match(&PERSON_NAME_REGEX, value) {
        return Err(FieldError::new(
            field,
            FieldRule::InvalidFormat,
            format!("Invalid characters in {}", label.to_lowercase()),
        ));
    }
    Ok(value.to_string())
}

/// Length bounds in characters; `min` of 1 doubles as "required"
pub fn validate_length(
    value: &str,
    field: &str,
    min: usize,
    max: usize,
    min_message: &str,
    max_message: &str,
) -> Result<String, FieldError> {
    let length = char_len(value);
    if length < min {
        return Err(FieldError::new(field, FieldRule::TooShort, min_message));
    }
    if length > max {
        return Err(FieldError::new(field, FieldRule::TooLong, max_message));
    }
    Ok(value.to_string())
}

/// Strip NUL and control characters, trim, and bound the length
pub fn sanitize_string(input: &str, max_length: usize) -> Result<String, FieldError> {
    let sanitized: String = input
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();
    let sanitized = sanitized.trim();

    if char_len(sanitized) > max_length {
        return Err(FieldError::new(
            "input",
            FieldRule::TooLong,
            format!("Input too long (max {max_length} characters)"),
        ));
    }

    Ok(sanitized.to_string())
}
