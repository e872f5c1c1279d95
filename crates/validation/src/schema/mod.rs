//! Structural schema layer.
//!
//! Each parser reads an untrusted [`serde_json::Value`] into a typed draft and
//! reports every field violation in one [`ValidationError`]. Cross-field and
//! content rules are left to [`crate::security`].
//!
//! [`ValidationError`]: crate::types::ValidationError

pub mod auth;
pub mod environment;
pub mod message;
pub mod pagination;
pub mod profile;

pub use auth::*;
pub use environment::*;
pub use message::*;
pub use pagination::*;
pub use profile::*;

use crate::types::FieldError;
use crate::utils::fields::{FieldErrors, Record};

/// Required string run through a primitive validator
pub(crate) fn required<T>(
    record: &Record<'_>,
    key: &str,
    label: &str,
    errors: &mut FieldErrors,
    validate: impl FnOnce(&str, &str) -> Result<T, FieldError>,
) -> Option<T> {
    let value = record.required_str(key, label, errors)?;
    errors.check(validate(value, &record.path(key)))
}

/// Optional string run through a primitive validator.
///
/// `Ok(None)` when absent, `Err(())` when present but invalid.
pub(crate) fn optional<T>(
    record: &Record<'_>,
    key: &str,
    errors: &mut FieldErrors,
    validate: impl FnOnce(&str, &str) -> Result<T, FieldError>,
) -> Result<Option<T>, ()> {
    match record.optional_str(key, errors)? {
        None => Ok(None),
        Some(value) => errors.check(validate(value, &record.path(key))).map(Some).ok_or(()),
    }
}

/// Non-empty required string
pub(crate) fn non_empty(value: &str, field: &str, message: &str) -> Result<String, FieldError> {
    if value.is_empty() {
        return Err(FieldError::new(field, crate::types::FieldRule::TooShort, message));
    }
    Ok(value.to_string())
}
