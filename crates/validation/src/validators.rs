//! Entry-point validation functions.
//!
//! Each entry point runs the structural schema first and, only when that
//! succeeds, the security rules that apply to the entity in their fixed
//! order. The result is either the validated entity or a [`Rejection`].

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::entities::{
    Credential, EnvironmentConfig, Login, Message, MfaSetup, MfaVerification, NewMessage, NewProfile,
    PasswordChange, PasswordReset, PasswordResetRequest, ProfileUpdate, UserProfileUpdate, WebhookPayload,
};
use crate::schema;
use crate::security;
use crate::types::{PaginationRequest, Rejection, SecurityViolation, ValidationError, ValidationResult};

fn structural<T>(entity: &'static str, result: Result<T, ValidationError>) -> ValidationResult<T> {
    result.map_err(|error| {
        debug!(entity, errors = error.errors.len(), "rejected: invalid input");
        Rejection::Invalid(error)
    })
}

fn enforce(entity: &'static str, result: Result<(), SecurityViolation>) -> ValidationResult<()> {
    result.map_err(|violation| {
        warn!(entity, rule = %violation.rule, "rejected: security violation");
        Rejection::Security(violation)
    })
}

fn accepted<T>(entity: &'static str, value: T) -> ValidationResult<T> {
    debug!(entity, "accepted");
    Ok(value)
}

/// Validate a registration form.
///
/// Returns the credential with a lowercase email. The password stays in its
/// redacting wrapper until the caller hashes it.
pub fn validate_registration(input: &Value) -> ValidationResult<Credential> {
    let draft = structural("registration", schema::parse_registration(input))?;
    enforce(
        "registration",
        security::check_password_confirmation(&draft.credential.password, &draft.confirm_password),
    )?;
    accepted("registration", draft.credential)
}

pub fn validate_login(input: &Value) -> ValidationResult<Login> {
    let login = structural("login", schema::parse_login(input))?;
    enforce("login", security::check_identifier_length(&login.identifier))?;
    accepted("login", login)
}

pub fn validate_password_reset_request(input: &Value) -> ValidationResult<PasswordResetRequest> {
    let request = structural("password_reset_request", schema::parse_password_reset_request(input))?;
    accepted("password_reset_request", request)
}

pub fn validate_password_reset(input: &Value) -> ValidationResult<PasswordReset> {
    let draft = structural("password_reset", schema::parse_password_reset(input))?;
    enforce(
        "password_reset",
        security::check_password_confirmation(&draft.reset.password, &draft.confirm_password),
    )?;
    accepted("password_reset", draft.reset)
}

pub fn validate_password_change(input: &Value) -> ValidationResult<PasswordChange> {
    let draft = structural("password_change", schema::parse_password_change(input))?;
    enforce(
        "password_change",
        security::check_password_confirmation(&draft.change.new_password, &draft.confirm_password),
    )?;
    enforce(
        "password_change",
        security::check_password_reuse(&draft.change.current_password, &draft.change.new_password),
    )?;
    accepted("password_change", draft.change)
}

pub fn validate_mfa_setup(input: &Value) -> ValidationResult<MfaSetup> {
    let setup = structural("mfa_setup", schema::parse_mfa_setup(input))?;
    accepted("mfa_setup", setup)
}

pub fn validate_mfa_verification(input: &Value) -> ValidationResult<MfaVerification> {
    let verification = structural("mfa_verification", schema::parse_mfa_verification(input))?;
    accepted("mfa_verification", verification)
}

pub fn validate_user_profile_update(input: &Value) -> ValidationResult<UserProfileUpdate> {
    let update = structural("user_profile_update", schema::parse_user_profile_update(input))?;
    accepted("user_profile_update", update)
}

/// Validate a user-submitted message: content scan, then attachment policy
pub fn validate_message_creation(input: &Value) -> ValidationResult<NewMessage> {
    let message = structural("message", schema::parse_new_message(input))?;
    enforce("message", security::check_content(message.content_format, &message.content))?;
    enforce("message", security::check_attachments(&message.file_attachments))?;
    accepted("message", message)
}

/// Validate a complete message record, e.g. an agent reply before storage
pub fn validate_message(input: &Value) -> ValidationResult<Message> {
    let message = structural("message", schema::parse_message(input))?;
    enforce("message", security::check_content(message.content_format, &message.content))?;
    enforce("message", security::check_attachments(&message.file_attachments))?;
    accepted("message", message)
}

pub fn validate_profile_creation(input: &Value) -> ValidationResult<NewProfile> {
    let profile = structural("profile", schema::parse_new_profile(input))?;
    enforce(
        "profile",
        security::check_webhook_urls(Some(&profile.dev_webhook_url), Some(&profile.prod_webhook_url)),
    )?;
    accepted("profile", profile)
}

/// Only the URLs present in the update are checked; divergence needs both.
pub fn validate_profile_update(input: &Value) -> ValidationResult<ProfileUpdate> {
    let update = structural("profile_update", schema::parse_profile_update(input))?;
    enforce(
        "profile_update",
        security::check_webhook_urls(update.dev_webhook_url.as_ref(), update.prod_webhook_url.as_ref()),
    )?;
    accepted("profile_update", update)
}

pub fn validate_webhook_payload(input: &Value) -> ValidationResult<WebhookPayload> {
    let payload = structural("webhook_payload", schema::parse_webhook_payload(input))?;
    enforce("webhook_payload", security::check_content(payload.format, &payload.content))?;
    accepted("webhook_payload", payload)
}

/// Validate the boot-time environment; unset or blank keys take their defaults
pub fn validate_environment_variables(vars: &HashMap<String, String>) -> ValidationResult<EnvironmentConfig> {
    let config = structural("environment", schema::parse_environment(vars))?;
    accepted("environment", config)
}

pub fn validate_pagination(input: &Value) -> ValidationResult<PaginationRequest> {
    let request = structural("pagination", schema::parse_pagination(input))?;
    accepted("pagination", request)
}
