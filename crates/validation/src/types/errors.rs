//! Error types for the validation engine.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for entry-point validation
pub type ValidationResult<T> = Result<T, Rejection>;

/// The predicate a field failed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FieldRule {
    Required,
    InvalidType,
    TooShort,
    TooLong,
    InvalidFormat,
    OutOfRange,
    InvalidChoice,
    PolicyViolation,
    UnknownField,
    Mismatch,
}

impl FieldRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldRule::Required => "required",
            FieldRule::InvalidType => "invalid_type",
            FieldRule::TooShort => "too_short",
            FieldRule::TooLong => "too_long",
            FieldRule::InvalidFormat => "invalid_format",
            FieldRule::OutOfRange => "out_of_range",
            FieldRule::InvalidChoice => "invalid_choice",
            FieldRule::PolicyViolation => "policy_violation",
            FieldRule::UnknownField => "unknown_field",
            FieldRule::Mismatch => "mismatch",
        }
    }
}

impl fmt::Display for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structural violation, keyed by field path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    /// Dotted path to the offending field, e.g. `file_attachments[1].size`
    pub field: String,
    pub rule: FieldRule,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, rule: FieldRule, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule,
            message: message.into(),
        }
    }
}

/// Structural rejection carrying every field violation that was found.
///
/// The caller can re-prompt for exactly the listed fields; nothing from the
/// rejected input is ever partially accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("{} validation failed: {} field error(s)", .entity, .errors.len())]
pub struct ValidationError {
    pub entity: String,
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(entity: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            entity: entity.into(),
            errors,
        }
    }

    /// Errors for a single field path
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors.iter().filter(move |error| error.field == field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.for_field(field).next().is_some()
    }

    /// Messages grouped by field path, in path order
    pub fn by_field(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for error in &self.errors {
            grouped
                .entry(error.field.clone())
                .or_default()
                .push(error.message.clone());
        }
        grouped
    }
}

/// HTML constructs the content scanner refuses
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HtmlPattern {
    ScriptBlock,
    Iframe,
    Object,
    Embed,
    Link,
    JavascriptScheme,
    EventHandler,
}

impl HtmlPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            HtmlPattern::ScriptBlock => "script_block",
            HtmlPattern::Iframe => "iframe",
            HtmlPattern::Object => "object",
            HtmlPattern::Embed => "embed",
            HtmlPattern::Link => "link",
            HtmlPattern::JavascriptScheme => "javascript_scheme",
            HtmlPattern::EventHandler => "event_handler",
        }
    }
}

/// Semantic or policy rule enforced after structural success
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SecurityRule {
    PasswordMismatch,
    PasswordReuse,
    IdentifierTooLong,
    WebhookUrlConflict,
    PrivateWebhookHost,
    InsecureProdWebhook,
    InsecureDevWebhook,
    DangerousHtml(HtmlPattern),
    InvalidJson,
    JsonTooDeep,
    JsonTooLarge,
    TooManyAttachments,
    AttachmentsTooLarge,
    DisallowedMimeType,
}

impl SecurityRule {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            SecurityRule::PasswordMismatch => "password_mismatch",
            SecurityRule::PasswordReuse => "password_reuse",
            SecurityRule::IdentifierTooLong => "identifier_too_long",
            SecurityRule::WebhookUrlConflict => "webhook_url_conflict",
            SecurityRule::PrivateWebhookHost => "ssrf_private_host",
            SecurityRule::InsecureProdWebhook => "insecure_prod_webhook",
            SecurityRule::InsecureDevWebhook => "insecure_dev_webhook",
            SecurityRule::DangerousHtml(pattern) => match pattern {
                HtmlPattern::ScriptBlock => "html_script_block",
                HtmlPattern::Iframe => "html_iframe",
                HtmlPattern::Object => "html_object",
                HtmlPattern::Embed => "html_embed",
                HtmlPattern::Link => "html_link",
                HtmlPattern::JavascriptScheme => "html_javascript_scheme",
                HtmlPattern::EventHandler => "html_event_handler",
            },
            SecurityRule::InvalidJson => "invalid_json",
            SecurityRule::JsonTooDeep => "json_too_deep",
            SecurityRule::JsonTooLarge => "json_too_large",
            SecurityRule::TooManyAttachments => "too_many_attachments",
            SecurityRule::AttachmentsTooLarge => "attachments_too_large",
            SecurityRule::DisallowedMimeType => "disallowed_mime_type",
        }
    }
}

impl fmt::Display for SecurityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Policy rejection: the first violated rule, never retried
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SecurityViolation {
    pub rule: SecurityRule,
    pub message: String,
}

impl SecurityViolation {
    pub fn new(rule: SecurityRule, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }
}

/// Outcome of a failed entry-point validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Security(#[from] SecurityViolation),
}

impl Rejection {
    /// Whether the caller may re-prompt the user instead of failing the request
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Rejection::Invalid(_))
    }

    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Rejection::Invalid(error) => &error.errors,
            Rejection::Security(_) => &[],
        }
    }

    pub fn security_rule(&self) -> Option<SecurityRule> {
        match self {
            Rejection::Invalid(_) => None,
            Rejection::Security(violation) => Some(violation.rule),
        }
    }
}
