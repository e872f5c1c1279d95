//! Message, attachment and webhook callback schemas.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{optional, required};
use crate::entities::{
    ContentFormat, Environment, FileAttachment, Message, MessageMetadata, MessageType, NewMessage,
    WebhookMetadata, WebhookPayload, MAX_ATTACHMENT_BYTES, MAX_CONTENT_LENGTH,
};
use crate::entities::attachment::MAX_FILENAME_LENGTH;
use crate::types::{FieldError, FieldRule, ValidationError};
use crate::utils::fields::{FieldErrors, Record};
use crate::utils::validation::is_match;
use crate::utils::{validate_length, validate_timestamp, validate_url, validate_uuid};

static FILENAME_REGEX: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._-]+$").ok());

// RFC 6838 type/subtype tokens
static MIME_TYPE_REGEX: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9!#$&^_.+-]{0,126}/[a-zA-Z0-9][a-zA-Z0-9!#$&^_.+-]{0,126}$").ok()
});

const METADATA_KEYS: &[&str] = &[
    "response_time_ms",
    "token_count",
    "cost_estimate",
    "langsmith_trace_id",
    "webhook_attempts",
    "error_details",
];

fn content(value: &str, field: &str) -> Result<String, FieldError> {
    validate_length(
        value,
        field,
        1,
        MAX_CONTENT_LENGTH,
        "Message content is required",
        "Message content too long",
    )
}

fn content_format(record: &Record<'_>, key: &str, errors: &mut FieldErrors) -> Option<ContentFormat> {
    match record.optional_str(key, errors) {
        Err(()) => None,
        Ok(None) => Some(ContentFormat::default()),
        Ok(Some(raw)) => {
            let parsed = ContentFormat::parse(raw);
            if parsed.is_none() {
                errors.push(
                    record.path(key),
                    FieldRule::InvalidChoice,
                    "Content format must be one of text, markdown, html, json",
                );
            }
            parsed
        }
    }
}

fn filename(value: &str, field: &str) -> Result<String, FieldError> {
    let name = validate_length(value, field, 1, MAX_FILENAME_LENGTH, "Filename is required", "Filename too long")?;
    if !is_match(&FILENAME_REGEX, &name) {
        return Err(FieldError::new(field, FieldRule::InvalidFormat, "Invalid filename characters"));
    }
    Ok(name)
}

fn mime_type(value: &str, field: &str) -> Result<String, FieldError> {
    if !is_match(&MIME_TYPE_REGEX, value) {
        return Err(FieldError::new(field, FieldRule::InvalidFormat, "Invalid MIME type"));
    }
    Ok(value.to_string())
}

fn attachment_url(value: &str, field: &str) -> Result<url::Url, FieldError> {
    validate_url(value, field, "file URL")
}

/// Parse one attachment located at `path`
pub fn parse_attachment(path: &str, value: &Value, errors: &mut FieldErrors) -> Option<FileAttachment> {
    let record = Record::at(path, value, errors)?;

    let id = required(&record, "id", "Attachment ID", errors, |value, field| {
        validate_uuid(value, field, "attachment ID")
    });
    let filename = required(&record, "filename", "Filename", errors, filename);

    let size = record.required_u64("size", "File size", errors).and_then(|size| {
        if size == 0 {
            errors.push(record.path("size"), FieldRule::OutOfRange, "File size must be greater than 0");
            None
        } else if size > MAX_ATTACHMENT_BYTES {
            errors.push(record.path("size"), FieldRule::OutOfRange, "File size cannot exceed 16MB");
            None
        } else {
            Some(size)
        }
    });

    let mime_type = required(&record, "mime_type", "MIME type", errors, mime_type);
    let url = required(&record, "url", "File URL", errors, attachment_url);
    let uploaded_at = required(&record, "uploaded_at", "Upload time", errors, validate_timestamp);

    Some(FileAttachment {
        id: id?,
        filename: filename?,
        size: size?,
        mime_type: mime_type?,
        url: url?,
        uploaded_at: uploaded_at?,
    })
}

/// Parse the attachment array; absent reads as empty
fn attachments(record: &Record<'_>, key: &str, errors: &mut FieldErrors) -> Option<Vec<FileAttachment>> {
    let items = record.optional_array(key, errors).ok()?;
    let Some(items) = items else {
        return Some(Vec::new());
    };

    let base = record.path(key);
    let mut parsed = Vec::with_capacity(items.len());
    let mut complete = true;
    for (index, item) in items.iter().enumerate() {
        let path = format!("{base}[{index}]");
        match parse_attachment(&path, item, errors) {
            Some(attachment) => parsed.push(attachment),
            None => complete = false,
        }
    }
    complete.then_some(parsed)
}

fn metadata(record: &Record<'_>, key: &str, errors: &mut FieldErrors) -> Result<Option<MessageMetadata>, ()> {
    if record.optional_object(key, errors)?.is_none() {
        return Ok(None);
    }
    let path = record.path(key);
    let value = record.get(key).ok_or(())?;
    let nested = Record::at(&path, value, errors).ok_or(())?;

    let response_time_ms = nested.optional_f64("response_time_ms", errors);
    let token_count = nested.optional_f64("token_count", errors);
    let cost_estimate = nested.optional_f64("cost_estimate", errors);
    let langsmith_trace_id = nested.optional_str("langsmith_trace_id", errors);
    let webhook_attempts = nested.optional_f64("webhook_attempts", errors);
    let error_details = nested.optional_str("error_details", errors);

    let extra: BTreeMap<String, Value> = nested
        .unknown_keys(METADATA_KEYS)
        .map(|key| (key.clone(), nested.fields()[key].clone()))
        .collect();

    Ok(Some(MessageMetadata {
        response_time_ms: response_time_ms?,
        token_count: token_count?,
        cost_estimate: cost_estimate?,
        langsmith_trace_id: langsmith_trace_id?.map(str::to_string),
        webhook_attempts: webhook_attempts?,
        error_details: error_details?.map(str::to_string),
        extra,
    }))
}

fn profile_id(record: &Record<'_>, errors: &mut FieldErrors) -> Option<uuid::Uuid> {
    required(record, "profile_id", "Profile ID", errors, |value, field| {
        validate_uuid(value, field, "profile ID")
    })
}

/// User-submitted message
pub fn parse_new_message(input: &Value) -> Result<NewMessage, ValidationError> {
    let mut errors = FieldErrors::new();
    let Some(record) = Record::root(input, &mut errors) else {
        return errors.finish("message", None);
    };

    let profile_id = profile_id(&record, &mut errors);
    let content = required(&record, "content", "Message content", &mut errors, content);
    let content_format = content_format(&record, "content_format", &mut errors);
    let file_attachments = attachments(&record, "file_attachments", &mut errors);

    let message = match (profile_id, content, content_format, file_attachments) {
        (Some(profile_id), Some(content), Some(content_format), Some(file_attachments)) => Some(NewMessage {
            profile_id,
            content,
            content_format,
            file_attachments,
        }),
        _ => None,
    };
    errors.finish("message", message)
}

/// Fully materialised message, as read back from storage or an agent
pub fn parse_message(input: &Value) -> Result<Message, ValidationError> {
    let mut errors = FieldErrors::new();
    let Some(record) = Record::root(input, &mut errors) else {
        return errors.finish("message", None);
    };

    let id = required(&record, "id", "Message ID", &mut errors, |value, field| {
        validate_uuid(value, field, "message ID")
    });
    let profile_id = profile_id(&record, &mut errors);
    let message_type = required(&record, "message_type", "Message type", &mut errors, |value, field| {
        MessageType::parse(value).ok_or_else(|| {
            FieldError::new(field, FieldRule::InvalidChoice, "Message type must be one of user, agent, system")
        })
    });
    let content = required(&record, "content", "Message content", &mut errors, content);
    let content_format = content_format(&record, "content_format", &mut errors);
    let metadata = metadata(&record, "metadata", &mut errors);
    let file_attachments = attachments(&record, "file_attachments", &mut errors);
    let created_at = required(&record, "created_at", "Creation time", &mut errors, validate_timestamp);
    let updated_at = required(&record, "updated_at", "Update time", &mut errors, validate_timestamp);

    let message = (|| {
        Some(Message {
            id: id?,
            profile_id: profile_id?,
            message_type: message_type?,
            content: content?,
            content_format: content_format?,
            metadata: metadata.ok()?,
            file_attachments: file_attachments?,
            created_at: created_at?,
            updated_at: updated_at?,
        })
    })();
    errors.finish("message", message)
}

fn webhook_metadata(record: &Record<'_>, errors: &mut FieldErrors) -> Option<WebhookMetadata> {
    let Some(value) = record.get("metadata") else {
        errors.push(record.path("metadata"), FieldRule::Required, "Metadata is required");
        return None;
    };
    let path = record.path("metadata");
    let nested = Record::at(&path, value, errors)?;

    let profile_id = profile_id(&nested, errors);
    let environment = required(&nested, "environment", "Environment", errors, |value, field| {
        Environment::parse(value)
            .ok_or_else(|| FieldError::new(field, FieldRule::InvalidChoice, "Environment must be dev or prod"))
    });

    let extra = nested
        .unknown_keys(&["profile_id", "environment"])
        .map(|key| (key.clone(), nested.fields()[key].clone()))
        .collect();

    Some(WebhookMetadata {
        profile_id: profile_id?,
        environment: environment?,
        extra,
    })
}

fn string_list(record: &Record<'_>, key: &str, errors: &mut FieldErrors) -> Result<Option<Vec<String>>, ()> {
    let Some(items) = record.optional_array(key, errors)? else {
        return Ok(None);
    };

    let base = record.path(key);
    let mut values = Vec::with_capacity(items.len());
    let mut complete = true;
    for (index, item) in items.iter().enumerate() {
        match item {
            Value::String(value) => values.push(value.clone()),
            _ => {
                errors.push(format!("{base}[{index}]"), FieldRule::InvalidType, "Expected string");
                complete = false;
            }
        }
    }
    if complete {
        Ok(Some(values))
    } else {
        Err(())
    }
}

/// Inbound agent callback
pub fn parse_webhook_payload(input: &Value) -> Result<WebhookPayload, ValidationError> {
    let mut errors = FieldErrors::new();
    let Some(record) = Record::root(input, &mut errors) else {
        return errors.finish("webhook_payload", None);
    };

    let message_id = required(&record, "message_id", "Message ID", &mut errors, |value, field| {
        validate_uuid(value, field, "message ID")
    });
    let user_id = optional(&record, "user_id", &mut errors, |value, field| {
        validate_uuid(value, field, "user ID")
    });
    let content = record.required_str("content", "Content", &mut errors).map(str::to_string);
    let format = required(&record, "format", "Format", &mut errors, |value, field| {
        ContentFormat::parse(value).ok_or_else(|| {
            FieldError::new(field, FieldRule::InvalidChoice, "Format must be one of text, markdown, html, json")
        })
    });
    let timestamp = required(&record, "timestamp", "Timestamp", &mut errors, validate_timestamp);
    let attachments = string_list(&record, "attachments", &mut errors);
    let metadata = webhook_metadata(&record, &mut errors);

    let payload = (|| {
        Some(WebhookPayload {
            message_id: message_id?,
            user_id: user_id.ok()?,
            content: content?,
            format: format?,
            timestamp: timestamp?,
            attachments: attachments.ok()?,
            metadata: metadata?,
        })
    })();
    errors.finish("webhook_payload", payload)
}
