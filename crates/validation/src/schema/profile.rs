//! Webhook profile schemas, including the discriminated auth config.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use url::Url;

use super::{non_empty, optional, required};
use crate::entities::profile::{LANGSMITH_KEY_MIN_LENGTH, PROFILE_DESCRIPTION_MAX_LENGTH, PROFILE_NAME_MAX_LENGTH};
use crate::entities::{Environment, NewProfile, ProfileUpdate, WebhookAuthConfig, WebhookAuthType};
use crate::types::{FieldError, FieldRule, Secret, ValidationError};
use crate::utils::fields::{FieldErrors, Record};
use crate::utils::validation::is_match;
use crate::utils::{validate_jwt, validate_length, validate_uuid};

static PROFILE_NAME_REGEX: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\s_-]+$").ok());

fn profile_name(value: &str, field: &str) -> Result<String, FieldError> {
    let name = validate_length(
        value,
        field,
        1,
        PROFILE_NAME_MAX_LENGTH,
        "Profile name is required",
        "Profile name must be less than 100 characters",
    )?;
    if !is_match(&PROFILE_NAME_REGEX, &name) {
        return Err(FieldError::new(
            field,
            FieldRule::InvalidFormat,
            "Profile name contains invalid characters",
        ));
    }
    Ok(name)
}

fn description(value: &str, field: &str) -> Result<String, FieldError> {
    validate_length(
        value,
        field,
        0,
        PROFILE_DESCRIPTION_MAX_LENGTH,
        "",
        "Description must be less than 500 characters",
    )
}

fn langsmith_key(value: &str, field: &str) -> Result<Secret, FieldError> {
    if value.chars().count() < LANGSMITH_KEY_MIN_LENGTH {
        return Err(FieldError::new(
            field,
            FieldRule::TooShort,
            "LangSmith API key must be at least 10 characters",
        ));
    }
    Ok(Secret::new(value))
}

/// Absolute http(s) URL with a host; scheme policy is applied later
fn webhook_url(value: &str, field: &str, label: &str) -> Result<Url, FieldError> {
    let invalid = || FieldError::new(field, FieldRule::InvalidFormat, format!("Invalid {label} webhook URL"));
    let url = Url::parse(value).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(url)
}

fn auth_type(value: &str, field: &str) -> Result<WebhookAuthType, FieldError> {
    WebhookAuthType::parse(value).ok_or_else(|| {
        FieldError::new(
            field,
            FieldRule::InvalidChoice,
            "Webhook auth type must be one of none, basic, header, jwt",
        )
    })
}

fn environment(value: &str, field: &str) -> Result<Environment, FieldError> {
    Environment::parse(value)
        .ok_or_else(|| FieldError::new(field, FieldRule::InvalidChoice, "Environment must be dev or prod"))
}

/// Parse the auth config at `path`, dispatching on its `type` tag.
///
/// Keys the selected variant does not define are rejected, so a config can
/// never carry credentials meant for another scheme.
pub fn parse_auth_config(path: &str, value: &Value, errors: &mut FieldErrors) -> Option<WebhookAuthConfig> {
    let record = Record::at(path, value, errors)?;
    let auth_type = required(&record, "type", "Auth config type", errors, auth_type)?;

    let known: &[&str] = match auth_type {
        WebhookAuthType::None => &["type"],
        WebhookAuthType::Basic => &["type", "username", "password"],
        WebhookAuthType::Header => &["type", "key", "value"],
        WebhookAuthType::Jwt => &["type", "token", "secret"],
    };
    let mut complete = true;
    for key in record.unknown_keys(known) {
        errors.push(
            record.path(key),
            FieldRule::UnknownField,
            format!("Field is not allowed for {auth_type} auth"),
        );
        complete = false;
    }

    let config = match auth_type {
        WebhookAuthType::None => Some(WebhookAuthConfig::None),
        WebhookAuthType::Basic => {
            let username = required(&record, "username", "Username", errors, |value, field| {
                non_empty(value, field, "Username is required")
            });
            let password = required(&record, "password", "Password", errors, |value, field| {
                non_empty(value, field, "Password is required").map(Secret::new)
            });
            match (username, password) {
                (Some(username), Some(password)) => Some(WebhookAuthConfig::Basic { username, password }),
                _ => None,
            }
        }
        WebhookAuthType::Header => {
            let key = required(&record, "key", "Header key", errors, |value, field| {
                non_empty(value, field, "Header key is required")
            });
            let header_value = required(&record, "value", "Header value", errors, |value, field| {
                non_empty(value, field, "Header value is required").map(Secret::new)
            });
            match (key, header_value) {
                (Some(key), Some(value)) => Some(WebhookAuthConfig::Header { key, value }),
                _ => None,
            }
        }
        WebhookAuthType::Jwt => {
            let token = required(&record, "token", "JWT token", errors, |value, field| {
                non_empty(value, field, "JWT token is required")?;
                validate_jwt(value, field).map(Secret::new)
            });
            let secret = optional(&record, "secret", errors, |value, _| Ok(Secret::new(value)));
            match (token, secret) {
                (Some(token), Ok(secret)) => Some(WebhookAuthConfig::Jwt { token, secret }),
                _ => None,
            }
        }
    };

    config.filter(|_| complete)
}

/// Declared type and config tag must agree
fn check_auth_match(
    record: &Record<'_>,
    auth_type: Option<WebhookAuthType>,
    config: Option<&WebhookAuthConfig>,
    errors: &mut FieldErrors,
) -> bool {
    match (auth_type, config) {
        (Some(declared), Some(config)) if config.auth_type() != declared => {
            errors.push(
                format!("{}.type", record.path("webhook_auth_config")),
                FieldRule::Mismatch,
                format!(
                    "Auth config type '{}' does not match webhook auth type '{declared}'",
                    config.auth_type()
                ),
            );
            false
        }
        _ => true,
    }
}

/// An update replaces the auth type and its config together or not at all
fn check_auth_pair(record: &Record<'_>, errors: &mut FieldErrors) -> bool {
    match (record.get("webhook_auth_type"), record.get("webhook_auth_config")) {
        (Some(_), None) => {
            errors.push(
                record.path("webhook_auth_config"),
                FieldRule::Required,
                "Webhook auth config is required when changing the auth type",
            );
            false
        }
        (None, Some(_)) => {
            errors.push(
                record.path("webhook_auth_type"),
                FieldRule::Required,
                "Webhook auth type is required when changing the auth config",
            );
            false
        }
        _ => true,
    }
}

fn auth_config_field(
    record: &Record<'_>,
    errors: &mut FieldErrors,
    is_required: bool,
) -> Result<Option<WebhookAuthConfig>, ()> {
    let path = record.path("webhook_auth_config");
    match record.get("webhook_auth_config") {
        None if is_required => {
            errors.push(path, FieldRule::Required, "Webhook auth config is required");
            Err(())
        }
        None => Ok(None),
        Some(value) => parse_auth_config(&path, value, errors).map(Some).ok_or(()),
    }
}

pub fn parse_new_profile(input: &Value) -> Result<NewProfile, ValidationError> {
    let mut errors = FieldErrors::new();
    let Some(record) = Record::root(input, &mut errors) else {
        return errors.finish("profile", None);
    };

    let name = required(&record, "name", "Profile name", &mut errors, profile_name);
    let description = optional(&record, "description", &mut errors, description);
    let dev_webhook_url = required(&record, "dev_webhook_url", "Development webhook URL", &mut errors, |value, field| {
        webhook_url(value, field, "development")
    });
    let prod_webhook_url = required(&record, "prod_webhook_url", "Production webhook URL", &mut errors, |value, field| {
        webhook_url(value, field, "production")
    });
    let webhook_auth_type = required(&record, "webhook_auth_type", "Webhook auth type", &mut errors, auth_type);
    let webhook_auth_config = auth_config_field(&record, &mut errors, true);
    let langsmith_api_key = optional(&record, "langsmith_api_key", &mut errors, langsmith_key);
    let environment = optional(&record, "environment", &mut errors, environment);
    let is_active = record.optional_bool("is_active", &mut errors);

    let matched = check_auth_match(
        &record,
        webhook_auth_type,
        webhook_auth_config.as_ref().ok().and_then(Option::as_ref),
        &mut errors,
    );

    let profile = (|| {
        matched.then_some(())?;
        Some(NewProfile {
            name: name?,
            description: description.ok()?,
            dev_webhook_url: dev_webhook_url?,
            prod_webhook_url: prod_webhook_url?,
            webhook_auth_type: webhook_auth_type?,
            webhook_auth_config: webhook_auth_config.ok()??,
            langsmith_api_key: langsmith_api_key.ok()?,
            environment: environment.ok()?.unwrap_or_default(),
            is_active: is_active.ok()?.unwrap_or(true),
        })
    })();
    errors.finish("profile", profile)
}

pub fn parse_profile_update(input: &Value) -> Result<ProfileUpdate, ValidationError> {
    let mut errors = FieldErrors::new();
    let Some(record) = Record::root(input, &mut errors) else {
        return errors.finish("profile_update", None);
    };

    let id = required(&record, "id", "Profile ID", &mut errors, |value, field| {
        validate_uuid(value, field, "profile ID")
    });
    let name = optional(&record, "name", &mut errors, profile_name);
    let description = optional(&record, "description", &mut errors, description);
    let dev_webhook_url = optional(&record, "dev_webhook_url", &mut errors, |value, field| {
        webhook_url(value, field, "development")
    });
    let prod_webhook_url = optional(&record, "prod_webhook_url", &mut errors, |value, field| {
        webhook_url(value, field, "production")
    });
    let webhook_auth_type = optional(&record, "webhook_auth_type", &mut errors, auth_type);
    let webhook_auth_config = auth_config_field(&record, &mut errors, false);
    let langsmith_api_key = optional(&record, "langsmith_api_key", &mut errors, langsmith_key);
    let environment = optional(&record, "environment", &mut errors, environment);
    let is_active = record.optional_bool("is_active", &mut errors);

    let paired = check_auth_pair(&record, &mut errors);
    let matched = check_auth_match(
        &record,
        webhook_auth_type.ok().flatten(),
        webhook_auth_config.as_ref().ok().and_then(Option::as_ref),
        &mut errors,
    );

    let update = (|| {
        (paired && matched).then_some(())?;
        Some(ProfileUpdate {
            id: id?,
            name: name.ok()?,
            description: description.ok()?,
            dev_webhook_url: dev_webhook_url.ok()?,
            prod_webhook_url: prod_webhook_url.ok()?,
            webhook_auth_type: webhook_auth_type.ok()?,
            webhook_auth_config: webhook_auth_config.ok()?,
            langsmith_api_key: langsmith_api_key.ok()?,
            environment: environment.ok()?,
            is_active: is_active.ok()?,
        })
    })();
    errors.finish("profile_update", update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(config: Value) -> Value {
        json!({
            "name": "Support Bot",
            "dev_webhook_url": "http://localhost:5678/webhook/support",
            "prod_webhook_url": "https://n8n.example.com/webhook/support",
            "webhook_auth_type": config["type"].clone(),
            "webhook_auth_config": config,
        })
    }

    #[test]
    fn test_profile_defaults() {
        let profile = parse_new_profile(&profile(json!({ "type": "none" }))).unwrap();
        assert_eq!(profile.environment, Environment::Dev);
        assert!(profile.is_active);
        assert_eq!(profile.webhook_auth_config, WebhookAuthConfig::None);
    }

    #[test]
    fn test_auth_config_variants() {
        let basic = parse_new_profile(&profile(json!({ "type": "basic", "username": "relay", "password": "pw" }))).unwrap();
        assert_eq!(basic.webhook_auth_type, WebhookAuthType::Basic);

        let jwt = parse_new_profile(&profile(json!({ "type": "jwt", "token": "aaa.bbb.ccc" }))).unwrap();
        assert!(matches!(jwt.webhook_auth_config, WebhookAuthConfig::Jwt { secret: None, .. }));

        let error = parse_new_profile(&profile(json!({ "type": "basic", "username": "" }))).unwrap_err();
        assert!(error.has_field("webhook_auth_config.username"));
        assert!(error.has_field("webhook_auth_config.password"));
    }

    #[test]
    fn test_auth_config_rejects_foreign_fields() {
        let error = parse_new_profile(&profile(json!({ "type": "none", "password": "leak" }))).unwrap_err();
        let leaked: Vec<_> = error.for_field("webhook_auth_config.password").collect();
        assert_eq!(leaked.len(), 1);
        assert_eq!(leaked[0].rule, FieldRule::UnknownField);

        let error = parse_new_profile(&profile(json!({ "type": "oauth" }))).unwrap_err();
        assert!(error.has_field("webhook_auth_config.type"));
    }

    #[test]
    fn test_auth_type_mismatch() {
        let mut input = profile(json!({ "type": "header", "key": "X-Api-Key", "value": "abc" }));
        input["webhook_auth_type"] = json!("basic");

        let error = parse_new_profile(&input).unwrap_err();
        let mismatch: Vec<_> = error.for_field("webhook_auth_config.type").collect();
        assert_eq!(mismatch[0].rule, FieldRule::Mismatch);
    }

    #[test]
    fn test_profile_field_errors() {
        let error = parse_new_profile(&json!({
            "name": "Bad<Name>",
            "description": "d".repeat(501),
            "dev_webhook_url": "ftp://example.com/hook",
            "prod_webhook_url": "not a url",
            "webhook_auth_type": "none",
            "langsmith_api_key": "short",
            "environment": "staging",
            "is_active": "yes",
        }))
        .unwrap_err();

        for field in [
            "name",
            "description",
            "dev_webhook_url",
            "prod_webhook_url",
            "webhook_auth_config",
            "langsmith_api_key",
            "environment",
            "is_active",
        ] {
            assert!(error.has_field(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_profile_update_requires_only_id() {
        let update = parse_profile_update(&json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "environment": "prod",
        }))
        .unwrap();
        assert_eq!(update.environment, Some(Environment::Prod));
        assert!(update.dev_webhook_url.is_none());

        let error = parse_profile_update(&json!({ "name": "Renamed" })).unwrap_err();
        assert!(error.has_field("id"));
    }

    #[test]
    fn test_profile_update_pairs_auth_fields() {
        let id = "550e8400-e29b-41d4-a716-446655440000";

        let error = parse_profile_update(&json!({ "id": id, "webhook_auth_type": "basic" })).unwrap_err();
        assert_eq!(error.errors.len(), 1);
        assert_eq!(error.errors[0].field, "webhook_auth_config");
        assert_eq!(error.errors[0].rule, FieldRule::Required);

        let error = parse_profile_update(&json!({
            "id": id,
            "webhook_auth_config": { "type": "header", "key": "X-Api-Key", "value": "abc" },
        }))
        .unwrap_err();
        assert_eq!(error.errors.len(), 1);
        assert_eq!(error.errors[0].field, "webhook_auth_type");
        assert_eq!(error.errors[0].rule, FieldRule::Required);

        let update = parse_profile_update(&json!({
            "id": id,
            "webhook_auth_type": "none",
            "webhook_auth_config": { "type": "none" },
        }))
        .unwrap();
        assert_eq!(update.webhook_auth_type, Some(WebhookAuthType::None));
        assert_eq!(update.webhook_auth_config, Some(WebhookAuthConfig::None));
    }
}
