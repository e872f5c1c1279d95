//! Boot-time environment variable schema.
//!
//! Input is a flat name to string map. Blank values count as unset so an
//! exported-but-empty variable falls back to its default. Plain values are
//! trimmed; secrets are kept byte for byte.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::entities::{EnvironmentConfig, FeatureFlags, NodeEnv, WebhookSettings, SECRET_KEY_MIN_LENGTH};
use crate::types::{FieldRule, Secret, ValidationError};
use crate::utils::fields::FieldErrors;
use crate::utils::validate_url;

const DEFAULT_UPLOAD_DIR: &str = "./uploads";

struct Vars<'a> {
    vars: &'a HashMap<String, String>,
}

impl<'a> Vars<'a> {
    /// Untrimmed value, unless blank
    fn raw(&self, key: &str) -> Option<&'a str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    fn get(&self, key: &str) -> Option<&'a str> {
        self.raw(key).map(str::trim)
    }

    fn secret(&self, key: &str, label: &str, errors: &mut FieldErrors) -> Option<Secret> {
        let Some(value) = self.raw(key) else {
            errors.push(key, FieldRule::Required, format!("{key} is required"));
            return None;
        };
        if value.chars().count() < SECRET_KEY_MIN_LENGTH {
            errors.push(
                key,
                FieldRule::TooShort,
                format!("{label} must be at least {SECRET_KEY_MIN_LENGTH} characters"),
            );
            return None;
        }
        Some(Secret::new(value))
    }

    /// Integer in `min..=max`, or `default` when unset
    fn number(&self, key: &str, min: u64, max: u64, default: u64, errors: &mut FieldErrors) -> Option<u64> {
        let Some(raw) = self.get(key) else {
            return Some(default);
        };
        let Ok(value) = raw.parse::<u64>() else {
            errors.push(key, FieldRule::InvalidType, format!("{key} must be a whole number"));
            return None;
        };
        if !(min..=max).contains(&value) {
            errors.push(
                key,
                FieldRule::OutOfRange,
                format!("{key} must be between {min} and {max}"),
            );
            return None;
        }
        Some(value)
    }

    fn flag(&self, key: &str, errors: &mut FieldErrors) -> Option<bool> {
        let Some(raw) = self.get(key) else {
            return Some(true);
        };
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => {
                errors.push(key, FieldRule::InvalidType, format!("{key} must be true or false"));
                None
            }
        }
    }
}

/// Parse the process environment into an [`EnvironmentConfig`]
pub fn parse_environment(vars: &HashMap<String, String>) -> Result<EnvironmentConfig, ValidationError> {
    let vars = Vars { vars };
    let mut errors = FieldErrors::new();

    let node_env = match vars.get("NODE_ENV") {
        None => Some(NodeEnv::default()),
        Some(raw) => {
            let parsed = NodeEnv::parse(raw);
            if parsed.is_none() {
                errors.push(
                    "NODE_ENV",
                    FieldRule::InvalidChoice,
                    "NODE_ENV must be one of development, production, test",
                );
            }
            parsed
        }
    };

    let secret_key = vars.secret("SECRET_KEY", "Secret key", &mut errors);
    let encryption_key = vars.secret("ENCRYPTION_KEY", "Encryption key", &mut errors);

    let database_url = match vars.get("DATABASE_URL") {
        None => {
            errors.push("DATABASE_URL", FieldRule::Required, "DATABASE_URL is required");
            None
        }
        Some(raw) => errors.check(validate_url(raw, "DATABASE_URL", "database URL")),
    };

    let langsmith_api_key = vars.raw("LANGSMITH_API_KEY").map(Secret::new);
    let n8n_base_url = match vars.get("N8N_BASE_URL") {
        None => Ok(None),
        Some(raw) => errors
            .check(validate_url(raw, "N8N_BASE_URL", "n8n base URL"))
            .map(Some)
            .ok_or(()),
    };

    let session_timeout_minutes = vars.number("SESSION_TIMEOUT_MINUTES", 1, 60, 10, &mut errors);
    let password_min_length = vars.number("PASSWORD_MIN_LENGTH", 8, 50, 12, &mut errors);
    let max_file_size_mb = vars.number("MAX_FILE_SIZE_MB", 1, 100, 16, &mut errors);
    let upload_dir = PathBuf::from(vars.get("UPLOAD_DIR").unwrap_or(DEFAULT_UPLOAD_DIR));

    let webhook_timeout = vars.number("WEBHOOK_TIMEOUT", 1, 300, 30, &mut errors);
    let webhook_max_retries = vars.number("WEBHOOK_MAX_RETRIES", 0, 10, 3, &mut errors);
    let webhook_retry_delay = vars.number("WEBHOOK_RETRY_DELAY_SECONDS", 1, 60, 5, &mut errors);

    let mfa = vars.flag("FEATURE_MFA_ENABLED", &mut errors);
    let file_upload = vars.flag("FEATURE_FILE_UPLOAD_ENABLED", &mut errors);
    let export = vars.flag("FEATURE_EXPORT_ENABLED", &mut errors);
    let search = vars.flag("FEATURE_SEARCH_ENABLED", &mut errors);

    let webhook = match (webhook_timeout, webhook_max_retries, webhook_retry_delay) {
        (Some(timeout_seconds), Some(max_retries), Some(retry_delay_seconds)) => Some(WebhookSettings {
            timeout_seconds,
            max_retries: max_retries as u32,
            retry_delay_seconds,
        }),
        _ => None,
    };

    let features = match (mfa, file_upload, export, search) {
        (Some(mfa), Some(file_upload), Some(export), Some(search)) => Some(FeatureFlags {
            mfa,
            file_upload,
            export,
            search,
        }),
        _ => None,
    };

    let config = (|| {
        Some(EnvironmentConfig {
            node_env: node_env?,
            secret_key: secret_key?,
            encryption_key: encryption_key?,
            database_url: database_url?,
            langsmith_api_key,
            n8n_base_url: n8n_base_url.ok()?,
            session_timeout_minutes: session_timeout_minutes?,
            password_min_length: password_min_length? as usize,
            max_file_size_mb: max_file_size_mb?,
            upload_dir,
            webhook: webhook?,
            features: features?,
        })
    })();

    errors.finish("environment", config)
}
