use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::security::check_webhook_urls;
use crate::types::{FieldError, FieldRule, Rejection, Secret, ValidationError};

pub const PROFILE_NAME_MAX_LENGTH: usize = 100;
pub const PROFILE_DESCRIPTION_MAX_LENGTH: usize = 500;
pub const LANGSMITH_KEY_MIN_LENGTH: usize = 10;

/// Which webhook target a profile currently routes to
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    Prod,
}

impl Environment {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dev" => Some(Environment::Dev),
            "prod" => Some(Environment::Prod),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared authentication scheme for outbound webhook calls
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WebhookAuthType {
    None,
    Basic,
    Header,
    Jwt,
}

impl WebhookAuthType {
    pub const ALL: [WebhookAuthType; 4] = [
        WebhookAuthType::None,
        WebhookAuthType::Basic,
        WebhookAuthType::Header,
        WebhookAuthType::Jwt,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(WebhookAuthType::None),
            "basic" => Some(WebhookAuthType::Basic),
            "header" => Some(WebhookAuthType::Header),
            "jwt" => Some(WebhookAuthType::Jwt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookAuthType::None => "none",
            WebhookAuthType::Basic => "basic",
            WebhookAuthType::Header => "header",
            WebhookAuthType::Jwt => "jwt",
        }
    }
}

impl fmt::Display for WebhookAuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials for the outbound webhook call, one shape per scheme
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WebhookAuthConfig {
    None,
    Basic {
        username: String,
        password: Secret,
    },
    Header {
        key: String,
        value: Secret,
    },
    Jwt {
        token: Secret,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        secret: Option<Secret>,
    },
}

impl WebhookAuthConfig {
    pub fn auth_type(&self) -> WebhookAuthType {
        match self {
            WebhookAuthConfig::None => WebhookAuthType::None,
            WebhookAuthConfig::Basic { .. } => WebhookAuthType::Basic,
            WebhookAuthConfig::Header { .. } => WebhookAuthType::Header,
            WebhookAuthConfig::Jwt { .. } => WebhookAuthType::Jwt,
        }
    }
}

/// Profile as submitted for creation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewProfile {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub dev_webhook_url: Url,
    pub prod_webhook_url: Url,
    pub webhook_auth_type: WebhookAuthType,
    pub webhook_auth_config: WebhookAuthConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub langsmith_api_key: Option<Secret>,
    pub environment: Environment,
    pub is_active: bool,
}

impl NewProfile {
    /// Materialise the stored profile once the caller has assigned an id
    pub fn into_profile(self, id: Uuid, now: DateTime<Utc>) -> Profile {
        Profile {
            id,
            name: self.name,
            description: self.description,
            dev_webhook_url: self.dev_webhook_url,
            prod_webhook_url: self.prod_webhook_url,
            webhook_auth_type: self.webhook_auth_type,
            webhook_auth_config: self.webhook_auth_config,
            langsmith_api_key: self.langsmith_api_key,
            environment: self.environment,
            is_active: self.is_active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial profile update; absent fields stay untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileUpdate {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_webhook_url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prod_webhook_url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_auth_type: Option<WebhookAuthType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_auth_config: Option<WebhookAuthConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub langsmith_api_key: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl ProfileUpdate {
    /// Merge the present fields into a stored profile.
    ///
    /// The merged profile must keep two distinct webhook targets that pass the
    /// URL policy, and an auth config whose tag matches its declared type. On
    /// rejection `profile` is left untouched.
    pub fn apply_to(self, profile: &mut Profile, now: DateTime<Utc>) -> Result<(), Rejection> {
        let mut merged = profile.clone();
        if let Some(name) = self.name {
            merged.name = name;
        }
        if let Some(description) = self.description {
            merged.description = Some(description);
        }
        if let Some(url) = self.dev_webhook_url {
            merged.dev_webhook_url = url;
        }
        if let Some(url) = self.prod_webhook_url {
            merged.prod_webhook_url = url;
        }
        if let Some(auth_type) = self.webhook_auth_type {
            merged.webhook_auth_type = auth_type;
        }
        if let Some(config) = self.webhook_auth_config {
            merged.webhook_auth_config = config;
        }
        if let Some(key) = self.langsmith_api_key {
            merged.langsmith_api_key = Some(key);
        }
        if let Some(environment) = self.environment {
            merged.environment = environment;
        }
        if let Some(is_active) = self.is_active {
            merged.is_active = is_active;
        }

        check_webhook_urls(Some(&merged.dev_webhook_url), Some(&merged.prod_webhook_url))?;
        let config_type = merged.webhook_auth_config.auth_type();
        if config_type != merged.webhook_auth_type {
            return Err(ValidationError::new(
                "profile_update",
                vec![FieldError::new(
                    "webhook_auth_config.type",
                    FieldRule::Mismatch,
                    format!(
                        "Auth config type '{config_type}' does not match webhook auth type '{}'",
                        merged.webhook_auth_type
                    ),
                )],
            )
            .into());
        }

        merged.updated_at = now;
        *profile = merged;
        Ok(())
    }
}

/// Webhook routing profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub dev_webhook_url: Url,
    pub prod_webhook_url: Url,
    pub webhook_auth_type: WebhookAuthType,
    pub webhook_auth_config: WebhookAuthConfig,
    pub langsmith_api_key: Option<Secret>,
    pub environment: Environment,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile as returned to API clients; credentials are never included
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub dev_webhook_url: Url,
    pub prod_webhook_url: Url,
    pub webhook_auth_type: WebhookAuthType,
    pub environment: Environment,
    pub is_active: bool,
    pub has_langsmith_key: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Profile> for ProfileResponse {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            name: profile.name.clone(),
            description: profile.description.clone(),
            dev_webhook_url: profile.dev_webhook_url.clone(),
            prod_webhook_url: profile.prod_webhook_url.clone(),
            webhook_auth_type: profile.webhook_auth_type,
            environment: profile.environment,
            is_active: profile.is_active,
            has_langsmith_key: profile.langsmith_api_key.is_some(),
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_profile() -> NewProfile {
        NewProfile {
            name: "Support Bot".to_string(),
            description: None,
            dev_webhook_url: Url::parse("http://localhost:5678/webhook/support").unwrap(),
            prod_webhook_url: Url::parse("https://n8n.example.com/webhook/support").unwrap(),
            webhook_auth_type: WebhookAuthType::Header,
            webhook_auth_config: WebhookAuthConfig::Header {
                key: "X-Api-Key".to_string(),
                value: Secret::from("abc123"),
            },
            langsmith_api_key: Some(Secret::from("ls__0123456789")),
            environment: Environment::Prod,
            is_active: true,
        }
    }

    #[test]
    fn test_auth_config_is_tagged() {
        let config = WebhookAuthConfig::Basic {
            username: "relay".to_string(),
            password: Secret::from("hunter22"),
        };
        assert_eq!(config.auth_type(), WebhookAuthType::Basic);
        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({ "type": "basic", "username": "relay", "password": "hunter22" })
        );

        let none: WebhookAuthConfig = serde_json::from_value(json!({ "type": "none" })).unwrap();
        assert_eq!(none, WebhookAuthConfig::None);
    }

    #[test]
    fn test_auth_config_debug_redacts_secrets() {
        let config = WebhookAuthConfig::Jwt {
            token: Secret::from("eyJ.eyJ.sig"),
            secret: None,
        };
        assert!(!format!("{config:?}").contains("eyJ"));
    }

    #[test]
    fn test_into_profile_and_response() {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let profile = new_profile().into_profile(id, now);

        assert_eq!(profile.id, id);
        assert_eq!(profile.created_at, now);

        let response = ProfileResponse::from(&profile);
        assert!(response.has_langsmith_key);
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("webhook_auth_config").is_none());
        assert!(value.get("langsmith_api_key").is_none());
    }

    #[test]
    fn test_update_applies_present_fields() {
        let mut profile = new_profile().into_profile(Uuid::new_v4(), Utc::now());
        let later = profile.updated_at + chrono::Duration::minutes(5);

        ProfileUpdate {
            environment: Some(Environment::Dev),
            is_active: Some(false),
            ..Default::default()
        }
        .apply_to(&mut profile, later)
        .unwrap();

        assert_eq!(profile.environment, Environment::Dev);
        assert!(!profile.is_active);
        assert_eq!(profile.name, "Support Bot");
        assert_eq!(profile.updated_at, later);
    }

    #[test]
    fn test_update_cannot_collide_webhook_targets() {
        let mut profile = new_profile().into_profile(Uuid::new_v4(), Utc::now());
        let before = profile.clone();

        let rejection = ProfileUpdate {
            dev_webhook_url: Some(profile.prod_webhook_url.clone()),
            ..Default::default()
        }
        .apply_to(&mut profile, Utc::now())
        .unwrap_err();

        assert_eq!(rejection.security_rule(), Some(crate::types::SecurityRule::WebhookUrlConflict));
        assert_eq!(profile, before);
    }

    #[test]
    fn test_update_cannot_split_auth_type_from_config() {
        let mut profile = new_profile().into_profile(Uuid::new_v4(), Utc::now());
        let before = profile.clone();

        let rejection = ProfileUpdate {
            webhook_auth_type: Some(WebhookAuthType::Basic),
            ..Default::default()
        }
        .apply_to(&mut profile, Utc::now())
        .unwrap_err();

        let errors = rejection.field_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "webhook_auth_config.type");
        assert_eq!(errors[0].rule, FieldRule::Mismatch);
        assert_eq!(profile, before);

        ProfileUpdate {
            webhook_auth_type: Some(WebhookAuthType::None),
            webhook_auth_config: Some(WebhookAuthConfig::None),
            ..Default::default()
        }
        .apply_to(&mut profile, Utc::now())
        .unwrap();
        assert_eq!(profile.webhook_auth_config.auth_type(), profile.webhook_auth_type);
    }
}
