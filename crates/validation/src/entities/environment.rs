use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::Secret;

pub const SECRET_KEY_MIN_LENGTH: usize = 32;

/// Deployment mode of the process
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeEnv {
    #[default]
    Development,
    Production,
    Test,
}

impl NodeEnv {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "development" => Some(NodeEnv::Development),
            "production" => Some(NodeEnv::Production),
            "test" => Some(NodeEnv::Test),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeEnv::Development => "development",
            NodeEnv::Production => "production",
            NodeEnv::Test => "test",
        }
    }
}

impl fmt::Display for NodeEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound webhook call settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookSettings {
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
}

impl WebhookSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureFlags {
    pub mfa: bool,
    pub file_upload: bool,
    pub export: bool,
    pub search: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            mfa: true,
            file_upload: true,
            export: true,
            search: true,
        }
    }
}

/// Process-wide settings, validated once at boot and read-only afterwards
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentConfig {
    pub node_env: NodeEnv,
    pub secret_key: Secret,
    pub encryption_key: Secret,
    pub database_url: Url,
    pub langsmith_api_key: Option<Secret>,
    pub n8n_base_url: Option<Url>,
    pub session_timeout_minutes: u64,
    pub password_min_length: usize,
    pub max_file_size_mb: u64,
    pub upload_dir: PathBuf,
    pub webhook: WebhookSettings,
    pub features: FeatureFlags,
}

impl EnvironmentConfig {
    pub fn is_production(&self) -> bool {
        self.node_env == NodeEnv::Production
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_minutes * 60)
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}
