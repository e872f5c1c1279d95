//! Test plan for the `necta-config` crate.
//!
//! These tests exercise the loader across file discovery, explicit file
//! paths, environment overrides and validation failures.

use std::fs;
use std::path::{Path, PathBuf};

use serial_test::serial;
use tempfile::TempDir;

use necta_config::{collect_vars, load, ConfigError};
use necta_validation::entities::NodeEnv;

const ENV_VARS_TO_RESET: &[&str] = &[
    "NECTA_CONFIG",
    "NODE_ENV",
    "SECRET_KEY",
    "ENCRYPTION_KEY",
    "DATABASE_URL",
    "LANGSMITH_API_KEY",
    "N8N_BASE_URL",
    "SESSION_TIMEOUT_MINUTES",
    "PASSWORD_MIN_LENGTH",
    "MAX_FILE_SIZE_MB",
    "UPLOAD_DIR",
    "WEBHOOK_TIMEOUT",
    "WEBHOOK_MAX_RETRIES",
    "WEBHOOK_RETRY_DELAY_SECONDS",
    "FEATURE_MFA_ENABLED",
    "FEATURE_FILE_UPLOAD_ENABLED",
    "FEATURE_EXPORT_ENABLED",
    "FEATURE_SEARCH_ENABLED",
];

const MINIMAL_FILE: &str = r#"
secret_key = "0123456789abcdef0123456789abcdef"
encryption_key = "fedcba9876543210fedcba9876543210"
database_url = "postgres://necta@localhost:5432/necta"
"#;

struct TestContext {
    vars: Vec<(String, Option<String>)>,
    original_dir: Option<PathBuf>,
}

impl TestContext {
    fn new() -> Self {
        Self {
            vars: Vec::new(),
            original_dir: None,
        }
    }

    fn reset_environment(&mut self) {
        for key in ENV_VARS_TO_RESET {
            self.remove_var(key);
        }
    }

    fn set_var(&mut self, key: &str, value: impl AsRef<str>) {
        let previous = std::env::var(key).ok();
        std::env::set_var(key, value.as_ref());
        self.vars.push((key.to_string(), previous));
    }

    fn remove_var(&mut self, key: &str) {
        let previous = std::env::var(key).ok();
        std::env::remove_var(key);
        self.vars.push((key.to_string(), previous));
    }

    fn set_current_dir(&mut self, dir: &Path) {
        if self.original_dir.is_none() {
            self.original_dir = Some(std::env::current_dir().expect("failed to capture current directory"));
        }
        std::env::set_current_dir(dir).expect("failed to set current directory");
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        if let Some(original) = self.original_dir.take() {
            let _ = std::env::set_current_dir(original);
        }

        while let Some((key, value)) = self.vars.pop() {
            match value {
                Some(val) => std::env::set_var(&key, val),
                None => std::env::remove_var(&key),
            }
        }
    }
}

fn write_config_file(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create config directories");
    }
    fs::write(&path, contents).expect("failed to write config file");
    path
}

fn isolated() -> (TempDir, TestContext) {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());
    (temp_dir, ctx)
}

#[test]
#[serial]
fn load_reports_every_missing_required_key() {
    let (_temp_dir, _ctx) = isolated();

    match load() {
        Err(ConfigError::Invalid(rejection)) => {
            let fields: Vec<_> = rejection.field_errors().iter().map(|e| e.field.as_str()).collect();
            assert_eq!(fields, vec!["SECRET_KEY", "ENCRYPTION_KEY", "DATABASE_URL"]);
        }
        other => panic!("expected a validation failure, got {other:?}"),
    }
}

#[test]
#[serial]
fn load_reads_discovered_file_with_defaults() {
    let (temp_dir, _ctx) = isolated();
    write_config_file(temp_dir.path(), "necta.toml", MINIMAL_FILE);

    let config = load().expect("configuration should load from necta.toml");

    assert_eq!(config.node_env, NodeEnv::Development);
    assert_eq!(config.session_timeout_minutes, 10);
    assert_eq!(config.password_min_length, 12);
    assert_eq!(config.webhook.max_retries, 3);
    assert!(config.features.mfa);
    assert_eq!(config.database_url.scheme(), "postgres");
}

#[test]
#[serial]
fn load_discovers_nested_config_directory() {
    let (temp_dir, _ctx) = isolated();
    let contents = format!("{MINIMAL_FILE}\nsession_timeout_minutes = 45\nfeature_export_enabled = false\n");
    write_config_file(temp_dir.path(), "config/necta.toml", &contents);

    let config = load().expect("configuration should load from config/necta.toml");

    assert_eq!(config.session_timeout_minutes, 45);
    assert!(!config.features.export);
}

#[test]
#[serial]
fn explicit_config_path_wins_over_discovery() {
    let (temp_dir, mut ctx) = isolated();
    write_config_file(temp_dir.path(), "necta.toml", "secret_key = \"short\"\n");
    let explicit = write_config_file(
        temp_dir.path(),
        "settings/custom.toml",
        &format!("{MINIMAL_FILE}\nnode_env = \"test\"\n"),
    );
    ctx.set_var("NECTA_CONFIG", explicit.display().to_string());

    let config = load().expect("explicit configuration should load");
    assert_eq!(config.node_env, NodeEnv::Test);
}

#[test]
#[serial]
fn environment_overrides_file_values() {
    let (temp_dir, mut ctx) = isolated();
    write_config_file(temp_dir.path(), "necta.toml", MINIMAL_FILE);
    ctx.set_var("NODE_ENV", "production");
    ctx.set_var("WEBHOOK_TIMEOUT", "120");
    ctx.set_var("DATABASE_URL", "postgres://necta@db.internal:5432/necta");

    let config = load().expect("configuration should load with overrides");

    assert!(config.is_production());
    assert_eq!(config.webhook.timeout_seconds, 120);
    assert_eq!(config.database_url.host_str(), Some("db.internal"));
}

#[test]
#[serial]
fn blank_environment_value_falls_back_to_default() {
    let (temp_dir, mut ctx) = isolated();
    write_config_file(temp_dir.path(), "necta.toml", MINIMAL_FILE);
    ctx.set_var("MAX_FILE_SIZE_MB", "   ");

    let config = load().expect("blank values should read as unset");
    assert_eq!(config.max_file_size_mb, 16);
}

#[test]
#[serial]
fn out_of_range_values_are_rejected_by_key() {
    let (temp_dir, mut ctx) = isolated();
    write_config_file(temp_dir.path(), "necta.toml", MINIMAL_FILE);
    ctx.set_var("SESSION_TIMEOUT_MINUTES", "90");
    ctx.set_var("FEATURE_MFA_ENABLED", "maybe");

    match load() {
        Err(ConfigError::Invalid(rejection)) => {
            let fields: Vec<_> = rejection.field_errors().iter().map(|e| e.field.as_str()).collect();
            assert_eq!(fields, vec!["SESSION_TIMEOUT_MINUTES", "FEATURE_MFA_ENABLED"]);
        }
        other => panic!("expected a validation failure, got {other:?}"),
    }
}

#[test]
#[serial]
fn tables_in_config_file_are_rejected() {
    let (temp_dir, _ctx) = isolated();
    write_config_file(
        temp_dir.path(),
        "necta.toml",
        &format!("{MINIMAL_FILE}\n[webhook]\ntimeout = 10\n"),
    );

    match collect_vars() {
        Err(ConfigError::NotScalar(key)) => assert_eq!(key, "webhook"),
        other => panic!("expected a non-scalar error, got {other:?}"),
    }
}

#[test]
#[serial]
fn file_keys_are_upper_cased() {
    let (temp_dir, _ctx) = isolated();
    write_config_file(temp_dir.path(), "necta.toml", MINIMAL_FILE);

    let vars = collect_vars().expect("variables should collect");
    assert_eq!(
        vars.get("DATABASE_URL").map(String::as_str),
        Some("postgres://necta@localhost:5432/necta")
    );
    assert!(!vars.contains_key("database_url"));
}
