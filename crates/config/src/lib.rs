use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, Environment, File, Map, Value};
use necta_validation::{validate_environment_variables, EnvironmentConfig, Rejection};
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "necta.toml",
    "config/necta.toml",
    "../necta.toml",
    "../config/necta.toml",
];

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_VAR: &str = "NECTA_CONFIG";

static INSTALLED: OnceCell<EnvironmentConfig> = OnceCell::new();

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read configuration source: {0}")]
    Source(#[from] config::ConfigError),

    #[error("configuration key `{0}` must be a scalar value")]
    NotScalar(String),

    #[error("invalid environment configuration: {0}")]
    Invalid(#[from] Rejection),

    #[error("environment configuration is already installed")]
    AlreadyInstalled,
}

fn config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
        debug!(path, "loading configuration via NECTA_CONFIG");
        return Some(PathBuf::from(path));
    }

    let cwd = std::env::current_dir().ok()?;
    let found = DEFAULT_CONFIG_FILES
        .iter()
        .map(|candidate| cwd.join(candidate))
        .find(|path| path.exists());

    if let Some(path) = &found {
        debug!(path = %path.display(), "loading configuration file");
    }
    found
}

fn flatten(source: Config, strict: bool, into: &mut HashMap<String, String>) -> Result<(), ConfigError> {
    let values: Map<String, Value> = source.try_deserialize()?;
    for (key, value) in values {
        match value.into_string() {
            Ok(scalar) => {
                into.insert(key.to_uppercase(), scalar);
            }
            Err(_) if strict => return Err(ConfigError::NotScalar(key)),
            Err(_) => debug!(key = %key, "skipping non-scalar environment entry"),
        }
    }
    Ok(())
}

/// Collect the raw key/value map: file values first, process environment on top.
///
/// File keys are matched case-insensitively against the environment keys, so
/// `secret_key = "..."` in `necta.toml` and `SECRET_KEY` in the environment
/// name the same setting.
pub fn collect_vars() -> Result<HashMap<String, String>, ConfigError> {
    let mut vars = HashMap::new();

    match config_file() {
        Some(path) => {
            let file = Config::builder().add_source(File::from(path)).build()?;
            flatten(file, true, &mut vars)?;
        }
        None => debug!("no configuration file found, relying on environment variables"),
    }

    let environment = Config::builder().add_source(Environment::default()).build()?;
    flatten(environment, false, &mut vars)?;

    Ok(vars)
}

/// Load and validate the environment configuration.
///
/// ```no_run
/// let config = necta_config::load().expect("environment should be valid");
/// assert!(config.session_timeout_minutes >= 1);
/// ```
pub fn load() -> Result<EnvironmentConfig, ConfigError> {
    let vars = collect_vars()?;
    let config = validate_environment_variables(&vars)?;
    debug!(node_env = ?config.node_env, "loaded environment configuration");
    Ok(config)
}

/// Store the validated configuration for the lifetime of the process.
pub fn install(config: EnvironmentConfig) -> Result<&'static EnvironmentConfig, ConfigError> {
    INSTALLED
        .set(config)
        .map_err(|_| ConfigError::AlreadyInstalled)?;
    INSTALLED.get().ok_or(ConfigError::AlreadyInstalled)
}

/// The installed configuration, if boot has completed
pub fn current() -> Option<&'static EnvironmentConfig> {
    INSTALLED.get()
}
