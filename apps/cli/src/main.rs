use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use necta_config::ConfigError;
use necta_runtime::telemetry;
use necta_validation::{
    rate_limit_key, validators, ApiError, ApiSuccess, ProfileResponse, RateLimitDecision, RateLimitPolicy, Rejection,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

const REDACTED: &str = "[redacted]";

#[derive(Parser)]
#[command(name = "necta")]
#[command(about = "NECTA relay validation engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a JSON document and print the response envelope
    Validate {
        kind: DocumentKind,
        /// Read the document from a file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Load and validate the environment configuration
    CheckEnv,
    /// Evaluate a rate-limit decision from recorded counters
    RateLimit {
        #[arg(long)]
        identifier: String,
        #[arg(long, default_value = "login")]
        action: String,
        #[arg(long)]
        attempts: u32,
        #[arg(long, default_value_t = 5)]
        max_attempts: u32,
        #[arg(long, default_value_t = 60_000)]
        window_ms: i64,
        /// Milliseconds since the last recorded attempt
        #[arg(long)]
        elapsed_ms: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DocumentKind {
    Registration,
    Login,
    PasswordResetRequest,
    PasswordReset,
    PasswordChange,
    MfaSetup,
    MfaVerification,
    UserProfileUpdate,
    Message,
    MessageRecord,
    Profile,
    ProfileUpdate,
    WebhookPayload,
    Pagination,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    telemetry::init_tracing().context("failed to initialise tracing")?;

    match cli.command {
        Commands::Validate { kind, file } => validate(kind, file),
        Commands::CheckEnv => check_env(),
        Commands::RateLimit {
            identifier,
            action,
            attempts,
            max_attempts,
            window_ms,
            elapsed_ms,
        } => rate_limit(&identifier, &action, attempts, max_attempts, window_ms, elapsed_ms),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render response")?;
    println!("{rendered}");
    Ok(())
}

fn read_document(file: Option<PathBuf>) -> anyhow::Result<String> {
    match file {
        Some(path) => {
            std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn serialized<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn redact(mut value: Value, keys: &[&str]) -> Value {
    if let Value::Object(map) = &mut value {
        for key in keys {
            if let Some(entry) = map.get_mut(*key) {
                *entry = Value::from(REDACTED);
            }
        }
    }
    value
}

/// Run the entry point for `kind` and render the accepted entity without secrets
fn validate_document(kind: DocumentKind, input: &Value) -> Result<Value, Rejection> {
    let data = match kind {
        DocumentKind::Registration => validators::validate_registration(input).map(|credential| {
            json!({ "username": credential.username, "email": credential.email, "password": REDACTED })
        })?,
        DocumentKind::Login => validators::validate_login(input).map(|login| {
            json!({ "identifier": login.identifier, "password": REDACTED, "remember_me": login.remember_me })
        })?,
        DocumentKind::PasswordResetRequest => serialized(&validators::validate_password_reset_request(input)?),
        DocumentKind::PasswordReset => validators::validate_password_reset(input)
            .map(|_| json!({ "token": REDACTED, "password": REDACTED }))?,
        DocumentKind::PasswordChange => validators::validate_password_change(input)
            .map(|_| json!({ "current_password": REDACTED, "new_password": REDACTED }))?,
        DocumentKind::MfaSetup => validators::validate_mfa_setup(input)
            .map(|setup| json!({ "secret": REDACTED, "code": setup.code }))?,
        DocumentKind::MfaVerification => serialized(&validators::validate_mfa_verification(input)?),
        DocumentKind::UserProfileUpdate => serialized(&validators::validate_user_profile_update(input)?),
        DocumentKind::Message => serialized(&validators::validate_message_creation(input)?),
        DocumentKind::MessageRecord => serialized(&validators::validate_message(input)?),
        DocumentKind::Profile => {
            let profile = validators::validate_profile_creation(input)?.into_profile(Uuid::new_v4(), Utc::now());
            serialized(&ProfileResponse::from(&profile))
        }
        DocumentKind::ProfileUpdate => redact(
            serialized(&validators::validate_profile_update(input)?),
            &["webhook_auth_config", "langsmith_api_key"],
        ),
        DocumentKind::WebhookPayload => serialized(&validators::validate_webhook_payload(input)?),
        DocumentKind::Pagination => serialized(&validators::validate_pagination(input)?),
    };
    Ok(data)
}

fn validate(kind: DocumentKind, file: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    let raw = read_document(file)?;
    let input: Value = match serde_json::from_str(&raw) {
        Ok(input) => input,
        Err(error) => {
            print_json(&ApiError::new("invalid_json", error.to_string()))?;
            return Ok(ExitCode::FAILURE);
        }
    };

    match validate_document(kind, &input) {
        Ok(data) => {
            print_json(&ApiSuccess::new(data).with_message(format!("{kind:?} accepted")))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(rejection) => {
            print_json(&ApiError::from(&rejection).with_request_id(Uuid::new_v4()))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn check_env() -> anyhow::Result<ExitCode> {
    info!("validating environment configuration");

    match necta_config::load() {
        Ok(config) => {
            print_json(&ApiSuccess::new(json!({
                "node_env": config.node_env,
                "database_url": REDACTED,
                "n8n_base_url": config.n8n_base_url,
                "session_timeout_minutes": config.session_timeout_minutes,
                "password_min_length": config.password_min_length,
                "max_file_size_mb": config.max_file_size_mb,
                "upload_dir": config.upload_dir,
                "webhook": config.webhook,
                "features": config.features,
            })))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(ConfigError::Invalid(rejection)) => {
            print_json(&ApiError::from(&rejection))?;
            Ok(ExitCode::FAILURE)
        }
        Err(error) => Err(error).context("failed to load configuration"),
    }
}

fn last_attempt_at(now: DateTime<Utc>, elapsed_ms: i64) -> anyhow::Result<DateTime<Utc>> {
    anyhow::ensure!(elapsed_ms >= 0, "--elapsed-ms must not be negative, got {elapsed_ms}");
    Duration::try_milliseconds(elapsed_ms)
        .and_then(|elapsed| now.checked_sub_signed(elapsed))
        .with_context(|| format!("--elapsed-ms {elapsed_ms} is out of range"))
}

fn rate_limit(
    identifier: &str,
    action: &str,
    attempts: u32,
    max_attempts: u32,
    window_ms: i64,
    elapsed_ms: i64,
) -> anyhow::Result<ExitCode> {
    let now = Utc::now();
    let policy = RateLimitPolicy::from_millis(max_attempts, window_ms).context("invalid --window-ms")?;
    let last_attempt = last_attempt_at(now, elapsed_ms)?;
    let decision = policy.evaluate(attempts, last_attempt, now);

    let retry_after_ms = match decision {
        RateLimitDecision::Limited { retry_after } => Some(retry_after.num_milliseconds()),
        RateLimitDecision::Allowed => None,
    };
    print_json(&json!({
        "key": rate_limit_key(identifier, action),
        "limited": decision.is_limited(),
        "retry_after_ms": retry_after_ms,
    }))?;

    Ok(if decision.is_limited() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
