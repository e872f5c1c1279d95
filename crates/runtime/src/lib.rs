use anyhow::{Context, Result};
use necta_validation::EnvironmentConfig;
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::INFO)
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Process-wide state assembled at boot
#[derive(Debug, Clone, Copy)]
pub struct RelayServices {
    pub config: &'static EnvironmentConfig,
}

impl RelayServices {
    /// Load, validate and install the environment configuration.
    ///
    /// Fails when the environment is invalid or when boot already ran in this
    /// process.
    pub fn initialise() -> Result<Self> {
        let config = necta_config::load().context("failed to load environment configuration")?;
        let config = necta_config::install(config).context("failed to install environment configuration")?;

        info!(
            node_env = ?config.node_env,
            mfa = config.features.mfa,
            file_upload = config.features.file_upload,
            "environment configuration ready"
        );

        Ok(Self { config })
    }

    pub fn is_production(&self) -> bool {
        self.config.is_production()
    }
}
