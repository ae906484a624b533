//! Container configuration is based on [ContainerSettings], which are created with opinionated
//! default values, which can then be overwritten by environment variables prefixed with
//! `LAZYBEAN_` or the `lazybean.json` file.
//!
//! Note: these settings configure the container itself. Configuration *values* injected into beans
//! are set explicitly via [set_value](crate::global::set_value) or
//! [TypedContext::set_value](crate::context::TypedContext::set_value).

use crate::error::Error;
use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const SETTINGS_ENV_PREFIX: &str = "LAZYBEAN";

/// Name of the default settings file.
pub const SETTINGS_FILE: &str = "lazybean.json";

/// Environment variable with a log filter directive, which takes precedence over
/// [ContainerSettings::log_level].
pub const LOG_ENV: &str = "LAZYBEAN_LOG";

/// Container settings.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct ContainerSettings {
    /// Should a default tracing logger be installed when the global container is activated.
    pub install_tracing_logger: bool,
    /// Log level used by the installed logger, unless overridden by [LOG_ENV].
    pub log_level: String,
    /// Whether registering a provider for an already registered key replaces it, or fails.
    pub allow_provider_overriding: bool,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            install_tracing_logger: false,
            log_level: "info".to_string(),
            allow_provider_overriding: true,
        }
    }
}

impl From<OptionalContainerSettings> for ContainerSettings {
    fn from(value: OptionalContainerSettings) -> Self {
        let default = Self::default();
        Self {
            install_tracing_logger: value
                .install_tracing_logger
                .unwrap_or(default.install_tracing_logger),
            log_level: value.log_level.unwrap_or(default.log_level),
            allow_provider_overriding: value
                .allow_provider_overriding
                .unwrap_or(default.allow_provider_overriding),
        }
    }
}

impl ContainerSettings {
    /// Reads settings from the optional [SETTINGS_FILE] and the environment.
    pub fn init_from_environment() -> Result<Self, Error> {
        Config::builder()
            .add_source(File::with_name(SETTINGS_FILE).required(false))
            .add_source(Environment::with_prefix(SETTINGS_ENV_PREFIX))
            .build()
            .and_then(|config| config.try_deserialize::<OptionalContainerSettings>())
            .map(|config| config.into())
            .map_err(|error| Error::Settings(error.to_string()))
    }

    pub fn with_tracing_logger(mut self, install_tracing_logger: bool) -> Self {
        self.install_tracing_logger = install_tracing_logger;
        self
    }

    pub fn with_log_level<L: Into<String>>(mut self, log_level: L) -> Self {
        self.log_level = log_level.into();
        self
    }

    pub fn with_provider_overriding(mut self, allow_provider_overriding: bool) -> Self {
        self.allow_provider_overriding = allow_provider_overriding;
        self
    }

    /// Installs a global `fmt` subscriber, if requested by these settings. An already installed
    /// subscriber is left intact.
    pub fn install_tracing_logger(&self) {
        if !self.install_tracing_logger {
            return;
        }

        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        if tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .is_err()
        {
            debug!("Tracing subscriber already installed.");
        }
    }
}

#[derive(Deserialize)]
struct OptionalContainerSettings {
    install_tracing_logger: Option<bool>,
    log_level: Option<String>,
    allow_provider_overriding: Option<bool>,
}
