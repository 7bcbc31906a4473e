use serde::Deserialize;
use thiserror::Error;

pub const ENV_STATSD_HOST: &str = "GALEB_STATSD_HOST";
pub const ENV_STATSD_PORT: &str = "GALEB_STATSD_PORT";
pub const ENV_STATSD_PREFIX: &str = "GALEB_STATSD_PREFIX";

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Empty statsd host")]
    EmptyStatsdHost,

    #[error("Invalid value for {name}: {value}")]
    InvalidOverride { name: &'static str, value: String },
}

/// Statsd collector the bridge reports to.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatsdConfig {
    pub host: String,
    pub port: u16,
    /// Prepended to every metric name.
    pub prefix: String,
}

impl Default for StatsdConfig {
    fn default() -> Self {
        StatsdConfig {
            host: "127.0.0.1".into(),
            port: 8125,
            prefix: "galeb".into(),
        }
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

fn default_listener() -> Listener {
    Listener {
        host: "127.0.0.1".into(),
        port: 9080,
    }
}

fn default_admin_listener() -> Listener {
    Listener {
        host: "127.0.0.1".into(),
        port: 9081,
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub statsd: StatsdConfig,
    /// Ingest endpoint for snapshots and change events
    #[serde(default = "default_listener")]
    pub listener: Listener,
    /// Health and readiness endpoints
    #[serde(default = "default_admin_listener")]
    pub admin_listener: Listener,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            statsd: StatsdConfig::default(),
            listener: default_listener(),
            admin_listener: default_admin_listener(),
        }
    }
}

impl Config {
    /// Overrides the statsd settings with the `GALEB_STATSD_*` variables found by `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_STATSD_HOST) {
            self.statsd.host = host;
        }
        if let Some(port) = lookup(ENV_STATSD_PORT) {
            self.statsd.port = port.parse().map_err(|_| ValidationError::InvalidOverride {
                name: ENV_STATSD_PORT,
                value: port.clone(),
            })?;
        }
        if let Some(prefix) = lookup(ENV_STATSD_PREFIX) {
            self.statsd.prefix = prefix;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.statsd.host.is_empty() {
            return Err(ValidationError::EmptyStatsdHost);
        }
        if self.statsd.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}
