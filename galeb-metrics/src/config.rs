use bridge::config::{Config as BridgeConfig, ValidationError};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set.
    pub level: String,
    pub sentry_dsn: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".into(),
            sentry_dsn: None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(flatten)]
    pub bridge: BridgeConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    /// Loads the file if given, applies environment overrides and validates.
    pub fn load<F>(path: Option<&Path>, lookup_env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.bridge.apply_env_overrides(lookup_env)?;
        config.bridge.validate()?;

        Ok(config)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    ValidationError(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn full_config() {
        let yaml = r#"
            statsd:
                host: statsd.internal
                port: 8126
                prefix: lb
            listener:
                host: 0.0.0.0
                port: 8080
            admin_listener:
                host: 0.0.0.0
                port: 8081
            logging:
                level: debug
                sentry_dsn: https://key@sentry.example.com/1
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::load(Some(tmp.path()), no_env).expect("load config");

        assert_eq!(config.bridge.statsd.host, "statsd.internal");
        assert_eq!(config.bridge.statsd.port, 8126);
        assert_eq!(config.bridge.statsd.prefix, "lb");
        assert_eq!(config.bridge.listener.port, 8080);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.sentry_dsn.is_some());
    }

    #[test]
    fn defaults_without_file() {
        let config = Config::load(None, no_env).expect("default config");
        assert_eq!(config, Config::default());
        assert_eq!(config.bridge.statsd.port, 8125);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn env_overrides_file() {
        let tmp = write_tmp_file("statsd:\n  prefix: lb\n");
        let config = Config::load(Some(tmp.path()), |name| {
            (name == bridge::config::ENV_STATSD_PREFIX).then(|| "galeb_staging".to_string())
        })
        .expect("load config");
        assert_eq!(config.bridge.statsd.prefix, "galeb_staging");
    }

    #[test]
    fn invalid_config() {
        let tmp = write_tmp_file("listener:\n  host: 0.0.0.0\n  port: 0\n");
        assert!(matches!(
            Config::load(Some(tmp.path()), no_env),
            Err(ConfigError::ValidationError(ValidationError::InvalidPort))
        ));

        assert!(matches!(
            Config::load(Some(Path::new("/nonexistent/galeb.yaml")), no_env),
            Err(ConfigError::LoadError(_))
        ));
    }
}
