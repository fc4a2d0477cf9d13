//! Tool configuration: an optional TOML file plus environment overrides.

use std::path::Path;

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::aggregate::{DEFAULT_SEGMENT_FALLBACK, DEFAULT_TYPE_FALLBACK};
use crate::dates::Preset;
use crate::error::{OpsError, Result};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Label used for records without a segment value.
    pub segment_fallback: String,
    /// Label used for service requests without a type.
    pub type_fallback: String,
    pub default_preset: Preset,
    pub page_size: usize,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            segment_fallback: DEFAULT_SEGMENT_FALLBACK.to_string(),
            type_fallback: DEFAULT_TYPE_FALLBACK.to_string(),
            default_preset: Preset::ThisMonth,
            page_size: 20,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Loads `path` when given, otherwise defaults, then applies
    /// `SOLAR_OPS_*` environment overrides.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(fallback) = lookup("SOLAR_OPS_SEGMENT_FALLBACK") {
            self.segment_fallback = fallback;
        }
        if let Some(fallback) = lookup("SOLAR_OPS_TYPE_FALLBACK") {
            self.type_fallback = fallback;
        }
        if let Some(level) = lookup("SOLAR_OPS_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.segment_fallback.trim().is_empty() {
            return Err(OpsError::ConfigValue {
                field: "segment_fallback",
                reason: "must not be blank".to_string(),
            });
        }
        if self.type_fallback.trim().is_empty() {
            return Err(OpsError::ConfigValue {
                field: "type_fallback",
                reason: "must not be blank".to_string(),
            });
        }
        if self.page_size == 0 {
            return Err(OpsError::ConfigValue {
                field: "page_size",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl LoggingConfig {
    /// Installs the global subscriber. Logs go to stderr so command output on
    /// stdout stays clean. `RUST_LOG` overrides the configured level.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt()
                    .json()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
            _ => {
                fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "pretty".into(),
        }
    }
}
