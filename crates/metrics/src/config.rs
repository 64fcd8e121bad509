//! Exporter configuration, loaded from TOML.
//!
//! ```toml
//! namespace = "myapp"
//! subsystem = "db"
//! flush_interval_secs = 15
//! on_conflict = "skip"
//! ```

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

/// What the exporter does when the target registry rejects a gauge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Abort the export and return the error to the caller.
    #[default]
    Fail,
    /// Log once per key and keep exporting the remaining gauges.
    Skip,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Prefix of every exported gauge. Sanitized before use.
    pub namespace: String,
    /// Second prefix, after the namespace. Sanitized before use.
    pub subsystem: String,
    pub flush_interval_secs: u64,
    pub on_conflict: ConflictPolicy,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            subsystem: String::new(),
            flush_interval_secs: 60,
            on_conflict: ConflictPolicy::default(),
        }
    }
}

impl ExporterConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "flush_interval_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }
}
