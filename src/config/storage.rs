//! Conversation storage configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// One year; keeps expiry cutoffs well inside the timestamp range.
const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Where conversation state is kept between turns
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
    Redis,
}

/// Conversation storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory for the file backend
    #[serde(default = "default_file_path")]
    pub file_path: String,

    /// Idle conversations older than this are dropped (0 keeps them forever)
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    /// How often idle locks and expired in-memory conversations are swept
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl StorageConfig {
    /// Conversation time-to-live, `None` when expiry is disabled
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == StorageBackend::File && self.file_path.trim().is_empty() {
            return Err(ValidationError::InvalidFilePath);
        }
        if self.ttl_secs > MAX_TTL_SECS {
            return Err(ValidationError::InvalidTtl);
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            file_path: default_file_path(),
            ttl_secs: default_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_file_path() -> String {
    "./data/conversations".to_string()
}

fn default_ttl() -> u64 {
    86_400
}

fn default_sweep_interval() -> u64 {
    300
}
