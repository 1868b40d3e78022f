//! Redis connection settings for the shared conversation store

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Read only when `storage.backend = redis`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// `redis://` or `rediss://` URL
    pub url: String,

    /// Budget for establishing the connection at startup
    pub connect_timeout_secs: u64,

    /// Keys are `{key_prefix}:{thread_id}`
    pub key_prefix: String,
}

impl RedisConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("REDIS__URL"));
        }
        let scheme_ok = ["redis://", "rediss://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme));
        if !scheme_ok {
            return Err(ValidationError::InvalidRedisUrl);
        }
        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            connect_timeout_secs: 5,
            key_prefix: "slot_booking:conversation".to_string(),
        }
    }
}
