//! Conversation engine configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::conversation::CascadePolicy;

const MAX_TIMEOUT_MS: u64 = 60_000;

/// Turn processing limits and commit policy
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on classifying one message
    #[serde(default = "default_timeout_ms")]
    pub intent_timeout_ms: u64,

    /// Upper bound on a single catalog lookup
    #[serde(default = "default_timeout_ms")]
    pub lookup_timeout_ms: u64,

    /// Upper bound on a single conversation store call
    #[serde(default = "default_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Whether re-selecting the same value clears dependent slots
    #[serde(default)]
    pub cascade_policy: CascadePolicy,
}

impl EngineConfig {
    pub fn intent_timeout(&self) -> Duration {
        Duration::from_millis(self.intent_timeout_ms)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Validate engine configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.intent_timeout_ms == 0 || self.intent_timeout_ms > MAX_TIMEOUT_MS {
            return Err(ValidationError::InvalidIntentTimeout);
        }
        if self.lookup_timeout_ms == 0 || self.lookup_timeout_ms > MAX_TIMEOUT_MS {
            return Err(ValidationError::InvalidLookupTimeout);
        }
        if self.store_timeout_ms == 0 || self.store_timeout_ms > MAX_TIMEOUT_MS {
            return Err(ValidationError::InvalidStoreTimeout);
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            intent_timeout_ms: default_timeout_ms(),
            lookup_timeout_ms: default_timeout_ms(),
            store_timeout_ms: default_timeout_ms(),
            cascade_policy: CascadePolicy::default(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    2_000
}
