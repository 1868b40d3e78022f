//! Application configuration module
//!
//! Configuration is read from environment variables (and a `.env` file when
//! present) using the `config` and `dotenvy` crates. Variables carry the
//! `SLOT_BOOKING` prefix and nested values are separated by `__`.
//!
//! # Example
//!
//! ```no_run
//! use slot_booking::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod engine;
mod error;
mod redis;
mod server;
mod storage;

pub use auth::AuthConfig;
pub use engine::EngineConfig;
pub use error::{ConfigError, ValidationError};
pub use redis::RedisConfig;
pub use server::{Environment, LogFormat, ServerConfig};
pub use storage::{StorageBackend, StorageConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a runnable
/// development server backed by in-memory storage.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Turn processing timeouts and cascade policy
    #[serde(default)]
    pub engine: EngineConfig,

    /// Conversation store selection
    #[serde(default)]
    pub storage: StorageConfig,

    /// Redis connection, only read when `storage.backend = redis`
    pub redis: Option<RedisConfig>,

    /// Thread token allowlist
    #[serde(default)]
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variable Format
    ///
    /// - `SLOT_BOOKING__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `SLOT_BOOKING__STORAGE__BACKEND=redis` -> `storage.backend = redis`
    /// - `SLOT_BOOKING__ENGINE__CASCADE_POLICY=on_change`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SLOT_BOOKING")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid, or
    /// if the Redis backend is selected without a Redis section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.engine.validate()?;
        self.storage.validate()?;
        if self.storage.backend == StorageBackend::Redis {
            self.redis
                .as_ref()
                .ok_or(ValidationError::MissingRequired("REDIS__URL"))?
                .validate()?;
        }
        self.auth.validate(&self.server.environment)?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::CascadePolicy;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "SLOT_BOOKING__SERVER__PORT",
        "SLOT_BOOKING__SERVER__ENVIRONMENT",
        "SLOT_BOOKING__ENGINE__LOOKUP_TIMEOUT_MS",
        "SLOT_BOOKING__ENGINE__CASCADE_POLICY",
        "SLOT_BOOKING__STORAGE__BACKEND",
        "SLOT_BOOKING__STORAGE__FILE_PATH",
        "SLOT_BOOKING__REDIS__URL",
        "SLOT_BOOKING__AUTH__TOKENS",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn load_with(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        clear_env();
        for (key, value) in vars {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        clear_env();
        result
    }

    #[test]
    fn test_load_with_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[]).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.engine.lookup_timeout_ms, 2_000);
        assert!(config.redis.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_engine_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[
            ("SLOT_BOOKING__ENGINE__LOOKUP_TIMEOUT_MS", "500"),
            ("SLOT_BOOKING__ENGINE__CASCADE_POLICY", "on_change"),
        ])
        .unwrap();

        assert_eq!(config.engine.lookup_timeout_ms, 500);
        assert_eq!(config.engine.cascade_policy, CascadePolicy::OnChange);
    }

    #[test]
    fn test_custom_server_port() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[("SLOT_BOOKING__SERVER__PORT", "3000")]).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_redis_backend_requires_redis_section() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[("SLOT_BOOKING__STORAGE__BACKEND", "redis")]).unwrap();
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("REDIS__URL"))
        );

        let config = load_with(&[
            ("SLOT_BOOKING__STORAGE__BACKEND", "redis"),
            ("SLOT_BOOKING__REDIS__URL", "redis://localhost:6379"),
        ])
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_requires_token_allowlist() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[("SLOT_BOOKING__SERVER__ENVIRONMENT", "production")]).unwrap();
        assert!(config.is_production());
        assert!(config.validate().is_err());

        let config = load_with(&[
            ("SLOT_BOOKING__SERVER__ENVIRONMENT", "production"),
            ("SLOT_BOOKING__AUTH__TOKENS", "alpha,beta"),
        ])
        .unwrap();
        assert!(config.validate().is_ok());
    }
}
