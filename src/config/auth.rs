//! Authentication configuration

use serde::Deserialize;

use super::error::ValidationError;
use super::server::{split_list, Environment};

/// Thread token configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Accepted tokens (comma-separated); when unset any non-blank token passes
    pub tokens: Option<String>,
}

impl AuthConfig {
    /// Get the token allowlist as a vector
    pub fn tokens_list(&self) -> Vec<String> {
        split_list(self.tokens.as_deref())
    }

    /// Validate authentication configuration
    ///
    /// Production deployments must pin an allowlist.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if *environment == Environment::Production && self.tokens_list().is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__TOKENS"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_parsing() {
        let config = AuthConfig {
            tokens: Some("alpha, beta,,".to_string()),
        };
        assert_eq!(config.tokens_list(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_open_tokens_allowed_in_development() {
        assert!(AuthConfig::default().validate(&Environment::Development).is_ok());
    }

    #[test]
    fn test_production_requires_allowlist() {
        assert_eq!(
            AuthConfig::default().validate(&Environment::Production),
            Err(ValidationError::MissingRequired("AUTH__TOKENS"))
        );
        let pinned = AuthConfig {
            tokens: Some("alpha".to_string()),
        };
        assert!(pinned.validate(&Environment::Production).is_ok());
    }
}
