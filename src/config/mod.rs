#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

use crate::utils::error::ConfigError;
use crate::utils::validation::{
    validate_database_url, validate_non_empty_string, validate_range, validate_url, Validate,
};
use std::env;
use std::time::Duration;

pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 5_000;
const MAX_CALL_TIMEOUT_MS: u64 = 60_000;

/// Settings handed to constructors. Nothing in the crate reads the
/// environment except [`EngineConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub venue_api_root: Option<String>,
    pub table_api_root: Option<String>,
    pub database_url: Option<String>,
    pub cors_origin: Option<String>,
    pub auth_domain: Option<String>,
    pub auth_audience: Option<String>,
    pub call_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            venue_api_root: None,
            table_api_root: None,
            database_url: None,
            cors_origin: None,
            auth_domain: None,
            auth_audience: None,
            call_timeout: Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let optional = |key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty());

        let call_timeout = match optional("BOOKING_CALL_TIMEOUT_MS") {
            Some(raw) => {
                let ms = raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                    field: "BOOKING_CALL_TIMEOUT_MS".to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
                Duration::from_millis(ms)
            }
            None => Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS),
        };

        Ok(Self {
            venue_api_root: optional("VENUE_API_ROOT"),
            table_api_root: optional("TABLE_API_ROOT"),
            database_url: optional("DATABASE_URL"),
            cors_origin: optional("ALLOW_ORIGIN"),
            auth_domain: optional("AUTH0_DOMAIN"),
            auth_audience: optional("AUTH0_AUDIENCE"),
            call_timeout,
        })
    }
}

impl Validate for EngineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(root) = &self.venue_api_root {
            validate_url("venue_api_root", root)?;
        }
        if let Some(root) = &self.table_api_root {
            validate_url("table_api_root", root)?;
        }
        if let Some(url) = &self.database_url {
            validate_database_url("database_url", url)?;
        }
        if let Some(origin) = &self.cors_origin {
            if origin != "*" {
                validate_url("cors_origin", origin)?;
            }
        }

        // Token validation needs both halves or neither.
        match (&self.auth_domain, &self.auth_audience) {
            (Some(domain), Some(audience)) => {
                validate_non_empty_string("auth_domain", domain)?;
                validate_non_empty_string("auth_audience", audience)?;
            }
            (None, None) => {}
            (Some(_), None) => {
                return Err(ConfigError::Missing {
                    field: "auth_audience".to_string(),
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::Missing {
                    field: "auth_domain".to_string(),
                })
            }
        }

        validate_range(
            "call_timeout_ms",
            self.call_timeout.as_millis() as u64,
            1,
            MAX_CALL_TIMEOUT_MS,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_auth_requires_both_fields() {
        let config = EngineConfig {
            auth_domain: Some("https://booking.eu.auth0.com/".to_string()),
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing { field }) if field == "auth_audience"
        ));
    }

    #[test]
    fn test_rejects_bad_roots_and_timeouts() {
        let config = EngineConfig {
            table_api_root: Some("not a url".to_string()),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            call_timeout: Duration::ZERO,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
