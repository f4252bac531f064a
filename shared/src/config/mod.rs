//! Configuration module with business-specific sub-modules
//!
//! - `cache` - verification store backend (memory / Redis)
//! - `delivery` - notification provider chain behaviour
//! - `environment` - environment detection and logging configuration
//! - `server` - HTTP server and CORS configuration
//! - `verification` - code lifetimes, attempt ceiling, cooldown and sweep

pub mod cache;
pub mod delivery;
pub mod environment;
pub mod server;
pub mod verification;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub use cache::{CacheConfig, StoreBackend};
pub use delivery::DeliveryConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use server::{CorsConfig, ServerConfig};
pub use verification::VerificationConfig;

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    pub verification: VerificationConfig,
    pub delivery: DeliveryConfig,
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl AppConfig {
    /// Defaults for an environment, without reading any variables
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            server: ServerConfig::default(),
            cors: CorsConfig::for_environment(environment),
            verification: VerificationConfig::default(),
            delivery: DeliveryConfig::for_environment(environment),
            cache: CacheConfig::default(),
            logging: LoggingConfig::for_environment(environment),
        }
    }

    /// Create configuration for development environment
    pub fn development() -> Self {
        Self::for_environment(Environment::Development)
    }

    /// Create configuration for production environment
    pub fn production() -> Self {
        let mut config = Self::for_environment(Environment::Production);
        config.server = ServerConfig::new("0.0.0.0", 8080);
        config
    }

    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables keep the environment's default.
    pub fn from_env() -> Self {
        let environment = Environment::from_env();
        Self {
            environment,
            server: ServerConfig::from_env(),
            cors: CorsConfig::from_env(environment),
            verification: VerificationConfig::from_env(),
            delivery: DeliveryConfig::from_env(environment),
            cache: CacheConfig::from_env(),
            logging: LoggingConfig::from_env(environment),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }

    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }
}

/// Read and parse an environment variable, falling back to `default`
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a boolean flag accepting `1/0`, `true/false`, `yes/no`, `on/off`
pub(crate) fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Read a comma-separated list, dropping empty entries
pub(crate) fn env_list(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|value| {
        value
            .split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_defaults_disable_dev_fallback() {
        let config = AppConfig::production();
        assert!(config.is_production());
        assert!(!config.delivery.dev_fallback);
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_development_defaults() {
        let config = AppConfig::development();
        assert!(config.is_development());
        assert!(config.delivery.dev_fallback);
        assert_eq!(config.verification.email_ttl_secs, 600);
        assert_eq!(config.verification.sms_ttl_secs, 300);
        assert_eq!(config.verification.max_attempts, 3);
    }

    #[test]
    fn test_env_helpers_fall_back_on_missing_keys() {
        assert_eq!(env_or("AF_TEST_SURELY_UNSET_NUMBER", 42u64), 42);
        assert!(env_flag("AF_TEST_SURELY_UNSET_FLAG", true));
        assert!(env_list("AF_TEST_SURELY_UNSET_LIST").is_none());
    }
}
