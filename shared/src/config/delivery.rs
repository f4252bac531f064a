//! Notification delivery configuration module

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{env_flag, env_list, env_or, Environment};

/// Behaviour of the provider fallback chain
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeliveryConfig {
    /// Upper bound for a single provider call, in seconds
    pub provider_timeout_secs: u64,

    /// Log the rendered message to the console when every provider fails
    pub dev_fallback: bool,

    /// Provider names in priority order for email; `None` keeps the built-in order
    #[serde(default)]
    pub email_order: Option<Vec<String>>,

    /// Provider names in priority order for SMS; `None` keeps the built-in order
    #[serde(default)]
    pub sms_order: Option<Vec<String>>,

    /// Sender address used by email providers
    pub from_address: String,

    /// Sender display name used by email providers
    pub from_name: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl DeliveryConfig {
    pub fn for_environment(env: Environment) -> Self {
        Self {
            provider_timeout_secs: 8,
            dev_fallback: env.is_development(),
            email_order: None,
            sms_order: None,
            from_address: String::from("noreply@amusefit.co.kr"),
            from_name: String::from("AmuseFit"),
        }
    }

    /// Environment defaults overridden by `DELIVERY_PROVIDER_TIMEOUT_SECS`,
    /// `DELIVERY_DEV_FALLBACK`, `EMAIL_PROVIDER_ORDER`, `SMS_PROVIDER_ORDER`,
    /// `EMAIL_FROM_ADDRESS` and `EMAIL_FROM_NAME`
    pub fn from_env(env: Environment) -> Self {
        let defaults = Self::for_environment(env);
        Self {
            provider_timeout_secs: env_or(
                "DELIVERY_PROVIDER_TIMEOUT_SECS",
                defaults.provider_timeout_secs,
            )
            .max(1),
            dev_fallback: env_flag("DELIVERY_DEV_FALLBACK", defaults.dev_fallback),
            email_order: env_list("EMAIL_PROVIDER_ORDER").or(defaults.email_order),
            sms_order: env_list("SMS_PROVIDER_ORDER").or(defaults.sms_order),
            from_address: std::env::var("EMAIL_FROM_ADDRESS").unwrap_or(defaults.from_address),
            from_name: std::env::var("EMAIL_FROM_NAME").unwrap_or(defaults.from_name),
        }
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_fallback_only_in_development() {
        assert!(DeliveryConfig::for_environment(Environment::Development).dev_fallback);
        assert!(!DeliveryConfig::for_environment(Environment::Staging).dev_fallback);
        assert!(!DeliveryConfig::for_environment(Environment::Production).dev_fallback);
    }

    #[test]
    fn test_provider_timeout() {
        let config = DeliveryConfig::default();
        assert_eq!(config.provider_timeout(), Duration::from_secs(8));
    }
}
