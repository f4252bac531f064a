//! Verification code configuration module

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::env_or;

/// Lifetimes and limits applied to verification codes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerificationConfig {
    /// Lifetime of codes delivered by email, in seconds
    #[serde(default = "default_email_ttl")]
    pub email_ttl_secs: u64,

    /// Lifetime of codes delivered by SMS, in seconds
    #[serde(default = "default_sms_ttl")]
    pub sms_ttl_secs: u64,

    /// Failed attempts allowed before a code is revoked
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Minimum seconds between two codes for the same contact and purpose
    #[serde(default = "default_resend_cooldown")]
    pub resend_cooldown_secs: u64,

    /// Period of the background expiry sweep, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            email_ttl_secs: default_email_ttl(),
            sms_ttl_secs: default_sms_ttl(),
            max_attempts: default_max_attempts(),
            resend_cooldown_secs: default_resend_cooldown(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl VerificationConfig {
    /// Defaults overridden by `EMAIL_CODE_TTL_SECS`, `SMS_CODE_TTL_SECS`,
    /// `VERIFICATION_MAX_ATTEMPTS`, `VERIFICATION_RESEND_COOLDOWN_SECS` and
    /// `VERIFICATION_SWEEP_INTERVAL_SECS`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            email_ttl_secs: env_or("EMAIL_CODE_TTL_SECS", defaults.email_ttl_secs),
            sms_ttl_secs: env_or("SMS_CODE_TTL_SECS", defaults.sms_ttl_secs),
            max_attempts: env_or("VERIFICATION_MAX_ATTEMPTS", defaults.max_attempts),
            resend_cooldown_secs: env_or(
                "VERIFICATION_RESEND_COOLDOWN_SECS",
                defaults.resend_cooldown_secs,
            ),
            sweep_interval_secs: env_or(
                "VERIFICATION_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval_secs,
            )
            .max(1),
        }
    }

    pub fn email_ttl(&self) -> Duration {
        Duration::from_secs(self.email_ttl_secs)
    }

    pub fn sms_ttl(&self) -> Duration {
        Duration::from_secs(self.sms_ttl_secs)
    }

    pub fn resend_cooldown(&self) -> Duration {
        Duration::from_secs(self.resend_cooldown_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn default_email_ttl() -> u64 {
    600
}

fn default_sms_ttl() -> u64 {
    300
}

fn default_max_attempts() -> u32 {
    3
}

fn default_resend_cooldown() -> u64 {
    60
}

fn default_sweep_interval() -> u64 {
    600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_accessors() {
        let config = VerificationConfig::default();
        assert_eq!(config.email_ttl(), Duration::from_secs(600));
        assert_eq!(config.sms_ttl(), Duration::from_secs(300));
        assert_eq!(config.resend_cooldown(), Duration::from_secs(60));
        assert_eq!(config.sweep_interval(), Duration::from_secs(600));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: VerificationConfig = serde_json::from_str(r#"{"max_attempts": 5}"#).unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.email_ttl_secs, 600);
    }
}
