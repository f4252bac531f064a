//! Configuration for the verification service

use std::time::Duration;

use af_shared::VerificationConfig;

use crate::domain::entities::verification_code::DEFAULT_MAX_ATTEMPTS;

/// Configuration for the verification service
#[derive(Debug, Clone)]
pub struct VerificationServiceConfig {
    /// Failed attempts allowed before the code is revoked
    pub max_attempts: u32,
    /// Minimum time between two codes for the same contact and purpose
    pub resend_cooldown: Duration,
}

impl Default for VerificationServiceConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            resend_cooldown: Duration::from_secs(60),
        }
    }
}

impl From<&VerificationConfig> for VerificationServiceConfig {
    fn from(config: &VerificationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            resend_cooldown: config.resend_cooldown(),
        }
    }
}
