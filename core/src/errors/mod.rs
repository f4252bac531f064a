//! Domain-specific error types and error handling.

mod types;

// Re-export all error types
pub use types::{AttemptOutcome, DeliveryError, ProviderAttempt, ProviderError, StoreError};

use thiserror::Error;

use crate::domain::Channel;

/// Core domain errors (general purpose)
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Malformed email address or phone number for the channel
    #[error("Invalid {channel} contact")]
    InvalidContact { channel: Channel },

    #[error("Please wait {retry_after_secs} seconds before requesting a new code")]
    ResendCooldown { retry_after_secs: u64 },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation { .. } => "VALIDATION_ERROR",
            DomainError::InvalidContact { channel: Channel::Email } => "INVALID_EMAIL",
            DomainError::InvalidContact { channel: Channel::Sms } => "INVALID_PHONE",
            DomainError::ResendCooldown { .. } => "RESEND_COOLDOWN",
            DomainError::Internal { .. } => "INTERNAL_ERROR",
            DomainError::Store(_) => "STORE_UNAVAILABLE",
            DomainError::Delivery(_) => "DELIVERY_FAILED",
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(DomainError::validation("bad").code(), "VALIDATION_ERROR");
        assert_eq!(DomainError::InvalidContact { channel: Channel::Email }.code(), "INVALID_EMAIL");
        assert_eq!(DomainError::InvalidContact { channel: Channel::Sms }.code(), "INVALID_PHONE");
        assert_eq!(
            DomainError::ResendCooldown { retry_after_secs: 12 }.to_string(),
            "Please wait 12 seconds before requesting a new code"
        );

        let err: DomainError = DeliveryError::AllProvidersFailed {
            channel: Channel::Sms,
            attempts: Vec::new(),
        }
        .into();
        assert_eq!(err.code(), "DELIVERY_FAILED");
    }

    #[test]
    fn test_store_error_is_transparent() {
        let err: DomainError = StoreError::Backend("connection refused".to_string()).into();
        assert_eq!(err.to_string(), "Verification store unavailable: connection refused");
    }
}
