//! Error types for the verification store and the notification providers

use thiserror::Error;

use crate::domain::Channel;

/// Provider error bodies are truncated to this many characters before logging
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Failures of the verification record store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Verification store unavailable: {0}")]
    Backend(String),

    #[error("Verification record could not be (de)serialized: {0}")]
    Serialization(String),

    #[error("Verification record {key} kept changing, gave up after {retries} retries")]
    Contention { key: String, retries: u32 },
}

/// A single provider's failure to deliver a message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{provider} is not configured")]
    Unavailable { provider: String },

    #[error("{provider} responded with HTTP {status}: {body}")]
    Http {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} request failed: {message}")]
    Transport { provider: String, message: String },

    #[error("{provider} returned an unexpected response: {message}")]
    MalformedResponse { provider: String, message: String },

    #[error("{provider} rejected the message: {message}")]
    Rejected { provider: String, message: String },

    #[error("{provider} did not answer within {timeout_ms} ms")]
    Timeout { provider: String, timeout_ms: u64 },
}

impl ProviderError {
    /// Non-2xx response; the body is truncated
    pub fn http(provider: impl Into<String>, status: u16, body: &str) -> Self {
        ProviderError::Http {
            provider: provider.into(),
            status,
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        }
    }

    pub fn transport(provider: impl Into<String>, message: impl ToString) -> Self {
        ProviderError::Transport {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    pub fn malformed(provider: impl Into<String>, message: impl ToString) -> Self {
        ProviderError::MalformedResponse {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    pub fn rejected(provider: impl Into<String>, message: impl ToString) -> Self {
        ProviderError::Rejected {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    pub fn provider(&self) -> &str {
        match self {
            ProviderError::Unavailable { provider }
            | ProviderError::Http { provider, .. }
            | ProviderError::Transport { provider, .. }
            | ProviderError::MalformedResponse { provider, .. }
            | ProviderError::Rejected { provider, .. }
            | ProviderError::Timeout { provider, .. } => provider,
        }
    }
}

/// What happened when the dispatcher reached a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Delivered { message_id: String },
    /// Not configured, never called
    Skipped,
    Failed { reason: String },
}

/// One step of a dispatch, in the order tried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAttempt {
    pub provider: String,
    pub outcome: AttemptOutcome,
}

impl ProviderAttempt {
    pub fn delivered(provider: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            outcome: AttemptOutcome::Delivered {
                message_id: message_id.into(),
            },
        }
    }

    pub fn skipped(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            outcome: AttemptOutcome::Skipped,
        }
    }

    pub fn failed(error: &ProviderError) -> Self {
        Self {
            provider: error.provider().to_string(),
            outcome: AttemptOutcome::Failed {
                reason: error.to_string(),
            },
        }
    }

    pub fn was_called(&self) -> bool {
        !matches!(self.outcome, AttemptOutcome::Skipped)
    }
}

/// Delivery failed on every route
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("All {channel} providers failed")]
    AllProvidersFailed {
        channel: Channel,
        attempts: Vec<ProviderAttempt>,
    },

    #[error("No {channel} provider is registered")]
    NoProviders { channel: Channel },
}

impl DeliveryError {
    pub fn attempts(&self) -> &[ProviderAttempt] {
        match self {
            DeliveryError::AllProvidersFailed { attempts, .. } => attempts,
            DeliveryError::NoProviders { .. } => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_body_is_truncated() {
        let body = "x".repeat(2000);
        match ProviderError::http("brevo", 500, &body) {
            ProviderError::Http { body, status, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), MAX_ERROR_BODY_CHARS);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_all_providers_failed_keeps_attempts() {
        let err = DeliveryError::AllProvidersFailed {
            channel: Channel::Email,
            attempts: vec![
                ProviderAttempt::skipped("brevo"),
                ProviderAttempt::failed(&ProviderError::Timeout {
                    provider: "resend".to_string(),
                    timeout_ms: 8000,
                }),
            ],
        };
        assert_eq!(err.to_string(), "All email providers failed");
        assert_eq!(err.attempts().len(), 2);
        assert_eq!(err.attempts().iter().filter(|a| a.was_called()).count(), 1);
    }

    #[test]
    fn test_no_providers_has_no_attempts() {
        let err = DeliveryError::NoProviders { channel: Channel::Sms };
        assert_eq!(err.to_string(), "No sms provider is registered");
        assert!(err.attempts().is_empty());
    }
}
