//! Ordered provider fallback for verification messages

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use af_shared::utils::contact::mask_contact;
use af_shared::Language;

use crate::domain::entities::verification_code::{Channel, Purpose};
use crate::errors::{DeliveryError, ProviderAttempt, ProviderError};

use super::provider::{NotificationProvider, RenderedMessage};
use super::templates::MessageTemplates;

/// Outcome of a successful dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Name of the provider that accepted the message
    pub provider_used: String,
    pub message_id: String,
    /// Every provider considered, in order, including the one that succeeded
    pub attempts: Vec<ProviderAttempt>,
    /// Whether the development fallback delivered the message
    pub fallback_used: bool,
}

/// Delivers verification messages through the first working provider.
///
/// Providers are tried strictly in the order they were added. Each call is
/// bounded by `provider_timeout`. The fallback provider, when set, is used
/// only after every regular provider for the channel has been skipped or
/// has failed.
pub struct DeliveryDispatcher {
    email: Vec<Arc<dyn NotificationProvider>>,
    sms: Vec<Arc<dyn NotificationProvider>>,
    fallback: Option<Arc<dyn NotificationProvider>>,
    templates: MessageTemplates,
    provider_timeout: Duration,
}

impl DeliveryDispatcher {
    pub fn new(provider_timeout: Duration) -> Self {
        Self {
            email: Vec::new(),
            sms: Vec::new(),
            fallback: None,
            templates: MessageTemplates::default(),
            provider_timeout,
        }
    }

    /// Append a provider to the chain of every channel it supports
    pub fn with_provider(mut self, provider: Arc<dyn NotificationProvider>) -> Self {
        if provider.supports(Channel::Email) {
            self.email.push(provider.clone());
        }
        if provider.supports(Channel::Sms) {
            self.sms.push(provider);
        }
        self
    }

    /// Append a provider to one channel's chain only
    pub fn with_provider_for(mut self, channel: Channel, provider: Arc<dyn NotificationProvider>) -> Self {
        match channel {
            Channel::Email => self.email.push(provider),
            Channel::Sms => self.sms.push(provider),
        }
        self
    }

    pub fn with_fallback(mut self, provider: Arc<dyn NotificationProvider>) -> Self {
        self.fallback = Some(provider);
        self
    }

    pub fn with_templates(mut self, templates: MessageTemplates) -> Self {
        self.templates = templates;
        self
    }

    pub fn providers(&self, channel: Channel) -> &[Arc<dyn NotificationProvider>] {
        match channel {
            Channel::Email => &self.email,
            Channel::Sms => &self.sms,
        }
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Names of providers with credentials, in priority order
    pub fn configured_providers(&self, channel: Channel) -> Vec<String> {
        self.providers(channel)
            .iter()
            .filter(|provider| provider.is_configured())
            .map(|provider| provider.name().to_string())
            .collect()
    }

    /// Render the verification message for `code` and deliver it
    pub async fn dispatch(
        &self,
        contact: &str,
        code: &str,
        purpose: Purpose,
        channel: Channel,
        ttl: Duration,
        language: Language,
    ) -> Result<DispatchReport, DeliveryError> {
        let message = self.templates.render(code, purpose, channel, ttl, language);
        self.deliver(contact, channel, &message).await
    }

    /// Deliver an already rendered message
    pub async fn deliver(
        &self,
        contact: &str,
        channel: Channel,
        message: &RenderedMessage,
    ) -> Result<DispatchReport, DeliveryError> {
        let masked = mask_contact(contact);
        if self.providers(channel).is_empty() && self.fallback.is_none() {
            error!(channel = %channel, contact = %masked, event = "delivery_failed", "No provider registered for channel");
            return Err(DeliveryError::NoProviders { channel });
        }

        let mut attempts = Vec::new();

        for provider in self.providers(channel) {
            if !provider.is_configured() {
                debug!(provider = provider.name(), channel = %channel, "Skipping unconfigured provider");
                attempts.push(ProviderAttempt::skipped(provider.name()));
                continue;
            }

            match self.send_with_timeout(provider.as_ref(), contact, message).await {
                Ok(message_id) => {
                    info!(
                        provider = provider.name(),
                        channel = %channel,
                        contact = %masked,
                        message_id = %message_id,
                        event = "message_delivered",
                        "Verification message delivered"
                    );
                    attempts.push(ProviderAttempt::delivered(provider.name(), message_id.clone()));
                    return Ok(DispatchReport {
                        provider_used: provider.name().to_string(),
                        message_id,
                        attempts,
                        fallback_used: false,
                    });
                }
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        channel = %channel,
                        contact = %masked,
                        error = %e,
                        event = "provider_failed",
                        "Provider failed, trying the next one"
                    );
                    attempts.push(ProviderAttempt::failed(&e));
                }
            }
        }

        if let Some(fallback) = &self.fallback {
            warn!(
                channel = %channel,
                contact = %masked,
                provider = fallback.name(),
                event = "dev_fallback",
                "No provider delivered the message, using development fallback"
            );
            match self.send_with_timeout(fallback.as_ref(), contact, message).await {
                Ok(message_id) => {
                    attempts.push(ProviderAttempt::delivered(fallback.name(), message_id.clone()));
                    return Ok(DispatchReport {
                        provider_used: fallback.name().to_string(),
                        message_id,
                        attempts,
                        fallback_used: true,
                    });
                }
                Err(e) => attempts.push(ProviderAttempt::failed(&e)),
            }
        }

        error!(
            channel = %channel,
            contact = %masked,
            attempted = attempts.iter().filter(|a| a.was_called()).count(),
            event = "delivery_failed",
            "All providers failed to deliver the verification message"
        );
        Err(DeliveryError::AllProvidersFailed { channel, attempts })
    }

    async fn send_with_timeout(
        &self,
        provider: &dyn NotificationProvider,
        contact: &str,
        message: &RenderedMessage,
    ) -> Result<String, ProviderError> {
        match tokio::time::timeout(self.provider_timeout, provider.send(contact, message)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                provider: provider.name().to_string(),
                timeout_ms: self.provider_timeout.as_millis() as u64,
            }),
        }
    }
}
