//! Notification provider interface

use async_trait::async_trait;

use crate::domain::entities::verification_code::Channel;
use crate::errors::ProviderError;

/// Message ready to hand to a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    /// Email subject; SMS providers ignore it
    pub subject: String,
    /// Plain-text body, also used as the SMS body
    pub text: String,
    /// HTML body for email providers
    pub html: String,
}

/// A single delivery route such as an email API or an SMS gateway.
///
/// Implementations include:
/// - HTTP email APIs (Brevo, Resend, SendGrid, Mailgun, EmailJS)
/// - SMTP relays (Gmail, Outlook)
/// - SMS gateways (Aligo, NHN Cloud, Twilio)
/// - The console fallback used in development
#[async_trait]
pub trait NotificationProvider: Send + Sync {
    /// Short stable identifier used in logs and ordering overrides
    fn name(&self) -> &str;

    /// Whether this provider can deliver on `channel`
    fn supports(&self, channel: Channel) -> bool;

    /// Whether all required credentials are present.
    ///
    /// Unconfigured providers are skipped without being called.
    fn is_configured(&self) -> bool {
        true
    }

    /// Send a message to a contact
    ///
    /// # Returns
    ///
    /// * `Ok(message_id)` - Provider-assigned identifier for the message
    /// * `Err(ProviderError)` - If the provider could not accept the message
    async fn send(&self, contact: &str, message: &RenderedMessage) -> Result<String, ProviderError>;
}
