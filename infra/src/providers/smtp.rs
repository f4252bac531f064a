//! SMTP relays (Gmail, Outlook) through `lettre`

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;
use uuid::Uuid;

use af_core::domain::Channel;
use af_core::errors::ProviderError;
use af_core::services::{NotificationProvider, RenderedMessage};
use af_shared::utils::contact::mask_contact;

use super::{all_present, env_value, EmailSender};
use crate::InfrastructureError;

/// How the relay negotiates TLS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// Implicit TLS on port 465
    Tls,
    /// STARTTLS on port 587
    StartTls,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// Provider name used in logs and ordering overrides
    pub name: String,
    pub host: String,
    pub security: SmtpSecurity,
    pub username: String,
    pub password: String,
}

impl SmtpConfig {
    /// Gmail with an app password: `GMAIL_USER`, `GMAIL_APP_PASSWORD`
    pub fn gmail_from_env() -> Self {
        Self::gmail(env_value(&["GMAIL_USER"]), env_value(&["GMAIL_APP_PASSWORD"]))
    }

    /// Outlook / Microsoft 365: `OUTLOOK_USER`, `OUTLOOK_PASSWORD`
    pub fn outlook_from_env() -> Self {
        Self::outlook(env_value(&["OUTLOOK_USER"]), env_value(&["OUTLOOK_PASSWORD"]))
    }

    pub fn gmail(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: "gmail".to_string(),
            host: "smtp.gmail.com".to_string(),
            security: SmtpSecurity::Tls,
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn outlook(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: "outlook".to_string(),
            host: "smtp.office365.com".to_string(),
            security: SmtpSecurity::StartTls,
            username: username.into(),
            password: password.into(),
        }
    }

    fn has_credentials(&self) -> bool {
        all_present(&[&self.username, &self.password])
    }
}

pub struct SmtpProvider {
    config: SmtpConfig,
    sender: EmailSender,
    /// Built only when credentials are present
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpProvider {
    pub fn new(config: SmtpConfig, sender: EmailSender) -> Result<Self, InfrastructureError> {
        let transport = if config.has_credentials() {
            Some(build_transport(&config)?)
        } else {
            None
        };
        Ok(Self {
            config,
            sender,
            transport,
        })
    }

    /// The relay account sends the mail. Gmail rewrites any other From
    /// address, so the configured display name is kept with the account address.
    fn from_mailbox(&self) -> Result<Mailbox, ProviderError> {
        let address = self
            .config
            .username
            .parse()
            .map_err(|e| ProviderError::rejected(&self.config.name, format!("invalid sender: {}", e)))?;
        Ok(Mailbox::new(Some(self.sender.name.clone()), address))
    }

    fn build_message(&self, contact: &str, message: &RenderedMessage, message_id: &str) -> Result<Message, ProviderError> {
        let to: Mailbox = contact
            .parse()
            .map_err(|e| ProviderError::rejected(&self.config.name, format!("invalid recipient: {}", e)))?;

        Message::builder()
            .from(self.from_mailbox()?)
            .to(to)
            .subject(message.subject.clone())
            .message_id(Some(message_id.to_string()))
            .multipart(MultiPart::alternative_plain_html(
                message.text.clone(),
                message.html.clone(),
            ))
            .map_err(|e| ProviderError::rejected(&self.config.name, e))
    }
}

fn build_transport(config: &SmtpConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>, InfrastructureError> {
    let builder = match config.security {
        SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host),
        SmtpSecurity::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host),
    }
    .map_err(|e| InfrastructureError::Smtp(format!("{}: {}", config.name, e)))?;

    Ok(builder
        .credentials(Credentials::new(config.username.clone(), config.password.clone()))
        .build())
}

#[async_trait]
impl NotificationProvider for SmtpProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn supports(&self, channel: Channel) -> bool {
        channel == Channel::Email
    }

    fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    async fn send(&self, contact: &str, message: &RenderedMessage) -> Result<String, ProviderError> {
        let transport = self.transport.as_ref().ok_or_else(|| ProviderError::Unavailable {
            provider: self.config.name.clone(),
        })?;

        let message_id = format!("<{}@amusefit.smtp>", Uuid::new_v4());
        let email = self.build_message(contact, message, &message_id)?;

        debug!(provider = %self.config.name, contact = %mask_contact(contact), "Relaying email");
        let response = transport
            .send(email)
            .await
            .map_err(|e| ProviderError::transport(&self.config.name, e))?;

        if !response.is_positive() {
            let reply: Vec<&str> = response.message().collect();
            return Err(ProviderError::rejected(&self.config.name, reply.join(" ")));
        }
        Ok(message_id)
    }
}
