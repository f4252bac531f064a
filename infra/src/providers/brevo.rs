//! Brevo (formerly Sendinblue) transactional email API

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use af_core::domain::Channel;
use af_core::errors::ProviderError;
use af_core::services::{NotificationProvider, RenderedMessage};
use af_shared::utils::contact::mask_contact;

use super::http::{default_client, id_at, parse_json, read_success, trim_base};
use super::{all_present, env_value, EmailSender};

const NAME: &str = "brevo";
const DEFAULT_BASE_URL: &str = "https://api.brevo.com";

#[derive(Debug, Clone, Default)]
pub struct BrevoConfig {
    pub api_key: String,
}

impl BrevoConfig {
    /// Reads `BREVO_API_KEY`
    pub fn from_env() -> Self {
        Self {
            api_key: env_value(&["BREVO_API_KEY"]),
        }
    }
}

pub struct BrevoProvider {
    client: Client,
    config: BrevoConfig,
    sender: EmailSender,
    base_url: String,
}

impl BrevoProvider {
    pub fn new(config: BrevoConfig, sender: EmailSender) -> Self {
        Self::with_client(default_client(), config, sender)
    }

    pub fn with_client(client: Client, config: BrevoConfig, sender: EmailSender) -> Self {
        Self {
            client,
            config,
            sender,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base(base_url);
        self
    }
}

/// `{"messageId": "<...@smtp-relay.mailin.fr>"}`
fn parse_message_id(body: &str) -> Result<String, ProviderError> {
    let value = parse_json(NAME, body)?;
    id_at(NAME, &value, "/messageId")
}

#[async_trait]
impl NotificationProvider for BrevoProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn supports(&self, channel: Channel) -> bool {
        channel == Channel::Email
    }

    fn is_configured(&self) -> bool {
        all_present(&[&self.config.api_key])
    }

    async fn send(&self, contact: &str, message: &RenderedMessage) -> Result<String, ProviderError> {
        let payload = json!({
            "sender": { "name": self.sender.name, "email": self.sender.address },
            "to": [{ "email": contact }],
            "subject": message.subject,
            "htmlContent": message.html,
            "textContent": message.text,
        });

        debug!(provider = NAME, contact = %mask_contact(contact), "Sending email");
        let response = self
            .client
            .post(format!("{}/v3/smtp/email", self.base_url))
            .header("api-key", &self.config.api_key)
            .header("accept", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::transport(NAME, e))?;

        let body = read_success(NAME, response).await?;
        parse_message_id(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_id() {
        let id = parse_message_id(r#"{"messageId":"<202410161200.123@smtp-relay.mailin.fr>"}"#).unwrap();
        assert_eq!(id, "<202410161200.123@smtp-relay.mailin.fr>");
        assert!(parse_message_id(r#"{"code":"ok"}"#).is_err());
    }

    #[test]
    fn test_is_configured_requires_key() {
        let sender = EmailSender::default();
        assert!(!BrevoProvider::new(BrevoConfig::default(), sender.clone()).is_configured());
        let provider = BrevoProvider::new(BrevoConfig { api_key: "xkeysib-1".into() }, sender);
        assert!(provider.is_configured());
        assert!(provider.supports(Channel::Email));
        assert!(!provider.supports(Channel::Sms));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let provider = BrevoProvider::new(BrevoConfig { api_key: "k".into() }, EmailSender::default())
            .with_base_url("http://127.0.0.1:9");
        let message = RenderedMessage {
            subject: "s".into(),
            text: "123456".into(),
            html: "<p>123456</p>".into(),
        };
        assert!(matches!(
            provider.send("user@example.com", &message).await,
            Err(ProviderError::Transport { .. })
        ));
    }
}
