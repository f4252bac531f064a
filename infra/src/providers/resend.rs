//! Resend email API

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use af_core::domain::Channel;
use af_core::errors::ProviderError;
use af_core::services::{NotificationProvider, RenderedMessage};

use super::http::{default_client, id_at, parse_json, read_success, trim_base};
use super::{all_present, env_value, EmailSender};

const NAME: &str = "resend";
const DEFAULT_BASE_URL: &str = "https://api.resend.com";

#[derive(Debug, Clone, Default)]
pub struct ResendConfig {
    pub api_key: String,
}

impl ResendConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env_value(&["RESEND_API_KEY"]),
        }
    }
}

pub struct ResendProvider {
    client: Client,
    config: ResendConfig,
    sender: EmailSender,
    base_url: String,
}

impl ResendProvider {
    pub fn new(config: ResendConfig, sender: EmailSender) -> Self {
        Self::with_client(default_client(), config, sender)
    }

    pub fn with_client(client: Client, config: ResendConfig, sender: EmailSender) -> Self {
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

fn parse_message_id(body: &str) -> Result<String, ProviderError> {
    let value = parse_json(NAME, body)?;
    id_at(NAME, &value, "/id")
}

#[async_trait]
impl NotificationProvider for ResendProvider {
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
            "from": self.sender.mailbox(),
            "to": [contact],
            "subject": message.subject,
            "html": message.html,
            "text": message.text,
        });

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.config.api_key)
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
        assert_eq!(
            parse_message_id(r#"{"id":"49a3999c-0ce1-4ea6-ab68-afcd6dc2e794"}"#).unwrap(),
            "49a3999c-0ce1-4ea6-ab68-afcd6dc2e794"
        );
        assert!(matches!(
            parse_message_id("{}"),
            Err(ProviderError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_blank_key_is_unconfigured() {
        let provider = ResendProvider::new(ResendConfig { api_key: "  ".into() }, EmailSender::default());
        assert!(!provider.is_configured());
    }
}
