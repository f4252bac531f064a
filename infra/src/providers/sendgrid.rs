//! SendGrid v3 mail API
//!
//! SendGrid answers `202 Accepted` with an empty body; the message id comes
//! from the `X-Message-Id` response header.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use af_core::domain::Channel;
use af_core::errors::ProviderError;
use af_core::services::{NotificationProvider, RenderedMessage};

use super::http::{default_client, read_success, trim_base};
use super::{all_present, env_value, EmailSender};

const NAME: &str = "sendgrid";
const DEFAULT_BASE_URL: &str = "https://api.sendgrid.com";

#[derive(Debug, Clone, Default)]
pub struct SendGridConfig {
    pub api_key: String,
}

impl SendGridConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env_value(&["SENDGRID_API_KEY"]),
        }
    }
}

pub struct SendGridProvider {
    client: Client,
    config: SendGridConfig,
    sender: EmailSender,
    base_url: String,
}

impl SendGridProvider {
    pub fn new(config: SendGridConfig, sender: EmailSender) -> Self {
        Self::with_client(default_client(), config, sender)
    }

    pub fn with_client(client: Client, config: SendGridConfig, sender: EmailSender) -> Self {
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

    fn payload(&self, contact: &str, message: &RenderedMessage) -> serde_json::Value {
        json!({
            "personalizations": [{ "to": [{ "email": contact }] }],
            "from": { "email": self.sender.address, "name": self.sender.name },
            "subject": message.subject,
            "content": [
                { "type": "text/plain", "value": message.text },
                { "type": "text/html", "value": message.html },
            ],
        })
    }
}

#[async_trait]
impl NotificationProvider for SendGridProvider {
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
        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&self.payload(contact, message))
            .send()
            .await
            .map_err(|e| ProviderError::transport(NAME, e))?;

        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        read_success(NAME, response).await?;

        Ok(message_id.unwrap_or_else(|| {
            debug!(provider = NAME, "Accepted without X-Message-Id header");
            format!("{}-{}", NAME, Uuid::new_v4())
        }))
    }
}
