//! EmailJS REST API
//!
//! EmailJS renders its own template; the message parts are passed as
//! template parameters. A successful call answers `200 OK` with a plain-text
//! body and no message id, so one is generated locally.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

use af_core::domain::Channel;
use af_core::errors::ProviderError;
use af_core::services::{NotificationProvider, RenderedMessage};

use super::http::{default_client, read_success, trim_base};
use super::{all_present, env_value, EmailSender};

const NAME: &str = "emailjs";
const DEFAULT_BASE_URL: &str = "https://api.emailjs.com";

#[derive(Debug, Clone, Default)]
pub struct EmailJsConfig {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    /// Required when the account enforces strict mode
    pub private_key: Option<String>,
}

impl EmailJsConfig {
    pub fn from_env() -> Self {
        let private_key = env_value(&["EMAILJS_PRIVATE_KEY"]);
        Self {
            service_id: env_value(&["EMAILJS_SERVICE_ID"]),
            template_id: env_value(&["EMAILJS_TEMPLATE_ID"]),
            public_key: env_value(&["EMAILJS_PUBLIC_KEY"]),
            private_key: (!private_key.is_empty()).then_some(private_key),
        }
    }
}

pub struct EmailJsProvider {
    client: Client,
    config: EmailJsConfig,
    sender: EmailSender,
    base_url: String,
}

impl EmailJsProvider {
    pub fn new(config: EmailJsConfig, sender: EmailSender) -> Self {
        Self::with_client(default_client(), config, sender)
    }

    pub fn with_client(client: Client, config: EmailJsConfig, sender: EmailSender) -> Self {
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

    fn payload(&self, contact: &str, message: &RenderedMessage) -> Value {
        let mut payload = json!({
            "service_id": self.config.service_id,
            "template_id": self.config.template_id,
            "user_id": self.config.public_key,
            "template_params": {
                "to_email": contact,
                "from_name": self.sender.name,
                "reply_to": self.sender.address,
                "subject": message.subject,
                "message": message.text,
                "html_message": message.html,
            },
        });
        if let Some(private_key) = &self.config.private_key {
            payload["accessToken"] = Value::String(private_key.clone());
        }
        payload
    }
}

#[async_trait]
impl NotificationProvider for EmailJsProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn supports(&self, channel: Channel) -> bool {
        channel == Channel::Email
    }

    fn is_configured(&self) -> bool {
        all_present(&[
            &self.config.service_id,
            &self.config.template_id,
            &self.config.public_key,
        ])
    }

    async fn send(&self, contact: &str, message: &RenderedMessage) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(format!("{}/api/v1.0/email/send", self.base_url))
            .json(&self.payload(contact, message))
            .send()
            .await
            .map_err(|e| ProviderError::transport(NAME, e))?;

        read_success(NAME, response).await?;
        Ok(format!("{}-{}", NAME, Uuid::new_v4()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmailJsConfig {
        EmailJsConfig {
            service_id: "service_x".into(),
            template_id: "template_y".into(),
            public_key: "pub".into(),
            private_key: None,
        }
    }

    #[test]
    fn test_payload_and_access_token() {
        let message = RenderedMessage {
            subject: "subject".into(),
            text: "code 654321".into(),
            html: "<b>654321</b>".into(),
        };
        let provider = EmailJsProvider::new(config(), EmailSender::default());
        let payload = provider.payload("user@example.com", &message);
        assert_eq!(payload["user_id"], "pub");
        assert_eq!(payload["template_params"]["to_email"], "user@example.com");
        assert_eq!(payload["template_params"]["message"], "code 654321");
        assert!(payload.get("accessToken").is_none());

        let strict = EmailJsProvider::new(
            EmailJsConfig {
                private_key: Some("secret".into()),
                ..config()
            },
            EmailSender::default(),
        );
        assert_eq!(strict.payload("user@example.com", &message)["accessToken"], "secret");
    }

    #[test]
    fn test_needs_all_three_ids() {
        assert!(EmailJsProvider::new(config(), EmailSender::default()).is_configured());
        let partial = EmailJsConfig {
            template_id: String::new(),
            ..config()
        };
        assert!(!EmailJsProvider::new(partial, EmailSender::default()).is_configured());
    }
}
