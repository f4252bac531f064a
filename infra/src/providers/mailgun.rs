//! Mailgun messages API (form-encoded, basic auth)

use async_trait::async_trait;
use reqwest::Client;

use af_core::domain::Channel;
use af_core::errors::ProviderError;
use af_core::services::{NotificationProvider, RenderedMessage};

use super::http::{default_client, id_at, parse_json, read_success, trim_base};
use super::{all_present, env_value, EmailSender};

const NAME: &str = "mailgun";
const DEFAULT_BASE_URL: &str = "https://api.mailgun.net";

#[derive(Debug, Clone, Default)]
pub struct MailgunConfig {
    pub api_key: String,
    pub domain: String,
    /// EU accounts use `https://api.eu.mailgun.net`
    pub api_base: Option<String>,
}

impl MailgunConfig {
    /// Reads `MAILGUN_API_KEY`, `MAILGUN_DOMAIN` and optionally `MAILGUN_API_BASE`
    pub fn from_env() -> Self {
        let api_base = env_value(&["MAILGUN_API_BASE"]);
        Self {
            api_key: env_value(&["MAILGUN_API_KEY"]),
            domain: env_value(&["MAILGUN_DOMAIN"]),
            api_base: (!api_base.is_empty()).then_some(api_base),
        }
    }
}

pub struct MailgunProvider {
    client: Client,
    config: MailgunConfig,
    sender: EmailSender,
    base_url: String,
}

impl MailgunProvider {
    pub fn new(config: MailgunConfig, sender: EmailSender) -> Self {
        Self::with_client(default_client(), config, sender)
    }

    pub fn with_client(client: Client, config: MailgunConfig, sender: EmailSender) -> Self {
        let base_url = trim_base(config.api_base.as_deref().unwrap_or(DEFAULT_BASE_URL));
        Self {
            client,
            config,
            sender,
            base_url,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base(base_url);
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v3/{}/messages", self.base_url, self.config.domain)
    }
}

/// `{"id": "<...@domain>", "message": "Queued. Thank you."}`
fn parse_message_id(body: &str) -> Result<String, ProviderError> {
    let value = parse_json(NAME, body)?;
    id_at(NAME, &value, "/id")
}

#[async_trait]
impl NotificationProvider for MailgunProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn supports(&self, channel: Channel) -> bool {
        channel == Channel::Email
    }

    fn is_configured(&self) -> bool {
        all_present(&[&self.config.api_key, &self.config.domain])
    }

    async fn send(&self, contact: &str, message: &RenderedMessage) -> Result<String, ProviderError> {
        let from = self.sender.mailbox();
        let form = [
            ("from", from.as_str()),
            ("to", contact),
            ("subject", message.subject.as_str()),
            ("text", message.text.as_str()),
            ("html", message.html.as_str()),
        ];

        let response = self
            .client
            .post(self.endpoint())
            .basic_auth("api", Some(&self.config.api_key))
            .form(&form)
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

    fn config() -> MailgunConfig {
        MailgunConfig {
            api_key: "key-1".into(),
            domain: "mg.amusefit.co.kr".into(),
            api_base: None,
        }
    }

    #[test]
    fn test_endpoint_uses_domain_and_region() {
        let provider = MailgunProvider::new(config(), EmailSender::default());
        assert_eq!(provider.endpoint(), "https://api.mailgun.net/v3/mg.amusefit.co.kr/messages");

        let eu = MailgunProvider::new(
            MailgunConfig {
                api_base: Some("https://api.eu.mailgun.net/".into()),
                ..config()
            },
            EmailSender::default(),
        );
        assert_eq!(eu.endpoint(), "https://api.eu.mailgun.net/v3/mg.amusefit.co.kr/messages");
    }

    #[test]
    fn test_requires_key_and_domain() {
        assert!(MailgunProvider::new(config(), EmailSender::default()).is_configured());
        let no_domain = MailgunConfig {
            domain: String::new(),
            ..config()
        };
        assert!(!MailgunProvider::new(no_domain, EmailSender::default()).is_configured());
    }

    #[test]
    fn test_parse_message_id() {
        let body = r#"{"id":"<20241016.1@mg.amusefit.co.kr>","message":"Queued. Thank you."}"#;
        assert_eq!(parse_message_id(body).unwrap(), "<20241016.1@mg.amusefit.co.kr>");
    }
}
