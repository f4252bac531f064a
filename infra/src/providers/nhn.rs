//! NHN Cloud (formerly TOAST) SMS v3.0

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use af_core::domain::Channel;
use af_core::errors::ProviderError;
use af_core::services::{NotificationProvider, RenderedMessage};

use super::http::{default_client, id_at, parse_json, read_success, trim_base};
use super::{all_present, domestic_number, env_value};

const NAME: &str = "nhn";
const DEFAULT_BASE_URL: &str = "https://api-sms.cloud.toast.com";

#[derive(Debug, Clone, Default)]
pub struct NhnConfig {
    pub app_key: String,
    pub secret_key: String,
    pub sender_number: String,
}

impl NhnConfig {
    /// Reads the `NHN_SMS_*` variables, falling back to the older `TOAST_SMS_*` names
    pub fn from_env() -> Self {
        Self {
            app_key: env_value(&["NHN_SMS_APP_KEY", "TOAST_SMS_APP_KEY"]),
            secret_key: env_value(&["NHN_SMS_SECRET_KEY", "TOAST_SMS_SECRET_KEY"]),
            sender_number: env_value(&["NHN_SMS_SENDER_NUMBER", "TOAST_SMS_SENDER_NUMBER"]),
        }
    }
}

pub struct NhnProvider {
    client: Client,
    config: NhnConfig,
    base_url: String,
}

impl NhnProvider {
    pub fn new(config: NhnConfig) -> Self {
        Self::with_client(default_client(), config)
    }

    pub fn with_client(client: Client, config: NhnConfig) -> Self {
        Self {
            client,
            config,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base(base_url);
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/sms/v3.0/appKeys/{}/sender/sms",
            self.base_url, self.config.app_key
        )
    }
}

/// Success iff `header.isSuccessful`; the id is `body.data.requestId`
fn parse_response(body: &str) -> Result<String, ProviderError> {
    let value = parse_json(NAME, body)?;
    let header = value
        .get("header")
        .ok_or_else(|| ProviderError::malformed(NAME, "missing header"))?;

    if header.get("isSuccessful").and_then(Value::as_bool) != Some(true) {
        let code = header.get("resultCode").cloned().unwrap_or(Value::Null);
        let reason = header
            .get("resultMessage")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(ProviderError::rejected(NAME, format!("resultCode {}: {}", code, reason)));
    }

    id_at(NAME, &value, "/body/data/requestId")
}

#[async_trait]
impl NotificationProvider for NhnProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn supports(&self, channel: Channel) -> bool {
        channel == Channel::Sms
    }

    fn is_configured(&self) -> bool {
        all_present(&[
            &self.config.app_key,
            &self.config.secret_key,
            &self.config.sender_number,
        ])
    }

    async fn send(&self, contact: &str, message: &RenderedMessage) -> Result<String, ProviderError> {
        let payload = json!({
            "body": message.text,
            "sendNo": domestic_number(&self.config.sender_number),
            "recipientList": [{ "recipientNo": domestic_number(contact) }],
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("X-Secret-Key", &self.config.secret_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::transport(NAME, e))?;

        let body = read_success(NAME, response).await?;
        parse_response(&body)
    }
}
