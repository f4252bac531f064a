//! Aligo SMS gateway (Korea)
//!
//! Aligo answers HTTP 200 even for rejected messages; the outcome lives in
//! `result_code`, which is `1` on success and may arrive as a number or a
//! string.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use af_core::domain::Channel;
use af_core::errors::ProviderError;
use af_core::services::{NotificationProvider, RenderedMessage};

use super::http::{default_client, id_at, parse_json, read_success, trim_base};
use super::{all_present, domestic_number, env_value};

const NAME: &str = "aligo";
const DEFAULT_BASE_URL: &str = "https://apis.aligo.in";

/// Longest body accepted as a short SMS, in EUC-KR bytes
const SMS_MAX_BYTES: usize = 90;

#[derive(Debug, Clone, Default)]
pub struct AligoConfig {
    pub api_key: String,
    pub user_id: String,
    pub sender_number: String,
    /// Send with `testmode_yn=Y`; Aligo accepts but does not deliver
    pub test_mode: bool,
}

impl AligoConfig {
    /// Reads `ALIGO_API_KEY`, `ALIGO_USER_ID`, `ALIGO_SENDER_NUMBER` and `ALIGO_TEST_MODE`
    pub fn from_env() -> Self {
        Self {
            api_key: env_value(&["ALIGO_API_KEY"]),
            user_id: env_value(&["ALIGO_USER_ID"]),
            sender_number: env_value(&["ALIGO_SENDER_NUMBER"]),
            test_mode: matches!(
                env_value(&["ALIGO_TEST_MODE"]).to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "y"
            ),
        }
    }
}

pub struct AligoProvider {
    client: Client,
    config: AligoConfig,
    base_url: String,
}

impl AligoProvider {
    pub fn new(config: AligoConfig) -> Self {
        Self::with_client(default_client(), config)
    }

    pub fn with_client(client: Client, config: AligoConfig) -> Self {
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
}

/// Byte length as Aligo counts it: Hangul and other non-ASCII take two bytes
fn euc_kr_len(text: &str) -> usize {
    text.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum()
}

fn message_type(text: &str) -> &'static str {
    if euc_kr_len(text) > SMS_MAX_BYTES {
        "LMS"
    } else {
        "SMS"
    }
}

fn result_code(value: &Value) -> Option<i64> {
    match value.get("result_code")? {
        Value::Number(code) => code.as_i64(),
        Value::String(code) => code.trim().parse().ok(),
        _ => None,
    }
}

/// `{"result_code": "1", "message": "success", "msg_id": "123456789", ...}`
fn parse_response(body: &str) -> Result<String, ProviderError> {
    let value = parse_json(NAME, body)?;
    match result_code(&value) {
        Some(1) => id_at(NAME, &value, "/msg_id"),
        Some(code) => {
            let reason = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            Err(ProviderError::rejected(NAME, format!("result_code {}: {}", code, reason)))
        }
        None => Err(ProviderError::malformed(NAME, "missing result_code")),
    }
}

#[async_trait]
impl NotificationProvider for AligoProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn supports(&self, channel: Channel) -> bool {
        channel == Channel::Sms
    }

    fn is_configured(&self) -> bool {
        all_present(&[
            &self.config.api_key,
            &self.config.user_id,
            &self.config.sender_number,
        ])
    }

    async fn send(&self, contact: &str, message: &RenderedMessage) -> Result<String, ProviderError> {
        let receiver = domestic_number(contact);
        let sender = domestic_number(&self.config.sender_number);
        let msg_type = message_type(&message.text);

        let mut form = vec![
            ("key", self.config.api_key.as_str()),
            ("user_id", self.config.user_id.as_str()),
            ("sender", sender.as_str()),
            ("receiver", receiver.as_str()),
            ("msg", message.text.as_str()),
            ("msg_type", msg_type),
        ];
        if msg_type == "LMS" {
            form.push(("title", message.subject.as_str()));
        }
        if self.config.test_mode {
            form.push(("testmode_yn", "Y"));
        }

        let response = self
            .client
            .post(format!("{}/send/", self.base_url))
            .form(&form)
            .send()
            .await
            .map_err(|e| ProviderError::transport(NAME, e))?;

        let body = read_success(NAME, response).await?;
        parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_code_as_string_or_number() {
        assert_eq!(
            parse_response(r#"{"result_code":"1","message":"success","msg_id":"987654321"}"#).unwrap(),
            "987654321"
        );
        assert_eq!(
            parse_response(r#"{"result_code":1,"message":"success","msg_id":123}"#).unwrap(),
            "123"
        );
    }

    #[test]
    fn test_negative_result_code_is_rejected() {
        match parse_response(r#"{"result_code":"-101","message":"인증오류입니다."}"#) {
            Err(ProviderError::Rejected { message, .. }) => {
                assert!(message.contains("-101"));
                assert!(message.contains("인증오류"));
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(
            parse_response(r#"{"message":"?"}"#),
            Err(ProviderError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_message_type_switches_to_lms() {
        assert_eq!(message_type("[AmuseFit] 인증번호 [042917]를 입력해주세요. (5분 내 유효)"), "SMS");
        assert_eq!(message_type(&"가".repeat(46)), "LMS");
        assert_eq!(euc_kr_len("ab가"), 4);
    }

    #[test]
    fn test_is_configured() {
        let config = AligoConfig {
            api_key: "k".into(),
            user_id: "amusefit".into(),
            sender_number: "0212345678".into(),
            test_mode: false,
        };
        assert!(AligoProvider::new(config.clone()).is_configured());
        let missing = AligoConfig {
            sender_number: String::new(),
            ..config
        };
        assert!(!AligoProvider::new(missing).is_configured());
    }
}
