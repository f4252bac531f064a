//! Twilio SMS via the `twilio` crate
//!
//! Twilio requires E.164 numbers; domestic numbers are interpreted in the
//! default region (KR).

use async_trait::async_trait;
use phonenumber::{country, Mode};
use tracing::debug;
use twilio::{Client, OutboundMessage};

use af_core::domain::Channel;
use af_core::errors::ProviderError;
use af_core::services::{NotificationProvider, RenderedMessage};
use af_shared::utils::contact::mask_contact;

use super::{all_present, env_value};

const NAME: &str = "twilio";

#[derive(Debug, Clone, Default)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Twilio sender number in E.164 form
    pub phone_number: String,
}

impl TwilioConfig {
    /// Reads `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN` and `TWILIO_PHONE_NUMBER`
    pub fn from_env() -> Self {
        Self {
            account_sid: env_value(&["TWILIO_ACCOUNT_SID"]),
            auth_token: env_value(&["TWILIO_AUTH_TOKEN"]),
            phone_number: env_value(&["TWILIO_PHONE_NUMBER"]),
        }
    }
}

pub struct TwilioProvider {
    client: Client,
    config: TwilioConfig,
}

impl TwilioProvider {
    pub fn new(config: TwilioConfig) -> Self {
        let client = Client::new(&config.account_sid, &config.auth_token);
        Self { client, config }
    }
}

/// Convert a contact to E.164, assuming KR when no country code is given
pub fn to_e164(phone: &str) -> Result<String, ProviderError> {
    let parsed = phonenumber::parse(Some(country::Id::KR), phone)
        .map_err(|e| ProviderError::rejected(NAME, format!("invalid phone number: {}", e)))?;

    if !phonenumber::is_valid(&parsed) {
        return Err(ProviderError::rejected(NAME, "invalid phone number"));
    }
    Ok(parsed.format().mode(Mode::E164).to_string())
}

#[async_trait]
impl NotificationProvider for TwilioProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn supports(&self, channel: Channel) -> bool {
        channel == Channel::Sms
    }

    fn is_configured(&self) -> bool {
        all_present(&[
            &self.config.account_sid,
            &self.config.auth_token,
            &self.config.phone_number,
        ])
    }

    async fn send(&self, contact: &str, message: &RenderedMessage) -> Result<String, ProviderError> {
        let to = to_e164(contact)?;
        debug!(provider = NAME, contact = %mask_contact(&to), "Sending SMS");

        let outbound = OutboundMessage::new(&self.config.phone_number, &to, &message.text);
        let response = self
            .client
            .send_message(outbound)
            .await
            .map_err(|e| ProviderError::transport(NAME, e))?;

        Ok(response.sid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domestic_numbers_default_to_korea() {
        assert_eq!(to_e164("01012345678").unwrap(), "+821012345678");
        assert_eq!(to_e164("+821012345678").unwrap(), "+821012345678");
        assert_eq!(to_e164("+14155552671").unwrap(), "+14155552671");
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        assert!(matches!(to_e164("12"), Err(ProviderError::Rejected { .. })));
    }

    #[test]
    fn test_is_configured() {
        assert!(!TwilioProvider::new(TwilioConfig::default()).is_configured());
        let provider = TwilioProvider::new(TwilioConfig {
            account_sid: "AC123".into(),
            auth_token: "token".into(),
            phone_number: "+15005550006".into(),
        });
        assert!(provider.is_configured());
        assert!(provider.supports(Channel::Sms));
    }
}
