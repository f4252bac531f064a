//! Notification provider adapters
//!
//! Every adapter implements [`af_core::services::NotificationProvider`].
//! Adapters are always constructed, even without credentials, and report
//! `is_configured() == false` so the dispatcher skips them and records the
//! skip in its attempt list.

pub mod aligo;
pub mod brevo;
pub mod console;
pub mod emailjs;
mod http;
pub mod mailgun;
pub mod nhn;
pub mod registry;
pub mod resend;
pub mod sendgrid;
#[cfg(feature = "smtp")]
pub mod smtp;
#[cfg(feature = "twilio-sms")]
pub mod twilio;

pub use aligo::{AligoConfig, AligoProvider};
pub use brevo::{BrevoConfig, BrevoProvider};
pub use console::{ConsoleMessage, ConsoleProvider};
pub use emailjs::{EmailJsConfig, EmailJsProvider};
pub use mailgun::{MailgunConfig, MailgunProvider};
pub use nhn::{NhnConfig, NhnProvider};
pub use resend::{ResendConfig, ResendProvider};
pub use sendgrid::{SendGridConfig, SendGridProvider};
#[cfg(feature = "smtp")]
pub use smtp::{SmtpConfig, SmtpProvider};
#[cfg(feature = "twilio-sms")]
pub use self::twilio::{TwilioConfig, TwilioProvider};

use af_shared::DeliveryConfig;

/// Sender identity shared by all email providers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSender {
    pub address: String,
    pub name: String,
}

impl EmailSender {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }

    /// `Name <address>` form used by Resend and Mailgun
    pub fn mailbox(&self) -> String {
        if self.name.is_empty() {
            self.address.clone()
        } else {
            format!("{} <{}>", self.name, self.address)
        }
    }
}

impl From<&DeliveryConfig> for EmailSender {
    fn from(config: &DeliveryConfig) -> Self {
        Self::new(config.from_address.clone(), config.from_name.clone())
    }
}

impl Default for EmailSender {
    fn default() -> Self {
        Self::from(&DeliveryConfig::default())
    }
}

/// First non-empty value among `keys`, trimmed; empty when none is set
pub(crate) fn env_value(keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

/// Whether every credential is present
pub(crate) fn all_present(values: &[&str]) -> bool {
    values.iter().all(|value| !value.trim().is_empty())
}

/// Domestic Korean form (`01012345678`) expected by Aligo and NHN Cloud
pub(crate) fn domestic_number(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.strip_prefix("82") {
        Some(rest) if phone.trim_start().starts_with('+') => {
            format!("0{}", rest.trim_start_matches('0'))
        }
        _ => digits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domestic_number() {
        assert_eq!(domestic_number("+821012345678"), "01012345678");
        assert_eq!(domestic_number("+82 010-1234-5678"), "01012345678");
        assert_eq!(domestic_number("010-1234-5678"), "01012345678");
        assert_eq!(domestic_number("01012345678"), "01012345678");
    }

    #[test]
    fn test_mailbox_format() {
        let sender = EmailSender::new("noreply@amusefit.co.kr", "AmuseFit");
        assert_eq!(sender.mailbox(), "AmuseFit <noreply@amusefit.co.kr>");
        assert_eq!(EmailSender::new("a@b.co", "").mailbox(), "a@b.co");
    }

    #[test]
    fn test_all_present() {
        assert!(all_present(&["key", "domain"]));
        assert!(!all_present(&["key", " "]));
        assert!(!all_present(&[""]));
    }

    #[test]
    fn test_env_value_missing_is_empty() {
        assert_eq!(env_value(&["AF_TEST_SURELY_UNSET_1", "AF_TEST_SURELY_UNSET_2"]), "");
    }
}
