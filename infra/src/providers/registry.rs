//! Builds the delivery dispatcher from provider credentials
//!
//! Every known provider is instantiated in priority order whether or not its
//! credentials are present; the dispatcher skips the unconfigured ones. The
//! order can be overridden per channel with `EMAIL_PROVIDER_ORDER` and
//! `SMS_PROVIDER_ORDER`, in which case only the listed providers take part.

use reqwest::Client;
use std::sync::Arc;
use tracing::{info, warn};

use af_core::domain::Channel;
use af_core::services::{DeliveryDispatcher, NotificationProvider};
use af_shared::DeliveryConfig;

use super::http::build_client;
use super::{
    AligoConfig, AligoProvider, BrevoConfig, BrevoProvider, ConsoleProvider, EmailJsConfig,
    EmailJsProvider, EmailSender, MailgunConfig, MailgunProvider, NhnConfig, NhnProvider,
    ResendConfig, ResendProvider, SendGridConfig, SendGridProvider,
};
#[cfg(feature = "smtp")]
use super::{SmtpConfig, SmtpProvider};
#[cfg(feature = "twilio-sms")]
use super::{TwilioConfig, TwilioProvider};
use crate::InfrastructureError;

pub const DEFAULT_EMAIL_ORDER: &[&str] = &[
    "brevo", "resend", "sendgrid", "gmail", "outlook", "mailgun", "emailjs",
];
pub const DEFAULT_SMS_ORDER: &[&str] = &["aligo", "nhn", "twilio"];

/// Credentials of every provider
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub brevo: BrevoConfig,
    pub resend: ResendConfig,
    pub sendgrid: SendGridConfig,
    #[cfg(feature = "smtp")]
    pub gmail: SmtpConfig,
    #[cfg(feature = "smtp")]
    pub outlook: SmtpConfig,
    pub mailgun: MailgunConfig,
    pub emailjs: EmailJsConfig,
    pub aligo: AligoConfig,
    pub nhn: NhnConfig,
    #[cfg(feature = "twilio-sms")]
    pub twilio: TwilioConfig,
}

impl Default for ProviderSettings {
    /// No credentials at all
    fn default() -> Self {
        Self {
            brevo: BrevoConfig::default(),
            resend: ResendConfig::default(),
            sendgrid: SendGridConfig::default(),
            #[cfg(feature = "smtp")]
            gmail: SmtpConfig::gmail("", ""),
            #[cfg(feature = "smtp")]
            outlook: SmtpConfig::outlook("", ""),
            mailgun: MailgunConfig::default(),
            emailjs: EmailJsConfig::default(),
            aligo: AligoConfig::default(),
            nhn: NhnConfig::default(),
            #[cfg(feature = "twilio-sms")]
            twilio: TwilioConfig::default(),
        }
    }
}

impl ProviderSettings {
    pub fn from_env() -> Self {
        Self {
            brevo: BrevoConfig::from_env(),
            resend: ResendConfig::from_env(),
            sendgrid: SendGridConfig::from_env(),
            #[cfg(feature = "smtp")]
            gmail: SmtpConfig::gmail_from_env(),
            #[cfg(feature = "smtp")]
            outlook: SmtpConfig::outlook_from_env(),
            mailgun: MailgunConfig::from_env(),
            emailjs: EmailJsConfig::from_env(),
            aligo: AligoConfig::from_env(),
            nhn: NhnConfig::from_env(),
            #[cfg(feature = "twilio-sms")]
            twilio: TwilioConfig::from_env(),
        }
    }
}

/// Instantiate one provider by name; `None` for unknown names
fn build_provider(
    name: &str,
    settings: &ProviderSettings,
    client: &Client,
    sender: &EmailSender,
) -> Result<Option<Arc<dyn NotificationProvider>>, InfrastructureError> {
    let client = client.clone();
    let sender = sender.clone();
    let provider: Arc<dyn NotificationProvider> = match name {
        "brevo" => Arc::new(BrevoProvider::with_client(client, settings.brevo.clone(), sender)),
        "resend" => Arc::new(ResendProvider::with_client(client, settings.resend.clone(), sender)),
        "sendgrid" => Arc::new(SendGridProvider::with_client(client, settings.sendgrid.clone(), sender)),
        #[cfg(feature = "smtp")]
        "gmail" => Arc::new(SmtpProvider::new(settings.gmail.clone(), sender)?),
        #[cfg(feature = "smtp")]
        "outlook" => Arc::new(SmtpProvider::new(settings.outlook.clone(), sender)?),
        "mailgun" => Arc::new(MailgunProvider::with_client(client, settings.mailgun.clone(), sender)),
        "emailjs" => Arc::new(EmailJsProvider::with_client(client, settings.emailjs.clone(), sender)),
        "aligo" => Arc::new(AligoProvider::with_client(client, settings.aligo.clone())),
        "nhn" => Arc::new(NhnProvider::with_client(client, settings.nhn.clone())),
        #[cfg(feature = "twilio-sms")]
        "twilio" => Arc::new(TwilioProvider::new(settings.twilio.clone())),
        _ => return Ok(None),
    };
    Ok(Some(provider))
}

/// Provider names for `channel`, override first
fn resolve_order(channel: Channel, overridden: Option<&Vec<String>>) -> Vec<String> {
    match overridden {
        Some(names) => names
            .iter()
            .map(|name| name.trim().to_ascii_lowercase())
            .filter(|name| !name.is_empty())
            .collect(),
        None => {
            let defaults = match channel {
                Channel::Email => DEFAULT_EMAIL_ORDER,
                Channel::Sms => DEFAULT_SMS_ORDER,
            };
            defaults.iter().map(|name| name.to_string()).collect()
        }
    }
}

/// Build the dispatcher with every provider in priority order, plus the
/// console fallback when `dev_fallback` is enabled
pub fn build_dispatcher(
    settings: &ProviderSettings,
    config: &DeliveryConfig,
) -> Result<DeliveryDispatcher, InfrastructureError> {
    let client = build_client()?;
    let sender = EmailSender::from(config);
    let mut dispatcher = DeliveryDispatcher::new(config.provider_timeout());

    for (channel, overridden) in [
        (Channel::Email, config.email_order.as_ref()),
        (Channel::Sms, config.sms_order.as_ref()),
    ] {
        for name in resolve_order(channel, overridden) {
            match build_provider(&name, settings, &client, &sender)? {
                Some(provider) if provider.supports(channel) => {
                    dispatcher = dispatcher.with_provider_for(channel, provider);
                }
                Some(_) => {
                    warn!(provider = %name, channel = %channel, "Provider does not support this channel, ignoring");
                }
                None => {
                    warn!(provider = %name, channel = %channel, "Unknown or disabled provider in order override, ignoring");
                }
            }
        }
    }

    if config.dev_fallback {
        dispatcher = dispatcher.with_fallback(Arc::new(ConsoleProvider::new()));
    }

    for channel in [Channel::Email, Channel::Sms] {
        let configured = dispatcher.configured_providers(channel);
        if configured.is_empty() && !config.dev_fallback {
            warn!(
                channel = %channel,
                "No {} provider has credentials and the console fallback is off; sends will fail",
                channel
            );
        }
        info!(
            channel = %channel,
            configured = ?configured,
            registered = dispatcher.providers(channel).len(),
            dev_fallback = config.dev_fallback,
            "Delivery providers ready"
        );
    }

    Ok(dispatcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use af_shared::Environment;

    fn names(dispatcher: &DeliveryDispatcher, channel: Channel) -> Vec<String> {
        dispatcher
            .providers(channel)
            .iter()
            .map(|provider| provider.name().to_string())
            .collect()
    }

    #[test]
    fn test_default_order_and_nothing_configured() {
        let config = DeliveryConfig::for_environment(Environment::Production);
        let dispatcher = build_dispatcher(&ProviderSettings::default(), &config).unwrap();

        #[cfg(all(feature = "smtp", feature = "twilio-sms"))]
        {
            assert_eq!(names(&dispatcher, Channel::Email), DEFAULT_EMAIL_ORDER);
            assert_eq!(names(&dispatcher, Channel::Sms), DEFAULT_SMS_ORDER);
        }
        assert!(dispatcher.configured_providers(Channel::Email).is_empty());
        assert!(dispatcher.configured_providers(Channel::Sms).is_empty());
        assert!(!dispatcher.has_fallback());
    }

    #[test]
    fn test_configured_provider_is_reported() {
        let mut settings = ProviderSettings::default();
        settings.resend.api_key = "re_123".into();
        settings.nhn = NhnConfig {
            app_key: "app".into(),
            secret_key: "secret".into(),
            sender_number: "15881234".into(),
        };

        let dispatcher =
            build_dispatcher(&settings, &DeliveryConfig::for_environment(Environment::Development)).unwrap();
        assert_eq!(dispatcher.configured_providers(Channel::Email), vec!["resend".to_string()]);
        assert_eq!(dispatcher.configured_providers(Channel::Sms), vec!["nhn".to_string()]);
        assert!(dispatcher.has_fallback());
    }

    #[test]
    fn test_order_override() {
        let config = DeliveryConfig {
            email_order: Some(vec!["Mailgun".into(), " resend ".into(), "carrier-pigeon".into()]),
            sms_order: Some(vec!["nhn".into(), "brevo".into()]),
            ..DeliveryConfig::for_environment(Environment::Production)
        };
        let dispatcher = build_dispatcher(&ProviderSettings::default(), &config).unwrap();

        assert_eq!(names(&dispatcher, Channel::Email), vec!["mailgun", "resend"]);
        assert_eq!(names(&dispatcher, Channel::Sms), vec!["nhn"]);
    }
}
