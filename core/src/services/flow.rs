//! Send-and-verify workflow combining the code store with delivery
//!
//! The HTTP layer talks to this type only. It normalizes contacts, picks the
//! per-channel lifetime, and keeps the store consistent with what was
//! actually delivered.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use af_shared::utils::contact::{
    is_valid_email, is_valid_phone, mask_contact, normalize_email, normalize_phone_number,
};
use af_shared::Language;

use crate::domain::entities::verification_code::{Channel, Purpose};
use crate::errors::{DomainError, DomainResult};
use crate::services::delivery::{DeliveryDispatcher, DispatchReport};
use crate::services::verification::{
    CodeSnapshot, VerificationService, VerificationStore, VerifyCodeResult,
};

/// Result of sending a verification code. The code itself is not included.
#[derive(Debug, Clone)]
pub struct SendCodeResult {
    pub contact: String,
    pub purpose: Purpose,
    pub channel: Channel,
    pub expires_at: DateTime<Utc>,
    /// When the user can request another code
    pub next_resend_at: DateTime<Utc>,
    pub delivery: DispatchReport,
}

pub struct VerificationFlow<S: VerificationStore> {
    service: Arc<VerificationService<S>>,
    dispatcher: Arc<DeliveryDispatcher>,
    email_ttl: Duration,
    sms_ttl: Duration,
}

impl<S: VerificationStore> VerificationFlow<S> {
    pub fn new(
        service: Arc<VerificationService<S>>,
        dispatcher: Arc<DeliveryDispatcher>,
        email_ttl: Duration,
        sms_ttl: Duration,
    ) -> Self {
        Self {
            service,
            dispatcher,
            email_ttl,
            sms_ttl,
        }
    }

    pub fn service(&self) -> &Arc<VerificationService<S>> {
        &self.service
    }

    pub fn dispatcher(&self) -> &Arc<DeliveryDispatcher> {
        &self.dispatcher
    }

    pub fn ttl_for(&self, channel: Channel) -> Duration {
        match channel {
            Channel::Email => self.email_ttl,
            Channel::Sms => self.sms_ttl,
        }
    }

    /// Normalize a contact for `channel` and reject malformed input
    pub fn normalize_contact(contact: &str, channel: Channel) -> DomainResult<String> {
        match channel {
            Channel::Email if is_valid_email(contact) => Ok(normalize_email(contact)),
            Channel::Sms if is_valid_phone(contact) => Ok(normalize_phone_number(contact)),
            _ => Err(DomainError::InvalidContact { channel }),
        }
    }

    /// Issue a code and deliver it.
    ///
    /// If no provider delivers the message the freshly issued record is
    /// removed again, so the user is not held by the resend cooldown for a
    /// code they never received.
    pub async fn send_code(
        &self,
        contact: &str,
        purpose: Purpose,
        channel: Channel,
        language: Language,
    ) -> DomainResult<SendCodeResult> {
        let contact = Self::normalize_contact(contact, channel)?;
        let ttl = self.ttl_for(channel);
        let issued = self.service.issue(&contact, purpose, ttl).await?;

        let delivery = match self
            .dispatcher
            .dispatch(&contact, &issued.code, purpose, channel, ttl, language)
            .await
        {
            Ok(report) => report,
            Err(e) => {
                if let Err(clear_err) = self.service.clear(&contact, purpose).await {
                    tracing::error!(
                        contact = %mask_contact(&contact),
                        error = %clear_err,
                        "Failed to clear undelivered verification code"
                    );
                }
                return Err(e.into());
            }
        };

        Ok(SendCodeResult {
            contact: issued.contact,
            purpose,
            channel,
            expires_at: issued.expires_at,
            next_resend_at: issued.next_resend_at,
            delivery,
        })
    }

    pub async fn verify_code(
        &self,
        contact: &str,
        purpose: Purpose,
        channel: Channel,
        code: &str,
    ) -> DomainResult<VerifyCodeResult> {
        let contact = Self::normalize_contact(contact, channel)?;
        self.service.verify(&contact, purpose, code).await
    }

    pub async fn is_verified(&self, contact: &str, purpose: Purpose, channel: Channel) -> DomainResult<bool> {
        let contact = Self::normalize_contact(contact, channel)?;
        self.service.is_verified(&contact, purpose).await
    }

    pub async fn consume(&self, contact: &str, purpose: Purpose, channel: Channel) -> DomainResult<bool> {
        let contact = Self::normalize_contact(contact, channel)?;
        self.service.consume(&contact, purpose).await
    }

    pub async fn peek(&self, contact: &str, purpose: Purpose, channel: Channel) -> DomainResult<Option<CodeSnapshot>> {
        let contact = Self::normalize_contact(contact, channel)?;
        self.service.peek(&contact, purpose).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::delivery::tests::mocks::{Behaviour, ScriptedProvider};
    use crate::services::verification::{InMemoryVerificationStore, VerificationServiceConfig};

    fn flow_with(
        providers: Vec<Arc<ScriptedProvider>>,
    ) -> VerificationFlow<InMemoryVerificationStore> {
        let service = Arc::new(VerificationService::new(
            Arc::new(InMemoryVerificationStore::new()),
            VerificationServiceConfig::default(),
        ));
        let mut dispatcher = DeliveryDispatcher::new(Duration::from_secs(8));
        for provider in providers {
            dispatcher = dispatcher.with_provider(provider);
        }
        VerificationFlow::new(
            service,
            Arc::new(dispatcher),
            Duration::from_secs(600),
            Duration::from_secs(300),
        )
    }

    #[tokio::test]
    async fn test_send_and_verify_email() {
        let provider = Arc::new(ScriptedProvider::new("resend", Channel::Email, Behaviour::Succeed));
        let flow = flow_with(vec![provider.clone()]);

        let sent = flow
            .send_code(" Coach@AmuseFit.co.kr ", Purpose::EmailVerify, Channel::Email, Language::Korean)
            .await
            .unwrap();
        assert_eq!(sent.contact, "coach@amusefit.co.kr");
        assert_eq!(sent.delivery.provider_used, "resend");

        let snapshot = flow
            .peek("coach@amusefit.co.kr", Purpose::EmailVerify, Channel::Email)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.time_left, 600);
        assert!(provider.last_message().unwrap().text.contains(&snapshot.code));

        let result = flow
            .verify_code("coach@amusefit.co.kr", Purpose::EmailVerify, Channel::Email, &snapshot.code)
            .await
            .unwrap();
        assert!(result.is_verified());
        assert!(flow
            .consume("COACH@amusefit.co.kr", Purpose::EmailVerify, Channel::Email)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_sms_uses_sms_ttl_and_normalized_number() {
        let provider = Arc::new(ScriptedProvider::new("aligo", Channel::Sms, Behaviour::Succeed));
        let flow = flow_with(vec![provider]);

        flow.send_code("010-1234-5678", Purpose::FindId, Channel::Sms, Language::Korean)
            .await
            .unwrap();
        let snapshot = flow
            .peek("01012345678", Purpose::FindId, Channel::Sms)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.time_left, 300);
    }

    #[tokio::test]
    async fn test_phone_formats_share_cooldown() {
        let provider = Arc::new(ScriptedProvider::new("aligo", Channel::Sms, Behaviour::Succeed));
        let flow = flow_with(vec![provider]);

        let first = flow
            .send_code("010-1234-5678", Purpose::FindId, Channel::Sms, Language::Korean)
            .await
            .unwrap();
        assert_eq!(first.contact, "01012345678");

        let second = flow
            .send_code("+82 10-1234-5678", Purpose::FindId, Channel::Sms, Language::Korean)
            .await;
        assert!(matches!(second, Err(DomainError::ResendCooldown { .. })));
        assert!(flow
            .peek("+821012345678", Purpose::FindId, Channel::Sms)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_invalid_contact_is_rejected() {
        let flow = flow_with(Vec::new());
        assert!(matches!(
            flow.send_code("not-an-email", Purpose::FindId, Channel::Email, Language::English).await,
            Err(DomainError::InvalidContact { channel: Channel::Email })
        ));
        assert!(matches!(
            flow.send_code("12345", Purpose::FindId, Channel::Sms, Language::English).await,
            Err(DomainError::InvalidContact { channel: Channel::Sms })
        ));
    }

    #[tokio::test]
    async fn test_failed_delivery_clears_record() {
        let provider = Arc::new(ScriptedProvider::new("brevo", Channel::Email, Behaviour::FailHttp));
        let flow = flow_with(vec![provider]);

        let result = flow
            .send_code("coach@amusefit.co.kr", Purpose::ResetPassword, Channel::Email, Language::Korean)
            .await;
        assert!(matches!(result, Err(DomainError::Delivery(_))));
        assert!(flow
            .peek("coach@amusefit.co.kr", Purpose::ResetPassword, Channel::Email)
            .await
            .unwrap()
            .is_none());

        // The cooldown does not apply to a code that was never delivered
        let again = flow
            .send_code("coach@amusefit.co.kr", Purpose::ResetPassword, Channel::Email, Language::Korean)
            .await;
        assert!(matches!(again, Err(DomainError::Delivery(_))));
    }
}
