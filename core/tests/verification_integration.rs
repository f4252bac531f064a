//! Integration tests for the verification workflow through the public API

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use af_core::errors::{DomainError, ProviderError};
use af_core::services::{
    DeliveryDispatcher, InMemoryVerificationStore, NotificationProvider, RenderedMessage,
    VerificationFailure, VerificationFlow, VerificationService, VerificationServiceConfig,
};
use af_core::{Channel, Purpose};
use af_shared::Language;

/// Captures messages the way an operator reading the console would
#[derive(Default)]
struct Outbox {
    messages: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl NotificationProvider for Outbox {
    fn name(&self) -> &str {
        "outbox"
    }

    fn supports(&self, _channel: Channel) -> bool {
        true
    }

    async fn send(&self, contact: &str, message: &RenderedMessage) -> Result<String, ProviderError> {
        self.messages
            .lock()
            .unwrap()
            .push((contact.to_string(), message.text.clone()));
        Ok("outbox-1".to_string())
    }
}

fn extract_code(text: &str) -> String {
    text.chars()
        .collect::<Vec<_>>()
        .windows(6)
        .map(|window| window.iter().collect::<String>())
        .find(|candidate| candidate.chars().all(|c| c.is_ascii_digit()))
        .expect("message contains a 6-digit code")
}

fn build_flow(outbox: Arc<Outbox>) -> VerificationFlow<InMemoryVerificationStore> {
    let service = Arc::new(VerificationService::new(
        Arc::new(InMemoryVerificationStore::new()),
        VerificationServiceConfig::default(),
    ));
    let dispatcher = DeliveryDispatcher::new(Duration::from_secs(8)).with_fallback(outbox);
    VerificationFlow::new(
        service,
        Arc::new(dispatcher),
        Duration::from_secs(600),
        Duration::from_secs(300),
    )
}

#[tokio::test]
async fn test_password_reset_by_sms() {
    let outbox = Arc::new(Outbox::default());
    let flow = build_flow(outbox.clone());

    let sent = flow
        .send_code("010-9876-5432", Purpose::ResetPassword, Channel::Sms, Language::Korean)
        .await
        .expect("code is sent");
    assert!(sent.delivery.fallback_used);

    let (contact, text) = outbox.messages.lock().unwrap().last().cloned().unwrap();
    assert_eq!(contact, "01098765432");
    let code = extract_code(&text);

    let result = flow
        .verify_code("01098765432", Purpose::ResetPassword, Channel::Sms, &code)
        .await
        .unwrap();
    assert!(result.is_verified());
    assert!(flow
        .is_verified("010-9876-5432", Purpose::ResetPassword, Channel::Sms)
        .await
        .unwrap());
    assert!(flow
        .consume("01098765432", Purpose::ResetPassword, Channel::Sms)
        .await
        .unwrap());
    assert!(!flow
        .is_verified("01098765432", Purpose::ResetPassword, Channel::Sms)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_second_request_hits_cooldown() {
    let flow = build_flow(Arc::new(Outbox::default()));

    flow.send_code("member@amusefit.co.kr", Purpose::FindId, Channel::Email, Language::English)
        .await
        .unwrap();
    let second = flow
        .send_code("member@amusefit.co.kr", Purpose::FindId, Channel::Email, Language::English)
        .await;

    match second {
        Err(DomainError::ResendCooldown { retry_after_secs }) => {
            assert!(retry_after_secs > 0 && retry_after_secs <= 60)
        }
        other => panic!("expected cooldown, got {:?}", other.map(|sent| sent.contact)),
    }
}

#[tokio::test]
async fn test_wrong_codes_exhaust_attempts() {
    let outbox = Arc::new(Outbox::default());
    let flow = build_flow(outbox.clone());

    flow.send_code("member@amusefit.co.kr", Purpose::EmailVerify, Channel::Email, Language::English)
        .await
        .unwrap();
    let code = extract_code(&outbox.messages.lock().unwrap()[0].1);
    let wrong = if code == "999999" { "000000" } else { "999999" };

    let mut last = None;
    for _ in 0..4 {
        let result = flow
            .verify_code("member@amusefit.co.kr", Purpose::EmailVerify, Channel::Email, wrong)
            .await
            .unwrap();
        last = result.failure();
    }
    assert_eq!(last, Some(VerificationFailure::AttemptsExceeded));
}
