//! Fallback behaviour with real provider adapters
//!
//! The HTTP providers point at a closed local port so every call fails with a
//! transport error; nothing leaves the machine.

use std::sync::Arc;
use std::time::Duration;

use af_core::domain::{Channel, Purpose};
use af_core::errors::{AttemptOutcome, DeliveryError};
use af_core::services::DeliveryDispatcher;
use af_infra::providers::{
    AligoConfig, AligoProvider, BrevoConfig, BrevoProvider, ConsoleProvider, EmailSender,
    NhnConfig, NhnProvider, ResendConfig, ResendProvider,
};
use af_shared::Language;

const UNREACHABLE: &str = "http://127.0.0.1:9";
const TTL: Duration = Duration::from_secs(300);

fn failing_email_chain() -> DeliveryDispatcher {
    let sender = EmailSender::default();
    DeliveryDispatcher::new(Duration::from_secs(2))
        .with_provider(Arc::new(
            BrevoProvider::new(BrevoConfig { api_key: "k".into() }, sender.clone())
                .with_base_url(UNREACHABLE),
        ))
        // no credentials: skipped without a request
        .with_provider(Arc::new(ResendProvider::new(ResendConfig::default(), sender)))
}

#[tokio::test]
async fn test_transport_failures_exhaust_chain() {
    let dispatcher = failing_email_chain();

    let err = dispatcher
        .dispatch("coach@amusefit.co.kr", "482913", Purpose::EmailVerify, Channel::Email, TTL, Language::Korean)
        .await
        .unwrap_err();

    match err {
        DeliveryError::AllProvidersFailed { channel, attempts } => {
            assert_eq!(channel, Channel::Email);
            assert_eq!(attempts.len(), 2);
            assert_eq!(attempts[0].provider, "brevo");
            assert!(matches!(attempts[0].outcome, AttemptOutcome::Failed { .. }));
            assert_eq!(attempts[1].provider, "resend");
            assert_eq!(attempts[1].outcome, AttemptOutcome::Skipped);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_console_fallback_receives_rendered_sms() {
    let console = Arc::new(ConsoleProvider::new().quiet());
    let dispatcher = DeliveryDispatcher::new(Duration::from_secs(2))
        .with_provider(Arc::new(
            AligoProvider::new(AligoConfig {
                api_key: "k".into(),
                user_id: "amusefit".into(),
                sender_number: "0212345678".into(),
                test_mode: true,
            })
            .with_base_url(UNREACHABLE),
        ))
        .with_provider(Arc::new(NhnProvider::new(NhnConfig::default())))
        .with_fallback(console.clone());

    let report = dispatcher
        .dispatch("01012345678", "042917", Purpose::FindId, Channel::Sms, TTL, Language::Korean)
        .await
        .unwrap();

    assert!(report.fallback_used);
    assert_eq!(report.provider_used, "console");
    assert_eq!(report.attempts.len(), 3);

    let captured = console.last_for("01012345678").unwrap();
    assert_eq!(captured.message_id, report.message_id);
    assert_eq!(
        captured.message.text,
        "[AmuseFit] 인증번호 [042917]를 입력해주세요. (5분 내 유효)"
    );
}
