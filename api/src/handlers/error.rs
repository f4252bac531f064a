//! Mapping of domain errors and verification failures to HTTP responses
//!
//! | outcome                                   | status |
//! |-------------------------------------------|--------|
//! | validation, `NotFound`, `Expired`, `Mismatch` | 400 |
//! | resend cooldown, `AttemptsExceeded`       | 429    |
//! | delivery failure                          | 503    |
//! | store or internal failure                 | 500    |

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::{json, Map, Value};
use validator::ValidationErrors;

use af_core::domain::Channel;
use af_core::errors::DomainError;
use af_core::services::VerificationFailure;

use crate::i18n::{format_message, get_message, Language};

/// Which boolean the response body leads with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// `{"success": false, ...}`
    Send,
    /// `{"verified": false, ...}`
    Verify,
}

impl ResponseKind {
    fn flag(&self) -> &'static str {
        match self {
            ResponseKind::Send => "success",
            ResponseKind::Verify => "verified",
        }
    }
}

/// Body field carrying a numeric message parameter
fn body_field(param: &str) -> Option<&'static str> {
    match param {
        "seconds" => Some("retryAfter"),
        "remaining" => Some("remainingAttempts"),
        _ => None,
    }
}

/// Failure body built from a message catalog entry
pub fn message_response(
    kind: ResponseKind,
    category: &str,
    key: &str,
    lang: Language,
    params: &[(&str, String)],
) -> HttpResponse {
    let (code, template, status) = get_message(category, key, lang).unwrap_or_else(|| {
        (
            "INTERNAL_ERROR".to_string(),
            key.to_string(),
            StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        )
    });
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut body = Map::new();
    body.insert(kind.flag().to_string(), json!(false));
    body.insert("message".to_string(), json!(format_message(&template, params)));
    body.insert("error".to_string(), json!(code));
    for (name, value) in params {
        if let (Some(field), Ok(number)) = (body_field(name), value.parse::<u64>()) {
            body.insert(field.to_string(), json!(number));
        }
    }

    HttpResponse::build(status).json(Value::Object(body))
}

/// Handle domain errors with language support
pub fn handle_domain_error(error: &DomainError, kind: ResponseKind, lang: Language) -> HttpResponse {
    match error {
        DomainError::Validation { message } => {
            tracing::debug!(reason = %message, "Rejected request");
            message_response(kind, "validation", "invalid_request", lang, &[])
        }
        DomainError::InvalidContact { channel } => {
            let key = match channel {
                Channel::Email => "invalid_email",
                Channel::Sms => "invalid_phone",
            };
            message_response(kind, "validation", key, lang, &[])
        }
        DomainError::ResendCooldown { retry_after_secs } => message_response(
            kind,
            "verification",
            "resend_cooldown",
            lang,
            &[("seconds", retry_after_secs.to_string())],
        ),
        DomainError::Delivery(e) => {
            tracing::error!(error = %e, attempts = ?e.attempts(), "Delivery failed");
            message_response(kind, "delivery", "delivery_failed", lang, &[])
        }
        DomainError::Store(e) => {
            tracing::error!(error = %e, "Verification store failure");
            message_response(kind, "general", "store_unavailable", lang, &[])
        }
        DomainError::Internal { message } => {
            tracing::error!(error = %message, "Internal error");
            message_response(kind, "general", "internal_error", lang, &[])
        }
    }
}

/// `{"verified": false, ...}` for a failed verification
pub fn handle_verification_failure(failure: VerificationFailure, lang: Language) -> HttpResponse {
    let kind = ResponseKind::Verify;
    match failure {
        VerificationFailure::NotFound => message_response(kind, "verification", "code_not_found", lang, &[]),
        VerificationFailure::Expired => message_response(kind, "verification", "code_expired", lang, &[]),
        VerificationFailure::AttemptsExceeded => {
            message_response(kind, "verification", "attempts_exceeded", lang, &[])
        }
        VerificationFailure::Mismatch { remaining, .. } => message_response(
            kind,
            "verification",
            "code_mismatch",
            lang,
            &[("remaining", remaining.to_string())],
        ),
    }
}

/// 400 naming the first invalid field
pub fn handle_validation_errors(errors: &ValidationErrors, kind: ResponseKind, lang: Language) -> HttpResponse {
    let fields = errors.field_errors();
    let key = ["email", "phone", "code", "purpose"]
        .into_iter()
        .find(|field| fields.contains_key(*field))
        .map(|field| match field {
            "email" => "invalid_email",
            "phone" => "invalid_phone",
            "code" => "invalid_code",
            _ => "invalid_purpose",
        })
        .unwrap_or("invalid_request");

    message_response(kind, "validation", key, lang, &[])
}
