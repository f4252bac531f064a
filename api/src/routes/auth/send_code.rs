use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use validator::Validate;

use af_core::domain::{Channel, Purpose};
use af_core::services::VerificationStore;
use af_shared::utils::contact::mask_contact;

use crate::dto::{SendCodeResponse, SendEmailCodeRequest, SendSmsCodeRequest};
use crate::handlers::error::{handle_domain_error, handle_validation_errors, message_response, ResponseKind};
use crate::i18n::{language_of, text, Language};

use super::{seconds_until, AppState};

/// Handler for POST /api/auth/send-email-code
///
/// # Request Body
///
/// ```json
/// { "email": "coach@amusefit.co.kr", "purpose": "email_verify" }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// { "success": true, "message": "...", "expiresIn": 600, "resendAfter": 60 }
/// ```
///
/// ## Errors
/// 400 invalid input, 429 resend cooldown, 503 delivery failure
pub async fn send_email_code<S: VerificationStore + 'static>(
    req: HttpRequest,
    state: web::Data<AppState<S>>,
    request: web::Json<SendEmailCodeRequest>,
) -> HttpResponse {
    let lang = language_of(&req);
    if let Err(errors) = request.validate() {
        return handle_validation_errors(&errors, ResponseKind::Send, lang);
    }
    send_code(&state, &request.email, &request.purpose, Channel::Email, lang).await
}

/// Handler for POST /api/auth/send-sms-code
///
/// Same contract as [`send_email_code`] with `phone` instead of `email`.
pub async fn send_sms_code<S: VerificationStore + 'static>(
    req: HttpRequest,
    state: web::Data<AppState<S>>,
    request: web::Json<SendSmsCodeRequest>,
) -> HttpResponse {
    let lang = language_of(&req);
    if let Err(errors) = request.validate() {
        return handle_validation_errors(&errors, ResponseKind::Send, lang);
    }
    send_code(&state, &request.phone, &request.purpose, Channel::Sms, lang).await
}

async fn send_code<S: VerificationStore + 'static>(
    state: &AppState<S>,
    contact: &str,
    purpose: &str,
    channel: Channel,
    lang: Language,
) -> HttpResponse {
    let Ok(purpose) = purpose.parse::<Purpose>() else {
        return message_response(ResponseKind::Send, "validation", "invalid_purpose", lang, &[]);
    };

    match state.flow.send_code(contact, purpose, channel, lang).await {
        Ok(result) => {
            tracing::info!(
                contact = %mask_contact(&result.contact),
                purpose = %purpose,
                channel = %channel,
                provider = %result.delivery.provider_used,
                fallback_used = result.delivery.fallback_used,
                "Verification code sent"
            );

            let key = match channel {
                Channel::Email => "email_code_sent",
                Channel::Sms => "sms_code_sent",
            };
            let now = Utc::now();
            HttpResponse::Ok().json(SendCodeResponse {
                success: true,
                message: text("verification", key, lang, &[]),
                expires_in: seconds_until(result.expires_at, now),
                resend_after: seconds_until(result.next_resend_at, now),
            })
        }
        Err(error) => {
            tracing::warn!(
                contact = %mask_contact(contact),
                purpose = %purpose,
                channel = %channel,
                error_code = error.code(),
                "Failed to send verification code"
            );
            handle_domain_error(&error, ResponseKind::Send, lang)
        }
    }
}
