use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use af_core::domain::{Channel, Purpose};
use af_core::services::{VerificationFlow, VerificationStore, VerifyCodeResult};
use af_shared::utils::contact::mask_contact;

use crate::dto::{VerifiedData, VerifyCodeResponse, VerifyEmailCodeRequest, VerifySmsCodeRequest};
use crate::handlers::error::{
    handle_domain_error, handle_validation_errors, handle_verification_failure, message_response,
    ResponseKind,
};
use crate::i18n::{language_of, text, Language};

use super::AppState;

/// Handler for POST /api/auth/verify-email-code
///
/// ```json
/// { "email": "coach@amusefit.co.kr", "code": "042917", "purpose": "email_verify" }
/// ```
///
/// A correct code answers `{"verified": true, "message": ..., "data": {...}}`.
/// Wrong codes answer 400 with `remainingAttempts`; once the attempts are
/// used up the code is revoked and the answer is 429.
pub async fn verify_email_code<S: VerificationStore + 'static>(
    req: HttpRequest,
    state: web::Data<AppState<S>>,
    request: web::Json<VerifyEmailCodeRequest>,
) -> HttpResponse {
    let lang = language_of(&req);
    if let Err(errors) = request.validate() {
        return handle_validation_errors(&errors, ResponseKind::Verify, lang);
    }
    verify_code(&state, &request.email, &request.code, &request.purpose, Channel::Email, lang).await
}

/// Handler for POST /api/auth/verify-sms-code
pub async fn verify_sms_code<S: VerificationStore + 'static>(
    req: HttpRequest,
    state: web::Data<AppState<S>>,
    request: web::Json<VerifySmsCodeRequest>,
) -> HttpResponse {
    let lang = language_of(&req);
    if let Err(errors) = request.validate() {
        return handle_validation_errors(&errors, ResponseKind::Verify, lang);
    }
    verify_code(&state, &request.phone, &request.code, &request.purpose, Channel::Sms, lang).await
}

async fn verify_code<S: VerificationStore + 'static>(
    state: &AppState<S>,
    contact: &str,
    code: &str,
    purpose: &str,
    channel: Channel,
    lang: Language,
) -> HttpResponse {
    let Ok(purpose) = purpose.parse::<Purpose>() else {
        return message_response(ResponseKind::Verify, "validation", "invalid_purpose", lang, &[]);
    };

    match state.flow.verify_code(contact, purpose, channel, code).await {
        Ok(VerifyCodeResult::Verified { verified_at, expires_at }) => {
            let masked = VerificationFlow::<S>::normalize_contact(contact, channel)
                .map(|normalized| mask_contact(&normalized))
                .unwrap_or_default();
            HttpResponse::Ok().json(VerifyCodeResponse {
                verified: true,
                message: text("verification", "code_verified", lang, &[]),
                data: Some(VerifiedData {
                    contact: masked,
                    purpose,
                    verified_at,
                    expires_at,
                }),
            })
        }
        Ok(VerifyCodeResult::Failed(failure)) => handle_verification_failure(failure, lang),
        Err(error) => handle_domain_error(&error, ResponseKind::Verify, lang),
    }
}
