use actix_web::{web, HttpRequest, HttpResponse};

use af_core::domain::{Channel, Purpose};
use af_core::services::VerificationStore;

use crate::dto::{DevCodeQuery, DevCodeResponse};
use crate::handlers::error::{handle_domain_error, message_response, ResponseKind};
use crate::i18n::{language_of, text};

use super::AppState;

/// Handler for GET /api/auth/dev-get-code?email=&purpose= (or `phone=`)
///
/// Returns the live code so the client can be tested without a working
/// provider. Answers 403 outside development.
pub async fn dev_get_code<S: VerificationStore + 'static>(
    req: HttpRequest,
    state: web::Data<AppState<S>>,
    query: web::Query<DevCodeQuery>,
) -> HttpResponse {
    let lang = language_of(&req);
    let kind = ResponseKind::Send;

    if !state.environment.is_development() {
        tracing::warn!(environment = %state.environment, "Development code lookup refused");
        return message_response(kind, "dev", "disabled", lang, &[]);
    }

    let non_empty = |value: &Option<String>| value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string);
    let (contact, channel) = match (non_empty(&query.email), non_empty(&query.phone)) {
        (Some(email), _) => (email, Channel::Email),
        (None, Some(phone)) => (phone, Channel::Sms),
        (None, None) => return message_response(kind, "dev", "contact_required", lang, &[]),
    };

    let Some(purpose) = query.purpose.as_deref().and_then(|p| p.parse::<Purpose>().ok()) else {
        return message_response(kind, "validation", "invalid_purpose", lang, &[]);
    };

    match state.flow.peek(&contact, purpose, channel).await {
        Ok(Some(snapshot)) => HttpResponse::Ok().json(DevCodeResponse {
            success: true,
            code: Some(snapshot.code),
            message: text("dev", "code_found", lang, &[]),
            time_left: Some(snapshot.time_left),
            attempts: Some(snapshot.attempts),
            verified: Some(snapshot.verified),
        }),
        Ok(None) => HttpResponse::NotFound().json(DevCodeResponse {
            success: false,
            code: None,
            message: text("dev", "code_missing", lang, &[]),
            time_left: None,
            attempts: None,
            verified: None,
        }),
        Err(error) => handle_domain_error(&error, kind, lang),
    }
}
