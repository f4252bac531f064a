//! Application state and factory
//!
//! Wires the verification flow from configuration and builds the Actix-web
//! application around it.

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{error, middleware::Logger, web, App, HttpRequest, HttpResponse};

use af_core::services::{
    DeliveryDispatcher, VerificationFlow, VerificationService, VerificationServiceConfig,
    VerificationStore,
};
use af_shared::{AppConfig, CorsConfig};

use crate::handlers::error::{message_response, ResponseKind};
use crate::i18n::language_of;
use crate::middleware::cors::create_cors;
use crate::routes::auth::{
    dev_code::dev_get_code,
    send_code::{send_email_code, send_sms_code},
    verify_code::{verify_email_code, verify_sms_code},
    AppState,
};

/// Request bodies are small JSON objects
const JSON_LIMIT: usize = 16 * 1024;

/// Build the send/verify flow over `store` with lifetimes from `config`
pub fn build_flow<S: VerificationStore>(
    store: Arc<S>,
    config: &AppConfig,
    dispatcher: DeliveryDispatcher,
) -> Arc<VerificationFlow<S>> {
    let service = Arc::new(VerificationService::new(
        store,
        VerificationServiceConfig::from(&config.verification),
    ));
    Arc::new(VerificationFlow::new(
        service,
        Arc::new(dispatcher),
        config.verification.email_ttl(),
        config.verification.sms_ttl(),
    ))
}

/// Create and configure the application
pub fn create_app<S>(
    app_state: web::Data<AppState<S>>,
    cors: &CorsConfig,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
>
where
    S: VerificationStore + 'static,
{
    App::new()
        .app_data(app_state)
        .app_data(json_config())
        .wrap(Logger::default())
        .wrap(create_cors(cors))
        .route("/health", web::get().to(health_check))
        .service(web::scope("/api/auth").configure(configure_auth::<S>))
        .default_service(web::route().to(not_found))
}

/// Verification routes under `/api/auth`
pub fn configure_auth<S: VerificationStore + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/send-email-code", web::post().to(send_email_code::<S>))
        .route("/verify-email-code", web::post().to(verify_email_code::<S>))
        .route("/send-sms-code", web::post().to(send_sms_code::<S>))
        .route("/verify-sms-code", web::post().to(verify_sms_code::<S>))
        .route("/dev-get-code", web::get().to(dev_get_code::<S>));
}

/// Malformed JSON answers in the same shape as a failed validation
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, req: &HttpRequest| {
            tracing::debug!(error = %err, path = %req.path(), "Rejected request body");
            let kind = if req.path().contains("verify") {
                ResponseKind::Verify
            } else {
                ResponseKind::Send
            };
            let response = message_response(kind, "validation", "invalid_request", language_of(req), &[]);
            error::InternalError::from_response(err, response).into()
        })
}

/// Health check endpoint handler
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "amusefit-verification",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn not_found(req: HttpRequest) -> HttpResponse {
    message_response(ResponseKind::Send, "general", "not_found", language_of(&req), &[])
}
