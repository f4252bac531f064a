use std::sync::Arc;

use actix_web::{web, HttpServer};
use anyhow::Context;
use tracing::info;

use af_api::app::{build_flow, create_app};
use af_api::logging::init_logging;
use af_api::routes::auth::AppState;
use af_core::services::{DeliveryDispatcher, ExpirySweeper, InMemoryVerificationStore, VerificationStore};
use af_infra::{build_dispatcher, ProviderSettings, RedisClient, RedisVerificationStore};
use af_shared::{AppConfig, StoreBackend};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    init_logging(&config.logging).context("failed to install tracing subscriber")?;

    info!(
        environment = %config.environment,
        store = ?config.cache.backend,
        "Starting AmuseFit verification API"
    );

    let dispatcher = build_dispatcher(&ProviderSettings::from_env(), &config.delivery)
        .context("failed to build notification providers")?;

    match config.cache.backend {
        StoreBackend::Memory => serve(config, Arc::new(InMemoryVerificationStore::new()), dispatcher).await,
        StoreBackend::Redis => {
            let client = RedisClient::new(config.cache.clone())
                .await
                .context("failed to connect to Redis")?;
            serve(config, Arc::new(RedisVerificationStore::new(client)), dispatcher).await
        }
    }
}

async fn serve<S: VerificationStore + 'static>(
    config: AppConfig,
    store: Arc<S>,
    dispatcher: DeliveryDispatcher,
) -> anyhow::Result<()> {
    let flow = build_flow(store, &config, dispatcher);
    let sweeper = ExpirySweeper::spawn(flow.service().clone(), config.verification.sweep_interval());

    let state = web::Data::new(AppState::new(flow, config.environment));
    let cors = config.cors.clone();
    let bind_address = config.server.bind_address();
    info!("Server will bind to: {}", bind_address);

    let mut server = HttpServer::new(move || create_app(state.clone(), &cors));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    let result = server
        .bind(&bind_address)
        .with_context(|| format!("failed to bind {}", bind_address))?
        .run()
        .await;

    sweeper.stop().await;
    info!("Server stopped");
    result.map_err(Into::into)
}
