//! Folio API Server Entry Point
//!
//! Loads configuration, connects the store, cache and third-party
//! collaborators, then serves the Axum router until Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;

use folio_api::jobs::{limiter_sweep_task, LimiterSweepConfig};
use folio_api::services::{
    CloudinaryConfig, CloudinaryProvider, ImageProvider, ImageService, OpenRouterSummarizer,
    SummarizerConfig, TestimonySummarizer,
};
use folio_api::telemetry::{init_tracing, TelemetryConfig};
use folio_api::state::build_cache_store;
use folio_api::{
    create_api_router, ApiConfig, ApiError, ApiResult, AppState, AuthConfig, DbClient, DbConfig,
    Repositories, StoreMode,
};
use folio_storage::RedisConfig;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> ApiResult<()> {
    // A missing .env file is fine; the environment may already be set.
    let _ = dotenvy::dotenv();

    let telemetry_config = TelemetryConfig::from_env();
    init_tracing(&telemetry_config)?;

    let api_config = ApiConfig::from_env();
    let auth_config = AuthConfig::from_env();
    auth_config.validate_for_production()?;

    let repos = match api_config.store_mode {
        StoreMode::Postgres => {
            let db = DbClient::from_config(&DbConfig::from_env())?;
            db.ensure_schema().await?;
            tracing::info!(pool_size = db.pool_size(), "Connected to PostgreSQL");
            Repositories::postgres(db)
        }
        StoreMode::Memory => {
            tracing::warn!("FOLIO_STORE=memory: content is lost on restart");
            Repositories::in_memory()
        }
    };

    let cache = build_cache_store(api_config.cache_backend, &RedisConfig::from_env()).await;
    tracing::info!(backend = cache.backend_name(), "Cache store ready");

    let summarizer: Option<Arc<dyn TestimonySummarizer>> =
        match OpenRouterSummarizer::from_config(&SummarizerConfig::from_env())? {
            Some(provider) => Some(Arc::new(provider)),
            None => {
                tracing::warn!("OPENROUTER_APIKEY not set, testimonies will have no summary");
                None
            }
        };

    let image_provider: Option<Arc<dyn ImageProvider>> = match CloudinaryConfig::from_env() {
        Some(config) => Some(Arc::new(CloudinaryProvider::new(config)?)),
        None => {
            tracing::warn!("Cloudinary not configured, image uploads are disabled");
            None
        }
    };

    let state = AppState::new(
        api_config.clone(),
        auth_config,
        cache,
        repos,
        summarizer,
        ImageService::new(image_provider),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweep = tokio::spawn(limiter_sweep_task(
        state.limiters.all(),
        LimiterSweepConfig::from_env(),
        shutdown_rx,
    ));

    let app = create_api_router(state);
    let addr = api_config.socket_addr();
    tracing::info!(%addr, service = %telemetry_config.service_name, "Starting Folio API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutdown signal received");
    })
    .await
    .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = sweep.await {
        tracing::warn!(error = %e, "Limiter sweep task ended abnormally");
    }

    Ok(())
}
