use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use waypoint_api::config::Config;
use waypoint_api::db::{self, Cache, PgStore};
use waypoint_api::routes::{create_router, AppState, EngineSettings};
use waypoint_api::services::ModelStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Database pool and schema
    let pool = db::create_pool(&config.database_url).await?;
    sqlx::migrate!().run(&pool).await?;

    // Redis-backed payload cache with its background writer
    let redis_client = db::create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = Cache::new(redis_client).await;

    let store = Arc::new(PgStore::new(pool));
    let state = Arc::new(AppState::new(
        store.clone(),
        store,
        ModelStore::new(config.model_path.clone()),
        Some(cache),
        EngineSettings {
            latent_dims: config.latent_dims,
            cluster_count: config.cluster_count,
        },
    ));

    // Serve the last trained snapshot immediately, if one was persisted
    state.restore_models().await;

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Flush pending cache writes before exiting
    cache_writer.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
