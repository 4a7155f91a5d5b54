use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::{Cache, RecommendationSink, TripRepository};
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};
use crate::services::{ModelStore, TrainedModelBundle};

pub mod deals;
pub mod models;
pub mod recommendations;
pub mod trips;

/// Engine knobs carried from configuration into training runs.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub latent_dims: usize,
    pub cluster_count: usize,
}

/// Shared application state
///
/// The trained bundle lives behind a single-writer/multi-reader lock holding
/// an `Arc` snapshot: training swaps the whole `Arc`, readers clone it, so a
/// request never observes a half-trained model.
pub struct AppState {
    pub trips: Arc<dyn TripRepository>,
    pub sink: Arc<dyn RecommendationSink>,
    pub models: RwLock<Option<Arc<TrainedModelBundle>>>,
    pub model_store: ModelStore,
    pub cache: Option<Cache>,
    /// Bumped on every trip write; scopes cache keys so stale payloads are
    /// never served past the next data load.
    pub data_version: AtomicU64,
    pub engine: EngineSettings,
}

impl AppState {
    pub fn new(
        trips: Arc<dyn TripRepository>,
        sink: Arc<dyn RecommendationSink>,
        model_store: ModelStore,
        cache: Option<Cache>,
        engine: EngineSettings,
    ) -> Self {
        Self {
            trips,
            sink,
            models: RwLock::new(None),
            model_store,
            cache,
            data_version: AtomicU64::new(0),
            engine,
        }
    }

    /// Load the persisted model snapshot into the serving slot, if one
    /// exists. Absence is normal on a fresh deployment.
    pub async fn restore_models(&self) {
        match self.model_store.load() {
            Ok(Some(bundle)) => {
                let version = bundle.version;
                *self.models.write().await = Some(Arc::new(bundle));
                tracing::info!(version, "Restored trained model snapshot");
            }
            Ok(None) => {
                tracing::info!("No trained model snapshot found; training required");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to restore model snapshot");
            }
        }
    }

    /// The bundle currently being served, if any training run has completed.
    pub async fn current_models(&self) -> Option<Arc<TrainedModelBundle>> {
        self.models.read().await.clone()
    }

    pub fn bump_data_version(&self) -> u64 {
        self.data_version.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn current_data_version(&self) -> u64 {
        self.data_version.load(Ordering::Relaxed)
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/trips", post(trips::complete_trip))
        .route("/recommendations/:user_id", get(recommendations::get_recommendations))
        .route(
            "/recommendations/:user_id/feedback",
            post(recommendations::submit_feedback),
        )
        .route("/deals/:user_id", get(deals::personalized_deals))
        .route("/packing-tips/:user_id", get(deals::packing_tips))
        .route("/models/train", post(models::train))
        .route("/users/:user_id/similar", get(models::similar_users))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "healthy", "message": "Recommendation API is running" })),
    )
}
