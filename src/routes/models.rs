use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    routes::AppState,
    services::{model_store::SimilarUser, TrainedModelBundle},
};

/// How many similar users a lookup returns.
const MAX_SIMILAR_USERS: usize = 5;

#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub success: bool,
    pub version: u64,
    pub trained_at: DateTime<Utc>,
    pub trips: usize,
    pub users: usize,
    pub latent_dims: usize,
    pub clusters: usize,
}

#[derive(Debug, Serialize)]
pub struct SimilarUsersResponse {
    pub user_id: i64,
    pub cluster: Option<usize>,
    pub model_version: u64,
    pub similar_users: Vec<SimilarUser>,
}

/// Handler for model training
///
/// Runs the full pipeline over the current table, persists the snapshot, and
/// swaps it into the serving slot. A store failure here is structural and
/// propagates, unlike the degrading recommendation path.
pub async fn train(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<TrainResponse>> {
    tracing::info!(request_id = %request_id, "Training recommendation models");

    let trips = state.trips.load_all().await?;
    let next_version = state
        .current_models()
        .await
        .map(|bundle| bundle.version)
        .unwrap_or(0)
        + 1;

    let bundle = TrainedModelBundle::train(
        &trips,
        state.engine.latent_dims,
        state.engine.cluster_count,
        next_version,
    )?;
    state.model_store.save(&bundle)?;

    let response = TrainResponse {
        success: true,
        version: bundle.version,
        trained_at: bundle.trained_at,
        trips: trips.len(),
        users: bundle.profiles.len(),
        latent_dims: bundle.collaborative.latent_dims(),
        clusters: bundle.clustering.clusters(),
    };

    *state.models.write().await = Some(Arc::new(bundle));
    tracing::info!(
        request_id = %request_id,
        version = response.version,
        trips = response.trips,
        "Model snapshot trained and swapped in"
    );

    Ok(Json(response))
}

/// Handler for similar-user lookups
///
/// Served from the trained similarity matrix; callers must train first.
pub async fn similar_users(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<SimilarUsersResponse>> {
    let bundle = state
        .current_models()
        .await
        .ok_or(AppError::ModelNotTrained)?;

    let similar = bundle
        .similar_users(user_id, MAX_SIMILAR_USERS)
        .ok_or_else(|| AppError::NotFound(format!("No trip history found for user {user_id}")))?;

    Ok(Json(SimilarUsersResponse {
        user_id,
        cluster: bundle.cluster_of(user_id),
        model_version: bundle.version,
        similar_users: similar,
    }))
}
