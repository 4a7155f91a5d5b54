use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    cached,
    db::{CacheKey, RecommendationSink},
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Feedback, Recommendations},
    routes::AppState,
    services::recommender,
};

/// How long a computed payload stays cached. Keys are scoped to the data
/// version, so this only bounds how long abandoned versions linger.
const RECOMMENDATIONS_TTL: u64 = 300;

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub success: bool,
    pub recommendations: Recommendations,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub recommendation_id: i64,
    pub feedback: Feedback,
}

/// Handler for per-user recommendations
pub async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<RecommendationsResponse>> {
    tracing::info!(request_id = %request_id, user_id, "Generating recommendations");

    let recommendations = if let Some(cache) = &state.cache {
        let key = CacheKey::Recommendations {
            version: state.current_data_version(),
            user_id,
        };
        cached!(cache, key, RECOMMENDATIONS_TTL, compute_and_record(&state, user_id))?
    } else {
        compute_and_record(&state, user_id).await?
    };

    Ok(Json(RecommendationsResponse {
        success: true,
        recommendations,
    }))
}

/// Compose the payload and record the recommendation events.
async fn compute_and_record(state: &AppState, user_id: i64) -> AppResult<Recommendations> {
    let recommendations = recommender::recommend_for_user(state.trips.as_ref(), user_id).await;
    record_events(state.sink.as_ref(), user_id, &recommendations).await;
    Ok(recommendations)
}

/// Write one `(type, payload)` event per recommendation field.
///
/// Sink failures are logged and swallowed; the payload is still served.
async fn record_events(sink: &dyn RecommendationSink, user_id: i64, recommendations: &Recommendations) {
    let payload = match serde_json::to_value(recommendations) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize recommendations for storage");
            return;
        }
    };
    let Some(fields) = payload.as_object() else {
        return;
    };

    for (recommendation_type, value) in fields {
        if let Err(e) = sink.store(user_id, recommendation_type, value).await {
            tracing::warn!(
                error = %e,
                user_id,
                recommendation_type = %recommendation_type,
                "Failed to record recommendation event"
            );
        }
    }
}

/// Handler for recommendation feedback
pub async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Json(request): Json<FeedbackRequest>,
) -> AppResult<StatusCode> {
    let updated = state
        .sink
        .set_feedback(user_id, request.recommendation_id, request.feedback)
        .await?;

    if updated {
        Ok(StatusCode::OK)
    } else {
        Err(AppError::NotFound(format!(
            "No recommendation {} for user {}",
            request.recommendation_id, user_id
        )))
    }
}
