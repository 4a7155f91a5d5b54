use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{NewTrip, Recommendations, Trip},
    routes::AppState,
    services::recommender,
};

#[derive(Debug, Deserialize)]
pub struct CompleteTripRequest {
    pub user_id: i64,
    pub trip_data: TripData,
}

#[derive(Debug, Deserialize)]
pub struct TripData {
    pub city_name: Option<String>,
    pub hotel_name: Option<String>,
    pub travel_style: Option<String>,
    pub budget_range: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct CompleteTripResponse {
    pub success: bool,
    pub trip: Trip,
    pub recommendations: Recommendations,
}

/// Handler for trip completion
///
/// Records the trip, invalidates cached payloads via the data version, and
/// answers with recommendations refreshed against the grown table.
pub async fn complete_trip(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<CompleteTripRequest>,
) -> AppResult<(StatusCode, Json<CompleteTripResponse>)> {
    tracing::info!(
        request_id = %request_id,
        user_id = request.user_id,
        "Recording completed trip"
    );

    if request.user_id <= 0 {
        return Err(AppError::InvalidInput(
            "user_id must be a positive identifier".to_string(),
        ));
    }

    let trip = state
        .trips
        .insert(NewTrip {
            user_id: request.user_id,
            city_name: request.trip_data.city_name,
            hotel_name: request.trip_data.hotel_name,
            travel_style: request.trip_data.travel_style,
            budget_range: request.trip_data.budget_range,
            notes: request.trip_data.notes,
            created_at: request.trip_data.created_at,
        })
        .await?;

    let data_version = state.bump_data_version();
    tracing::debug!(data_version, trip_id = trip.id, "Trip stored");

    let recommendations =
        recommender::recommend_for_user(state.trips.as_ref(), request.user_id).await;

    Ok((
        StatusCode::CREATED,
        Json(CompleteTripResponse {
            success: true,
            trip,
            recommendations,
        }),
    ))
}
