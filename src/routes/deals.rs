use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::Deal,
    routes::AppState,
    services::TripDataset,
};

#[derive(Debug, Serialize)]
pub struct DealsResponse {
    pub deals: Vec<Deal>,
}

#[derive(Debug, Serialize)]
pub struct PackingTipsResponse {
    pub packing_tips: Vec<String>,
}

/// Handler for personalized deals
///
/// Active, unexpired deals for the cities the user has visited, plus deals
/// that apply everywhere.
pub async fn personalized_deals(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<DealsResponse>> {
    let trips = state.trips.load_all().await?;
    let dataset = TripDataset::new(&trips);
    let cities: Vec<String> = dataset
        .user_cities(user_id)
        .into_iter()
        .map(str::to_owned)
        .collect();

    let deals = state.trips.active_deals(&cities).await?;
    Ok(Json(DealsResponse { deals }))
}

/// Handler for packing tips
///
/// Tips reference the user's most recent destination; users with no trips
/// get a 404.
pub async fn packing_tips(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<PackingTipsResponse>> {
    let trips = state.trips.load_all().await?;
    let dataset = TripDataset::new(&trips);

    let recent = dataset
        .latest_trip(user_id)
        .ok_or_else(|| AppError::NotFound(format!("No recent trips found for user {user_id}")))?;
    let destination = recent.city().unwrap_or("your destination");

    Ok(Json(PackingTipsResponse {
        packing_tips: vec![
            format!("Pack for your trip to {destination}!"),
            "Don't forget your essentials.".to_string(),
        ],
    }))
}
