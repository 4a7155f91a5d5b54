use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{RecommendationSink, TripRepository},
    error::AppResult,
    models::{Deal, Feedback, NewTrip, Trip},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Postgres-backed trip repository and recommendation sink
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TripRepository for PgStore {
    async fn load_all(&self) -> AppResult<Vec<Trip>> {
        let trips = sqlx::query_as::<_, Trip>(
            "SELECT id, user_id, city_name, hotel_name, travel_style, budget_range, notes, created_at
             FROM trips
             ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(trips)
    }

    async fn insert(&self, trip: NewTrip) -> AppResult<Trip> {
        let stored = sqlx::query_as::<_, Trip>(
            "INSERT INTO trips (user_id, city_name, hotel_name, travel_style, budget_range, notes, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, now()))
             RETURNING id, user_id, city_name, hotel_name, travel_style, budget_range, notes, created_at",
        )
        .bind(trip.user_id)
        .bind(trip.city_name)
        .bind(trip.hotel_name)
        .bind(trip.travel_style)
        .bind(trip.budget_range)
        .bind(trip.notes)
        .bind(trip.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn active_deals(&self, cities: &[String]) -> AppResult<Vec<Deal>> {
        let deals = sqlx::query_as::<_, Deal>(
            "SELECT id, title, description, city, valid_until, is_active
             FROM deals_offers
             WHERE is_active
               AND valid_until >= CURRENT_DATE
               AND (city IS NULL OR city = ANY($1))
             ORDER BY id",
        )
        .bind(cities)
        .fetch_all(&self.pool)
        .await?;

        Ok(deals)
    }
}

#[async_trait::async_trait]
impl RecommendationSink for PgStore {
    async fn store(
        &self,
        user_id: i64,
        recommendation_type: &str,
        payload: &serde_json::Value,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO user_recommendations (user_id, recommendation_type, recommendation_data)
             VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(recommendation_type)
        .bind(payload.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_feedback(
        &self,
        user_id: i64,
        recommendation_id: i64,
        feedback: Feedback,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE user_recommendations SET feedback = $1 WHERE id = $2 AND user_id = $3",
        )
        .bind(feedback.as_str())
        .bind(recommendation_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
