/// Storage abstractions for the recommendation core
///
/// The engine only ever needs "load every trip" and "record a computed
/// recommendation"; everything else about the relational store is incidental.
/// Keeping both behind traits lets the core and its handlers run against an
/// in-memory store in tests, with the Postgres implementations wired in at
/// the binary edge.
use crate::{
    error::AppResult,
    models::{Deal, Feedback, NewTrip, Trip},
};

pub mod postgres;
pub mod redis;

pub use postgres::create_pool;
pub use postgres::PgStore;
pub use redis::create_redis_client;
pub use redis::Cache;
pub use redis::CacheKey;

/// Readable collection of trip records
///
/// `load_all` returns every trip in insertion order; the engine recomputes
/// from the full table on each call, so no pagination or filtering contract
/// is offered.
#[async_trait::async_trait]
pub trait TripRepository: Send + Sync {
    /// Load the entire trip table, oldest insertion first.
    async fn load_all(&self) -> AppResult<Vec<Trip>>;

    /// Insert one completed trip and return the stored row.
    async fn insert(&self, trip: NewTrip) -> AppResult<Trip>;

    /// Active, unexpired deals applicable to any of the given cities, or to
    /// all cities.
    async fn active_deals(&self, cities: &[String]) -> AppResult<Vec<Deal>>;
}

/// Sink for computed recommendation payloads
///
/// One `(type, payload)` pair per recommendation field; the core only cares
/// about success or failure of the write.
#[async_trait::async_trait]
pub trait RecommendationSink: Send + Sync {
    /// Record one recommendation event for a user.
    async fn store(
        &self,
        user_id: i64,
        recommendation_type: &str,
        payload: &serde_json::Value,
    ) -> AppResult<()>;

    /// Attach feedback to a previously stored event. Returns `false` when no
    /// matching event exists for the user.
    async fn set_feedback(
        &self,
        user_id: i64,
        recommendation_id: i64,
        feedback: Feedback,
    ) -> AppResult<bool>;
}
