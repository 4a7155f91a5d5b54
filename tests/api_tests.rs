use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use axum_test::TestServer;
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use waypoint_api::db::{RecommendationSink, TripRepository};
use waypoint_api::error::AppResult;
use waypoint_api::models::{Deal, Feedback, NewTrip, Trip};
use waypoint_api::routes::{create_router, AppState, EngineSettings};
use waypoint_api::services::ModelStore;

/// In-memory trip store and recommendation sink for exercising the full
/// HTTP surface without Postgres.
#[derive(Default)]
struct MemoryStore {
    trips: RwLock<Vec<Trip>>,
    deals: RwLock<Vec<Deal>>,
    events: RwLock<Vec<StoredEvent>>,
    next_trip_id: AtomicI64,
    next_event_id: AtomicI64,
}

struct StoredEvent {
    id: i64,
    user_id: i64,
    recommendation_type: String,
    feedback: Option<Feedback>,
}

impl MemoryStore {
    async fn seed_trip(&self, user_id: i64, city: &str, hotel: &str, minute: i64) {
        let id = self.next_trip_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.trips.write().await.push(Trip {
            id,
            user_id,
            city_name: (!city.is_empty()).then(|| city.to_string()),
            hotel_name: (!hotel.is_empty()).then(|| hotel.to_string()),
            travel_style: None,
            budget_range: None,
            notes: None,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
                + Duration::minutes(minute),
        });
    }

    async fn seed_deal(&self, id: i64, title: &str, city: Option<&str>) {
        self.deals.write().await.push(Deal {
            id,
            title: title.to_string(),
            description: None,
            city: city.map(str::to_owned),
            valid_until: (Utc::now() + Duration::days(30)).date_naive(),
            is_active: true,
        });
    }
}

#[async_trait::async_trait]
impl TripRepository for MemoryStore {
    async fn load_all(&self) -> AppResult<Vec<Trip>> {
        Ok(self.trips.read().await.clone())
    }

    async fn insert(&self, trip: NewTrip) -> AppResult<Trip> {
        let id = self.next_trip_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = Trip {
            id,
            user_id: trip.user_id,
            city_name: trip.city_name,
            hotel_name: trip.hotel_name,
            travel_style: trip.travel_style,
            budget_range: trip.budget_range,
            notes: trip.notes,
            created_at: trip.created_at.unwrap_or_else(Utc::now),
        };
        self.trips.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn active_deals(&self, cities: &[String]) -> AppResult<Vec<Deal>> {
        let today = Utc::now().date_naive();
        Ok(self
            .deals
            .read()
            .await
            .iter()
            .filter(|deal| deal.is_active && deal.valid_until >= today)
            .filter(|deal| match &deal.city {
                Some(city) => cities.contains(city),
                None => true,
            })
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl RecommendationSink for MemoryStore {
    async fn store(
        &self,
        user_id: i64,
        recommendation_type: &str,
        _payload: &Value,
    ) -> AppResult<()> {
        let id = self.next_event_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.events.write().await.push(StoredEvent {
            id,
            user_id,
            recommendation_type: recommendation_type.to_string(),
            feedback: None,
        });
        Ok(())
    }

    async fn set_feedback(
        &self,
        user_id: i64,
        recommendation_id: i64,
        feedback: Feedback,
    ) -> AppResult<bool> {
        let mut events = self.events.write().await;
        match events
            .iter_mut()
            .find(|e| e.id == recommendation_id && e.user_id == user_id)
        {
            Some(event) => {
                event.feedback = Some(feedback);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn create_test_server() -> (TestServer, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let model_path =
        std::env::temp_dir().join(format!("waypoint-test-{}.json", uuid::Uuid::new_v4()));
    let state = Arc::new(AppState::new(
        store.clone(),
        store.clone(),
        ModelStore::new(model_path),
        None,
        EngineSettings {
            latent_dims: 5,
            cluster_count: 3,
        },
    ));
    (TestServer::new(create_router(state)).unwrap(), store)
}

#[tokio::test]
async fn test_health_check() {
    let (server, _) = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_trip_completion_returns_recommendations() {
    let (server, store) = create_test_server();

    let response = server
        .post("/api/v1/trips")
        .json(&json!({
            "user_id": 1,
            "trip_data": {
                "city_name": "Paris",
                "hotel_name": "Hotel Ritz Paris",
                "travel_style": "leisure",
                "budget_range": "medium"
            }
        }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["trip"]["user_id"], 1);
    assert_eq!(body["trip"]["city_name"], "Paris");

    let recommendations = &body["recommendations"];
    assert!(recommendations["similar_destinations"].as_array().unwrap().is_empty());
    assert!(!recommendations["generic_packing_tips"].as_array().unwrap().is_empty());
    assert!(recommendations["next_city_recommendation"].is_null());

    assert_eq!(store.trips.read().await.len(), 1);
}

#[tokio::test]
async fn test_trip_completion_rejects_invalid_user() {
    let (server, _) = create_test_server();

    let response = server
        .post("/api/v1/trips")
        .json(&json!({
            "user_id": 0,
            "trip_data": { "city_name": "Paris" }
        }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommendations_for_user_without_trips() {
    let (server, store) = create_test_server();
    store.seed_trip(2, "Rome", "HotelB", 0).await;

    let response = server.get("/api/v1/recommendations/1").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    let rec = &body["recommendations"];
    assert!(rec["similar_destinations"].as_array().unwrap().is_empty());
    assert!(rec["other_hotels"].as_array().unwrap().is_empty());
    assert_eq!(rec["generic_packing_tips"].as_array().unwrap().len(), 2);
    assert_eq!(rec["generic_deals"].as_array().unwrap().len(), 2);
    assert!(rec["next_city_recommendation"].is_null());
}

#[tokio::test]
async fn test_recommendations_full_payload() {
    let (server, store) = create_test_server();
    // User 1 ends in Rome; two other travelers went Rome -> Milan.
    store.seed_trip(1, "Paris", "HotelA", 0).await;
    store.seed_trip(1, "Rome", "HotelB", 1).await;
    store.seed_trip(2, "Rome", "HotelC", 2).await;
    store.seed_trip(2, "Milan", "HotelD", 3).await;
    store.seed_trip(3, "Rome", "HotelB", 4).await;
    store.seed_trip(3, "Milan", "HotelE", 5).await;

    let response = server.get("/api/v1/recommendations/1").await;
    response.assert_status_ok();

    let body: Value = response.json();
    let rec = &body["recommendations"];

    // Milan is the only unvisited city.
    assert_eq!(rec["similar_destinations"], json!(["Milan"]));
    // HotelC is in Rome (visited) and untried; HotelB is already known and
    // the Milan hotels are in an unvisited city.
    assert_eq!(rec["other_hotels"], json!(["HotelC"]));
    // Both observed transitions out of Rome lead to Milan.
    assert_eq!(rec["next_city_recommendation"], "Milan");

    // One event per payload field was recorded through the sink.
    let events = store.events.read().await;
    assert_eq!(events.len(), 5);
    assert!(events
        .iter()
        .any(|e| e.recommendation_type == "similar_destinations"));
}

#[tokio::test]
async fn test_feedback_flow() {
    let (server, store) = create_test_server();
    store.seed_trip(1, "Paris", "HotelA", 0).await;

    // Generate recommendations so events exist to attach feedback to.
    server.get("/api/v1/recommendations/1").await.assert_status_ok();
    let first_event_id = store.events.read().await[0].id;

    let response = server
        .post("/api/v1/recommendations/1/feedback")
        .json(&json!({
            "recommendation_id": first_event_id,
            "feedback": "like"
        }))
        .await;
    response.assert_status_ok();
    assert_eq!(
        store.events.read().await[0].feedback,
        Some(Feedback::Like)
    );

    // Unknown event id is a 404.
    let response = server
        .post("/api/v1/recommendations/1/feedback")
        .json(&json!({
            "recommendation_id": 9999,
            "feedback": "dislike"
        }))
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_similar_users_requires_training() {
    let (server, store) = create_test_server();
    store.seed_trip(1, "Paris", "HotelA", 0).await;

    let response = server.get("/api/v1/users/1/similar").await;
    response.assert_status(axum::http::StatusCode::CONFLICT);

    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("train"));
}

#[tokio::test]
async fn test_train_then_similar_users() {
    let (server, store) = create_test_server();
    // Users 1 and 2 travel identically; user 3 does not.
    store.seed_trip(1, "Paris", "HotelA", 0).await;
    store.seed_trip(1, "Rome", "HotelB", 1).await;
    store.seed_trip(2, "Paris", "HotelA", 2).await;
    store.seed_trip(2, "Rome", "HotelB", 3).await;
    store.seed_trip(3, "Tokyo", "HotelC", 4).await;

    let response = server.post("/api/v1/models/train").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["version"], 1);
    assert_eq!(body["trips"], 5);
    assert_eq!(body["users"], 3);

    let response = server.get("/api/v1/users/1/similar").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let similar = body["similar_users"].as_array().unwrap();
    assert_eq!(similar.len(), 2);
    assert_eq!(similar[0]["user_id"], 2);
    assert!(body["cluster"].is_number());

    // Users outside the training table are a 404.
    let response = server.get("/api/v1/users/99/similar").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);

    // Retraining bumps the snapshot version.
    let response = server.post("/api/v1/models/train").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["version"], 2);
}

#[tokio::test]
async fn test_train_with_empty_table_is_rejected() {
    let (server, _) = create_test_server();
    let response = server.post("/api/v1/models/train").await;
    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_packing_tips_reference_latest_destination() {
    let (server, store) = create_test_server();
    store.seed_trip(1, "Paris", "HotelA", 0).await;
    store.seed_trip(1, "Rome", "HotelB", 5).await;

    let response = server.get("/api/v1/packing-tips/1").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let tips = body["packing_tips"].as_array().unwrap();
    assert!(tips[0].as_str().unwrap().contains("Rome"));

    let response = server.get("/api/v1/packing-tips/42").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_personalized_deals_filter_by_visited_cities() {
    let (server, store) = create_test_server();
    store.seed_trip(1, "Paris", "HotelA", 0).await;
    store.seed_deal(1, "Paris weekend offer", Some("Paris")).await;
    store.seed_deal(2, "Tokyo flight sale", Some("Tokyo")).await;
    store.seed_deal(3, "Global travel insurance", None).await;

    let response = server.get("/api/v1/deals/1").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let titles: Vec<&str> = body["deals"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["title"].as_str().unwrap())
        .collect();

    assert!(titles.contains(&"Paris weekend offer"));
    assert!(titles.contains(&"Global travel insurance"));
    assert!(!titles.contains(&"Tokyo flight sale"));
}

#[tokio::test]
async fn test_request_id_echoed_on_responses() {
    let (server, _) = create_test_server();
    let response = server.get("/health").await;
    assert!(response.headers().get("x-request-id").is_some());
}
