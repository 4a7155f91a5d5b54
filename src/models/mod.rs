use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Packing advice returned with every recommendation payload.
///
/// Placeholder strings for a future rules engine; they do not depend on the
/// user or the trip table.
pub const PACKING_TIPS: [&str; 2] = [
    "Pack according to the weather of your destination city.",
    "Keep your travel documents and essentials handy.",
];

/// Deal advice returned with every recommendation payload.
pub const TRAVEL_DEALS: [&str; 2] = [
    "Check for last-minute hotel deals in your destination city.",
    "Look for bundled offers with flights and hotels.",
];

/// One historical visit by a user.
///
/// Trips belonging to one user, ordered by `created_at` ascending (ties broken
/// by insertion order, i.e. by `id`), define that user's travel sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Trip {
    pub id: i64,
    pub user_id: i64,
    pub city_name: Option<String>,
    pub hotel_name: Option<String>,
    pub travel_style: Option<String>,
    pub budget_range: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    /// The destination city, if recorded and non-blank.
    pub fn city(&self) -> Option<&str> {
        self.city_name.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// The lodging, if recorded and non-blank.
    pub fn hotel(&self) -> Option<&str> {
        self.hotel_name.as_deref().filter(|h| !h.trim().is_empty())
    }
}

/// A trip as submitted by the client, before the store assigns it an id.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTrip {
    pub user_id: i64,
    pub city_name: Option<String>,
    pub hotel_name: Option<String>,
    pub travel_style: Option<String>,
    pub budget_range: Option<String>,
    pub notes: Option<String>,
    /// Defaults to the insertion time when absent.
    pub created_at: Option<DateTime<Utc>>,
}

/// The recommendation payload served to clients.
///
/// Field names are the wire contract; mobile clients deserialize this shape
/// directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendations {
    /// Cities present in the trip table that the user has not visited (≤ 5).
    pub similar_destinations: Vec<String>,
    /// Lodgings in cities the user has visited but not stayed at (≤ 5).
    pub other_hotels: Vec<String>,
    pub generic_packing_tips: Vec<String>,
    pub generic_deals: Vec<String>,
    /// Most probable next destination, when the transition table has one.
    pub next_city_recommendation: Option<String>,
}

impl Default for Recommendations {
    /// The degraded/no-history payload: empty suggestion lists, the static
    /// tips and deals, and no next-city prediction.
    fn default() -> Self {
        Self {
            similar_destinations: Vec::new(),
            other_hotels: Vec::new(),
            generic_packing_tips: PACKING_TIPS.iter().map(|t| t.to_string()).collect(),
            generic_deals: TRAVEL_DEALS.iter().map(|d| d.to_string()).collect(),
            next_city_recommendation: None,
        }
    }
}

/// User reaction to a stored recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Like,
    Dislike,
    Neutral,
}

impl Feedback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feedback::Like => "like",
            Feedback::Dislike => "dislike",
            Feedback::Neutral => "neutral",
        }
    }
}

impl Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An active promotion applicable to one city, or to all cities when `city`
/// is absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Deal {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub city: Option<String>,
    pub valid_until: NaiveDate,
    pub is_active: bool,
}

/// Derived, read-only snapshot of one user's travel history.
///
/// Lists preserve table encounter order and duplicates; repeat visits are
/// meaningful. Rebuilt fully on every training run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserProfile {
    pub cities_visited: Vec<String>,
    pub hotels_stayed: Vec<String>,
    pub trip_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_city_filters_blank_values() {
        let mut trip = Trip {
            id: 1,
            user_id: 7,
            city_name: Some("Paris".to_string()),
            hotel_name: Some("   ".to_string()),
            travel_style: None,
            budget_range: None,
            notes: None,
            created_at: Utc::now(),
        };
        assert_eq!(trip.city(), Some("Paris"));
        assert_eq!(trip.hotel(), None);

        trip.city_name = Some(String::new());
        assert_eq!(trip.city(), None);
    }

    #[test]
    fn test_default_payload_keeps_static_advice() {
        let rec = Recommendations::default();
        assert!(rec.similar_destinations.is_empty());
        assert!(rec.other_hotels.is_empty());
        assert_eq!(rec.generic_packing_tips.len(), PACKING_TIPS.len());
        assert_eq!(rec.generic_deals.len(), TRAVEL_DEALS.len());
        assert_eq!(rec.next_city_recommendation, None);
    }

    #[test]
    fn test_recommendations_wire_keys() {
        let rec = Recommendations::default();
        let json = serde_json::to_value(&rec).unwrap();
        let obj = json.as_object().unwrap();
        for key in [
            "similar_destinations",
            "other_hotels",
            "generic_packing_tips",
            "generic_deals",
            "next_city_recommendation",
        ] {
            assert!(obj.contains_key(key), "missing wire key {key}");
        }
        assert!(json["next_city_recommendation"].is_null());
    }

    #[test]
    fn test_feedback_serde_lowercase() {
        let json = serde_json::to_string(&Feedback::Dislike).unwrap();
        assert_eq!(json, r#""dislike""#);

        let parsed: Feedback = serde_json::from_str(r#""like""#).unwrap();
        assert_eq!(parsed, Feedback::Like);
        assert_eq!(parsed.to_string(), "like");
    }
}
