use std::collections::HashSet;

use crate::db::TripRepository;
use crate::models::Recommendations;
use crate::services::dataset::TripDataset;
use crate::services::transitions;

/// Cap on suggestion list lengths in the payload.
pub const MAX_SUGGESTIONS: usize = 5;

/// Compose the recommendation payload for one user from the loaded table.
///
/// A user with no trips gets the default payload: empty suggestion lists,
/// the static tips and deals, and no next-city prediction. All list ordering
/// is first-seen table order, so repeated calls over unchanged data produce
/// identical payloads.
pub fn generate(dataset: &TripDataset<'_>, user_id: i64) -> Recommendations {
    let mut recommendations = Recommendations::default();

    let user_trips = dataset.user_trips(user_id);
    if user_trips.is_empty() {
        return recommendations;
    }

    let user_cities = dataset.user_cities(user_id);
    let user_hotels = dataset.user_hotels(user_id);

    // Cities other travelers have been to that this user has not.
    recommendations.similar_destinations = dataset
        .cities()
        .into_iter()
        .filter(|city| !user_cities.contains(city))
        .take(MAX_SUGGESTIONS)
        .map(str::to_owned)
        .collect();

    // Untried lodgings in cities the user already knows.
    let mut seen = HashSet::new();
    let mut other_hotels = Vec::new();
    for trip in dataset.trips() {
        if other_hotels.len() == MAX_SUGGESTIONS {
            break;
        }
        let (Some(city), Some(hotel)) = (trip.city(), trip.hotel()) else {
            continue;
        };
        if user_cities.contains(city) && !user_hotels.contains(hotel) && seen.insert(hotel) {
            other_hotels.push(hotel.to_owned());
        }
    }
    recommendations.other_hotels = other_hotels;

    recommendations.next_city_recommendation = transitions::next_city(dataset, user_id);

    recommendations
}

/// Load the trip table and compose the payload, degrading on failure.
///
/// A store that cannot be reached yields the default payload instead of an
/// error; recommendation requests never fail outright over missing data.
pub async fn recommend_for_user(repo: &dyn TripRepository, user_id: i64) -> Recommendations {
    match repo.load_all().await {
        Ok(trips) => generate(&TripDataset::new(&trips), user_id),
        Err(e) => {
            tracing::warn!(error = %e, user_id, "Trip table unavailable, serving default payload");
            Recommendations::default()
        }
    }
}
