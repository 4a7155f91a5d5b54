use std::collections::HashMap;

use crate::models::UserProfile;
use crate::services::dataset::TripDataset;

/// Build one content profile per user from the full trip table.
///
/// Lists keep table encounter order and duplicates; a repeat visit is a
/// signal, not noise. Chronology is not enforced here, only the transition
/// model cares about time order.
pub fn build_profiles(dataset: &TripDataset<'_>) -> HashMap<i64, UserProfile> {
    let mut profiles = HashMap::new();
    for user_id in dataset.users() {
        let trips = dataset.user_trips(user_id);
        let profile = UserProfile {
            cities_visited: trips
                .iter()
                .filter_map(|t| t.city())
                .map(str::to_owned)
                .collect(),
            hotels_stayed: trips
                .iter()
                .filter_map(|t| t.hotel())
                .map(str::to_owned)
                .collect(),
            trip_count: trips.len(),
        };
        profiles.insert(user_id, profile);
    }
    profiles
}
