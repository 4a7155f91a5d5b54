use std::collections::HashSet;

use crate::models::Trip;

/// In-memory tabular view of the full trip table.
///
/// Borrows the loaded rows and answers the grouping and ordering questions
/// the rest of the engine asks. Row order is table insertion order; only
/// [`TripDataset::chronological`] sorts, and it sorts stably so equal
/// timestamps keep their insertion order.
pub struct TripDataset<'a> {
    trips: &'a [Trip],
}

impl<'a> TripDataset<'a> {
    pub fn new(trips: &'a [Trip]) -> Self {
        Self { trips }
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn trips(&self) -> &[Trip] {
        self.trips
    }

    /// Distinct user ids in first-seen order.
    pub fn users(&self) -> Vec<i64> {
        let mut seen = HashSet::new();
        let mut users = Vec::new();
        for trip in self.trips {
            if seen.insert(trip.user_id) {
                users.push(trip.user_id);
            }
        }
        users
    }

    /// One user's trips in table encounter order.
    pub fn user_trips(&self, user_id: i64) -> Vec<&'a Trip> {
        self.trips.iter().filter(|t| t.user_id == user_id).collect()
    }

    /// One user's travel sequence: trips ordered by `created_at` ascending,
    /// ties broken by insertion order.
    pub fn chronological(&self, user_id: i64) -> Vec<&'a Trip> {
        let mut sequence = self.user_trips(user_id);
        sequence.sort_by_key(|t| t.created_at);
        sequence
    }

    /// The user's most recent trip.
    ///
    /// Scans with a strictly-greater comparison, so among trips sharing the
    /// latest timestamp the first-inserted one wins.
    pub fn latest_trip(&self, user_id: i64) -> Option<&'a Trip> {
        let mut latest: Option<&Trip> = None;
        for trip in self.trips.iter().filter(|t| t.user_id == user_id) {
            match latest {
                Some(current) if trip.created_at <= current.created_at => {}
                _ => latest = Some(trip),
            }
        }
        latest
    }

    /// Distinct non-empty city names across all users, first-seen order.
    pub fn cities(&self) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        let mut cities = Vec::new();
        for trip in self.trips {
            if let Some(city) = trip.city() {
                if seen.insert(city) {
                    cities.push(city);
                }
            }
        }
        cities
    }

    /// The set of cities one user has visited.
    pub fn user_cities(&self, user_id: i64) -> HashSet<&'a str> {
        self.trips
            .iter()
            .filter(|t| t.user_id == user_id)
            .filter_map(|t| t.city())
            .collect()
    }

    /// The set of lodgings one user has stayed at.
    pub fn user_hotels(&self, user_id: i64) -> HashSet<&'a str> {
        self.trips
            .iter()
            .filter(|t| t.user_id == user_id)
            .filter_map(|t| t.hotel())
            .collect()
    }
}
