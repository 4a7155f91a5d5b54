use std::collections::HashMap;

use crate::services::dataset::TripDataset;

/// First-order city-to-city transition statistics mined across all users.
///
/// A transition `(A, B)` is recorded once for every pair of consecutive
/// trips of the same user, in `created_at` order, where both cities are
/// present. Transitions never cross user boundaries.
#[derive(Debug, Default)]
pub struct TransitionTable {
    /// Successor counts per origin city. The inner vector preserves the
    /// order successors were first observed, which fixes tie-breaking.
    counts: HashMap<String, Vec<(String, u32)>>,
}

impl TransitionTable {
    /// Build the global table from every user's chronological sequence.
    pub fn build(dataset: &TripDataset<'_>) -> Self {
        let mut table = Self::default();
        for user_id in dataset.users() {
            let sequence = dataset.chronological(user_id);
            for pair in sequence.windows(2) {
                if let (Some(from), Some(to)) = (pair[0].city(), pair[1].city()) {
                    table.record(from, to);
                }
            }
        }
        table
    }

    fn record(&mut self, from: &str, to: &str) {
        let successors = self.counts.entry(from.to_string()).or_default();
        match successors.iter_mut().find(|(city, _)| city == to) {
            Some((_, count)) => *count += 1,
            None => successors.push((to.to_string(), 1)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Observed count for one specific transition.
    pub fn count(&self, from: &str, to: &str) -> u32 {
        self.counts
            .get(from)
            .and_then(|successors| {
                successors
                    .iter()
                    .find(|(city, _)| city == to)
                    .map(|(_, count)| *count)
            })
            .unwrap_or(0)
    }

    /// The most frequent successor of `from`, ties going to the successor
    /// observed first.
    pub fn most_likely(&self, from: &str) -> Option<&str> {
        let successors = self.counts.get(from)?;
        let mut best: Option<(&str, u32)> = None;
        for (city, count) in successors {
            match best {
                Some((_, best_count)) if *count <= best_count => {}
                _ => best = Some((city, *count)),
            }
        }
        best.map(|(city, _)| city)
    }
}

/// Predict the city a user is most likely to visit next.
///
/// Takes the user's most recent trip, then asks the global transition table
/// for the most frequent successor of that city. Returns `None` when the
/// user has no trips, the latest trip has no city, or nothing transitions
/// out of it.
pub fn next_city(dataset: &TripDataset<'_>, user_id: i64) -> Option<String> {
    let latest = dataset.latest_trip(user_id)?;
    let current = latest.city()?;
    TransitionTable::build(dataset)
        .most_likely(current)
        .map(str::to_owned)
}
