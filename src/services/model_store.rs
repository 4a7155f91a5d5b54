use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{Trip, UserProfile};
use crate::services::clustering::CLUSTER_SEED;
use crate::services::{
    build_profiles, ClusteringModel, CollaborativeModel, EngineError, FeatureSpace, TripDataset,
};

/// Everything a training run produces, as one snapshot.
///
/// Created whole by [`TrainedModelBundle::train`], persisted whole by
/// [`ModelStore`], and swapped whole into serving state. Inference never
/// sees a partially updated bundle.
#[derive(Clone, Serialize, Deserialize)]
pub struct TrainedModelBundle {
    pub version: u64,
    pub trained_at: DateTime<Utc>,
    pub features: FeatureSpace,
    pub collaborative: CollaborativeModel,
    pub clustering: ClusteringModel,
    pub profiles: HashMap<i64, UserProfile>,
    /// Owner of each row of the (trip-indexed) feature matrix.
    row_users: Vec<i64>,
}

/// One entry of a similar-user lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarUser {
    pub user_id: i64,
    pub similarity: f64,
    pub trip_count: usize,
}

impl TrainedModelBundle {
    /// Run the full training pipeline over the trip table.
    pub fn train(
        trips: &[Trip],
        latent_dims: usize,
        clusters: usize,
        version: u64,
    ) -> Result<Self, EngineError> {
        if trips.is_empty() {
            return Err(EngineError::EmptyDataset);
        }

        let dataset = TripDataset::new(trips);
        let (features, matrix) = FeatureSpace::fit_matrix(trips);
        let collaborative = CollaborativeModel::fit(&matrix, latent_dims)?;
        let clustering = ClusteringModel::fit(&matrix, clusters, CLUSTER_SEED)?;
        let profiles = build_profiles(&dataset);
        let row_users = trips.iter().map(|t| t.user_id).collect();

        Ok(Self {
            version,
            trained_at: Utc::now(),
            features,
            collaborative,
            clustering,
            profiles,
            row_users,
        })
    }

    /// Number of feature-matrix rows the bundle was trained on.
    pub fn trained_rows(&self) -> usize {
        self.row_users.len()
    }

    /// Users with the most similar trip rows, best first.
    ///
    /// Scores each other user by the highest cosine similarity between any
    /// of their trip rows and any of the target user's; ties rank the lower
    /// user id first. Returns `None` when the target user was not part of
    /// the training table.
    pub fn similar_users(&self, user_id: i64, limit: usize) -> Option<Vec<SimilarUser>> {
        let target_rows: Vec<usize> = self
            .row_users
            .iter()
            .enumerate()
            .filter(|(_, owner)| **owner == user_id)
            .map(|(row, _)| row)
            .collect();
        if target_rows.is_empty() {
            return None;
        }

        let similarity = self.collaborative.similarity();
        let mut best: HashMap<i64, f64> = HashMap::new();
        for (row, owner) in self.row_users.iter().enumerate() {
            if *owner == user_id {
                continue;
            }
            let score = target_rows
                .iter()
                .map(|&target| similarity[[target, row]])
                .fold(f64::NEG_INFINITY, f64::max);
            best.entry(*owner)
                .and_modify(|current| *current = current.max(score))
                .or_insert(score);
        }

        let mut ranked: Vec<SimilarUser> = best
            .into_iter()
            .map(|(other, score)| SimilarUser {
                user_id: other,
                similarity: score,
                trip_count: self
                    .profiles
                    .get(&other)
                    .map(|p| p.trip_count)
                    .unwrap_or(0),
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then(a.user_id.cmp(&b.user_id))
        });
        ranked.truncate(limit);
        Some(ranked)
    }

    /// The behavioral cluster a user's trips fall into most often.
    ///
    /// Majority label over the user's rows, first-observed label winning
    /// ties. `None` for users outside the training table.
    pub fn cluster_of(&self, user_id: i64) -> Option<usize> {
        let labels = self.clustering.labels();
        let mut counts: Vec<(usize, usize)> = Vec::new();
        for (row, owner) in self.row_users.iter().enumerate() {
            if *owner != user_id {
                continue;
            }
            let label = labels[row];
            match counts.iter_mut().find(|(l, _)| *l == label) {
                Some((_, count)) => *count += 1,
                None => counts.push((label, 1)),
            }
        }

        let mut winner: Option<(usize, usize)> = None;
        for (label, count) in counts {
            match winner {
                Some((_, best)) if count <= best => {}
                _ => winner = Some((label, count)),
            }
        }
        winner.map(|(label, _)| label)
    }
}

/// Opaque save/load of the trained bundle as a single versioned blob.
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last persisted bundle, `Ok(None)` when none exists yet.
    pub fn load(&self) -> Result<Option<TrainedModelBundle>, EngineError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let bundle = serde_json::from_slice(&bytes)?;
        Ok(Some(bundle))
    }

    /// Persist a bundle, replacing any previous snapshot atomically.
    ///
    /// Writes to a sibling temp file and renames over the target, so a
    /// concurrent load never observes a half-written blob.
    pub fn save(&self, bundle: &TrainedModelBundle) -> Result<(), EngineError> {
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, serde_json::to_vec(bundle)?)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}
