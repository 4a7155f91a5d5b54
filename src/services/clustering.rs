use linfa::prelude::*;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use ndarray::Array2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use serde::{Deserialize, Serialize};

use crate::services::EngineError;

/// Default number of behavioral clusters.
pub const DEFAULT_CLUSTERS: usize = 3;

/// Seed for the centroid initialization; fixed so training runs are
/// reproducible.
pub const CLUSTER_SEED: u64 = 42;

/// K-means partition of the trip feature matrix.
///
/// Labels are per trip row, in `[0, k)`. Label identity is not stable across
/// fits: clusters may be renumbered between training runs, so nothing may
/// depend on absolute label values persisting.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClusteringModel {
    kmeans: KMeans<f64, L2Dist>,
    labels: Vec<usize>,
    clusters: usize,
}

impl ClusteringModel {
    /// Partition the rows of `matrix` into `clusters` groups.
    ///
    /// `clusters` is clamped to the row count; k-means cannot produce more
    /// groups than points.
    pub fn fit(matrix: &Array2<f64>, clusters: usize, seed: u64) -> Result<Self, EngineError> {
        if matrix.nrows() == 0 {
            return Err(EngineError::EmptyDataset);
        }

        let k = clusters.clamp(1, matrix.nrows());
        let rng = Xoshiro256Plus::seed_from_u64(seed);
        let dataset = DatasetBase::from(matrix.clone());

        let kmeans = KMeans::params_with_rng(k, rng)
            .max_n_iterations(300)
            .tolerance(1e-6)
            .fit(&dataset)
            .map_err(|e| EngineError::Clustering(e.to_string()))?;

        let labels = kmeans.predict(matrix).to_vec();

        Ok(Self {
            kmeans,
            labels,
            clusters: k,
        })
    }

    /// Effective cluster count after clamping.
    pub fn clusters(&self) -> usize {
        self.clusters
    }

    /// Cluster label per trip row of the training matrix.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Assign rows of an encoded matrix to the fitted centroids.
    pub fn assign(&self, matrix: &Array2<f64>) -> Vec<usize> {
        self.kmeans.predict(matrix).to_vec()
    }
}
