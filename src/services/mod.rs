/// Recommendation engine
///
/// The pipeline that turns the raw trip table into per-trip feature vectors,
/// a low-rank collaborative-filtering model, a user clustering, and a
/// sequential next-city predictor. Everything here is synchronous and
/// operates on an in-memory slice of trips; the async edges live in `routes`
/// and `db`.
use thiserror::Error;

pub mod clustering;
pub mod collaborative;
pub mod dataset;
pub mod features;
pub mod model_store;
pub mod profiles;
pub mod recommender;
pub mod transitions;

pub use clustering::ClusteringModel;
pub use collaborative::CollaborativeModel;
pub use dataset::TripDataset;
pub use features::FeatureSpace;
pub use model_store::{ModelStore, TrainedModelBundle};
pub use profiles::build_profiles;
pub use recommender::generate;
pub use transitions::TransitionTable;

/// Error types for the recommendation engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("empty trip table: nothing to train on")]
    EmptyDataset,

    #[error("dimensionality reduction failed: {0}")]
    Reduction(String),

    #[error("clustering failed: {0}")]
    Clustering(String),

    #[error("model snapshot I/O failed: {0}")]
    Snapshot(#[from] std::io::Error),

    #[error("model snapshot encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}
