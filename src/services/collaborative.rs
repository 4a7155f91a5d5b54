use nalgebra::DMatrix;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::services::EngineError;

/// Default number of latent dimensions for the low-rank reduction.
pub const DEFAULT_LATENT_DIMS: usize = 5;

/// Collaborative-filtering model over the trip feature matrix.
///
/// Mean-centers the one-hot matrix and projects it onto its top right
/// singular vectors, then holds the full pairwise cosine-similarity matrix
/// over the reduced rows. Rows are trips, so a user with several trips owns
/// several rows.
#[derive(Clone, Serialize, Deserialize)]
pub struct CollaborativeModel {
    mean: Array1<f64>,
    /// Latent basis, one row per retained singular vector.
    components: Array2<f64>,
    similarity: Array2<f64>,
    latent_dims: usize,
}

impl CollaborativeModel {
    /// Fit the reduction and derive the similarity matrix.
    ///
    /// A requested dimensionality beyond what the matrix can support is
    /// clamped to the feasible maximum instead of failing.
    pub fn fit(matrix: &Array2<f64>, latent_dims: usize) -> Result<Self, EngineError> {
        if matrix.nrows() == 0 {
            return Err(EngineError::EmptyDataset);
        }
        if matrix.ncols() == 0 {
            return Err(EngineError::Reduction(
                "feature matrix has no columns".to_string(),
            ));
        }

        let dims = latent_dims.min(matrix.ncols()).min(matrix.nrows()).max(1);

        let mean = matrix
            .mean_axis(Axis(0))
            .ok_or_else(|| EngineError::Reduction("failed to center feature matrix".to_string()))?;
        let centered = matrix - &mean;

        // Dense SVD; nalgebra sorts singular values descending, so the first
        // `dims` rows of V^T span the dominant-variance subspace.
        let dense = DMatrix::from_fn(centered.nrows(), centered.ncols(), |i, j| centered[[i, j]]);
        let svd = dense.svd(false, true);
        let v_t = svd.v_t.ok_or_else(|| {
            EngineError::Reduction("decomposition produced no right singular vectors".to_string())
        })?;

        let mut components = Array2::zeros((dims, matrix.ncols()));
        for i in 0..dims {
            for j in 0..matrix.ncols() {
                components[[i, j]] = v_t[(i, j)];
            }
        }

        let reduced = centered.dot(&components.t());
        let similarity = cosine_similarity_matrix(&reduced);

        Ok(Self {
            mean,
            components,
            similarity,
            latent_dims: dims,
        })
    }

    /// Effective latent dimensionality after clamping.
    pub fn latent_dims(&self) -> usize {
        self.latent_dims
    }

    /// Pairwise cosine similarity between trip rows; symmetric, unit
    /// diagonal.
    pub fn similarity(&self) -> &Array2<f64> {
        &self.similarity
    }

    /// Project rows into the fitted latent space.
    pub fn reduce(&self, matrix: &Array2<f64>) -> Array2<f64> {
        (matrix - &self.mean).dot(&self.components.t())
    }
}

/// Full pairwise cosine-similarity matrix over the rows of `x`.
pub fn cosine_similarity_matrix(x: &Array2<f64>) -> Array2<f64> {
    let n = x.nrows();
    let mut similarity = Array2::zeros((n, n));
    for i in 0..n {
        similarity[[i, i]] = 1.0;
        for j in (i + 1)..n {
            let value = cosine(x.row(i), x.row(j));
            similarity[[i, j]] = value;
            similarity[[j, i]] = value;
        }
    }
    similarity
}

fn cosine(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    let dot = a.dot(&b);
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample_matrix() -> Array2<f64> {
        array![
            [1.0, 0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 1.0],
            [0.0, 1.0, 1.0, 0.0],
        ]
    }

    #[test]
    fn test_similarity_is_symmetric_with_unit_diagonal() {
        let model = CollaborativeModel::fit(&sample_matrix(), DEFAULT_LATENT_DIMS).unwrap();
        let sim = model.similarity();

        assert_eq!(sim.nrows(), 4);
        assert_eq!(sim.ncols(), 4);
        for i in 0..4 {
            assert!((sim[[i, i]] - 1.0).abs() < 1e-12);
            for j in 0..4 {
                assert!((sim[[i, j]] - sim[[j, i]]).abs() < 1e-12);
                assert!(sim[[i, j]].abs() <= 1.0 + 1e-9);
            }
        }
    }

    #[test]
    fn test_latent_dims_clamped_to_matrix_shape() {
        let model = CollaborativeModel::fit(&sample_matrix(), 50).unwrap();
        assert_eq!(model.latent_dims(), 4);

        let reduced = model.reduce(&sample_matrix());
        assert_eq!(reduced.nrows(), 4);
        assert_eq!(reduced.ncols(), 4);
    }

    #[test]
    fn test_identical_rows_have_full_similarity() {
        let x = array![
            [1.0, 0.0, 1.0, 0.0],
            [1.0, 0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 1.0],
        ];
        let model = CollaborativeModel::fit(&x, 2).unwrap();
        let sim = model.similarity();

        assert!((sim[[0, 1]] - 1.0).abs() < 1e-9);
        assert!(sim[[0, 2]] < sim[[0, 1]]);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let first = CollaborativeModel::fit(&sample_matrix(), 2).unwrap();
        let second = CollaborativeModel::fit(&sample_matrix(), 2).unwrap();

        let (a, b) = (first.similarity(), second.similarity());
        for i in 0..a.nrows() {
            for j in 0..a.ncols() {
                assert!((a[[i, j]] - b[[i, j]]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_empty_matrix_is_rejected() {
        let empty = Array2::<f64>::zeros((0, 4));
        assert!(matches!(
            CollaborativeModel::fit(&empty, 2),
            Err(EngineError::EmptyDataset)
        ));
    }

    #[test]
    fn test_cosine_handles_zero_rows() {
        let x = array![[0.0, 0.0], [1.0, 0.0]];
        let sim = cosine_similarity_matrix(&x);
        assert_eq!(sim[[0, 1]], 0.0);
        assert_eq!(sim[[0, 0]], 1.0);
    }
}
