use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::Trip;

/// One-hot encoder over a single categorical column.
///
/// The vocabulary is the set of distinct non-empty values present at fit
/// time, in first-observed order; that order fixes the column layout for the
/// life of the encoder. Values outside the vocabulary (or missing) encode to
/// an all-zero block, never an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OneHotEncoder {
    categories: Vec<String>,
    index: HashMap<String, usize>,
}

impl OneHotEncoder {
    /// Fit the vocabulary from observed values, first-seen order.
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut categories = Vec::new();
        let mut index = HashMap::new();
        for value in values.into_iter().flatten() {
            if !index.contains_key(value) {
                index.insert(value.to_string(), categories.len());
                categories.push(value.to_string());
            }
        }
        Self { categories, index }
    }

    /// Width of this encoder's block in the feature matrix.
    pub fn width(&self) -> usize {
        self.categories.len()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Write the one-hot block for `value` into `out`.
    ///
    /// `out` must be exactly [`OneHotEncoder::width`] wide. Unknown and
    /// missing values leave the block all zero.
    pub fn encode_into(&self, value: Option<&str>, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.width());
        out.fill(0.0);
        if let Some(position) = value.and_then(|v| self.index.get(v)) {
            out[*position] = 1.0;
        }
    }

    /// The one-hot block for `value` as an owned vector.
    pub fn encode(&self, value: Option<&str>) -> Vec<f64> {
        let mut block = vec![0.0; self.width()];
        self.encode_into(value, &mut block);
        block
    }
}

/// The fitted encoders for every configured categorical column.
///
/// Rows are trips; each row is the city block followed by the hotel block.
/// Fit once per training run and reused for all later encodes; the column
/// count never changes after fitting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureSpace {
    city: OneHotEncoder,
    hotel: OneHotEncoder,
}

impl FeatureSpace {
    /// Fit one encoder per categorical column over the full trip table.
    pub fn fit(trips: &[Trip]) -> Self {
        Self {
            city: OneHotEncoder::fit(trips.iter().map(|t| t.city())),
            hotel: OneHotEncoder::fit(trips.iter().map(|t| t.hotel())),
        }
    }

    /// Total width of an encoded row.
    pub fn width(&self) -> usize {
        self.city.width() + self.hotel.width()
    }

    pub fn city_encoder(&self) -> &OneHotEncoder {
        &self.city
    }

    pub fn hotel_encoder(&self) -> &OneHotEncoder {
        &self.hotel
    }

    /// Encode one trip into a fixed-width numeric vector.
    pub fn encode_trip(&self, trip: &Trip) -> Vec<f64> {
        let split = self.city.width();
        let mut row = vec![0.0; self.width()];
        self.city.encode_into(trip.city(), &mut row[..split]);
        self.hotel.encode_into(trip.hotel(), &mut row[split..]);
        row
    }

    /// Encode the whole table as a row-major matrix, one row per trip.
    pub fn matrix(&self, trips: &[Trip]) -> Array2<f64> {
        let mut matrix = Array2::zeros((trips.len(), self.width()));
        for (i, trip) in trips.iter().enumerate() {
            let row = self.encode_trip(trip);
            for (j, value) in row.into_iter().enumerate() {
                matrix[[i, j]] = value;
            }
        }
        matrix
    }

    /// Fit the encoders and encode the table in one pass.
    pub fn fit_matrix(trips: &[Trip]) -> (Self, Array2<f64>) {
        let space = Self::fit(trips);
        let matrix = space.matrix(trips);
        (space, matrix)
    }
}
