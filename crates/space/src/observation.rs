//! Dense time × location observation matrix.

use std::collections::BTreeSet;
use std::ops::Range;

use ndarray::{Array2, ArrayView1, s};

use crate::error::SpaceError;

/// Observations of one variable across locations and evenly spaced time
/// steps.
///
/// Rows are time steps in chronological order, columns are locations.
/// Construction validates that the matrix is non-empty, fully finite and
/// that there is exactly one unique name per column.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationMatrix {
    locations: Vec<String>,
    values: Array2<f64>,
}

impl ObservationMatrix {
    /// Creates a new `ObservationMatrix` after validating its contents.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`SpaceError::EmptyData`] | no rows or no columns |
    /// | [`SpaceError::DimensionMismatch`] | `locations.len() != values.ncols()` |
    /// | [`SpaceError::DuplicateLocation`] | a name appears twice |
    /// | [`SpaceError::NonFiniteData`] | any value is NaN or infinite |
    pub fn new(locations: Vec<String>, values: Array2<f64>) -> Result<Self, SpaceError> {
        if values.nrows() == 0 || values.ncols() == 0 {
            return Err(SpaceError::EmptyData);
        }
        if locations.len() != values.ncols() {
            return Err(SpaceError::DimensionMismatch {
                name: "location names".into(),
                expected: values.ncols(),
                got: locations.len(),
            });
        }
        let mut seen = BTreeSet::new();
        for name in &locations {
            if !seen.insert(name.as_str()) {
                return Err(SpaceError::DuplicateLocation { name: name.clone() });
            }
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SpaceError::NonFiniteData {
                input: "observations",
            });
        }

        Ok(Self { locations, values })
    }

    /// Creates a matrix with generated location names `loc_0, loc_1, ...`.
    pub fn from_values(values: Array2<f64>) -> Result<Self, SpaceError> {
        let names = (0..values.ncols()).map(|i| format!("loc_{i}")).collect();
        Self::new(names, values)
    }

    /// The `(time, location)` values.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Location names in column order.
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Number of time steps (rows).
    pub fn n_times(&self) -> usize {
        self.values.nrows()
    }

    /// Number of locations (columns).
    pub fn n_locations(&self) -> usize {
        self.values.ncols()
    }

    /// Column index of a named location.
    pub fn location_index(&self, name: &str) -> Option<usize> {
        self.locations.iter().position(|l| l == name)
    }

    /// Time series of one location.
    ///
    /// # Panics
    ///
    /// Panics if `location >= n_locations()`.
    pub fn series(&self, location: usize) -> ArrayView1<'_, f64> {
        self.values.column(location)
    }

    /// Temporal mean of every location, in column order.
    pub fn location_means(&self) -> Vec<f64> {
        self.values
            .columns()
            .into_iter()
            .map(|c| c.sum() / c.len() as f64)
            .collect()
    }

    /// Copies the time steps in `rows` into a new matrix with the same
    /// locations.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::EmptyData`] for an empty range and
    /// [`SpaceError::DimensionMismatch`] if the range runs past the last row.
    pub fn slice_rows(&self, rows: Range<usize>) -> Result<Self, SpaceError> {
        if rows.end > self.n_times() {
            return Err(SpaceError::DimensionMismatch {
                name: "time range end".into(),
                expected: self.n_times(),
                got: rows.end,
            });
        }
        if rows.start >= rows.end {
            return Err(SpaceError::EmptyData);
        }
        Ok(Self {
            locations: self.locations.clone(),
            values: self.values.slice(s![rows, ..]).to_owned(),
        })
    }

    /// Returns a copy with every value multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Result<Self, SpaceError> {
        Self::new(self.locations.clone(), self.values.mapv(|v| v * factor))
    }
}
