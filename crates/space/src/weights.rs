//! Spatial weight matrices and the spatial lag operator.

use std::collections::VecDeque;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use tracing::debug;

use crate::error::SpaceError;

/// A square, non-negative `n × n` spatial weight matrix.
///
/// Entry `(i, j)` is the influence of location `j` on location `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialWeights {
    matrix: Array2<f64>,
}

impl SpatialWeights {
    /// Wraps a weight matrix after validation.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`SpaceError::EmptyData`] | zero-sized matrix |
    /// | [`SpaceError::NotSquare`] | rows != columns |
    /// | [`SpaceError::NonFiniteData`] | NaN or infinite entry |
    /// | [`SpaceError::NegativeWeight`] | any entry below zero |
    pub fn new(matrix: Array2<f64>) -> Result<Self, SpaceError> {
        let (rows, cols) = matrix.dim();
        if rows == 0 || cols == 0 {
            return Err(SpaceError::EmptyData);
        }
        if rows != cols {
            return Err(SpaceError::NotSquare { rows, cols });
        }
        if matrix.iter().any(|w| !w.is_finite()) {
            return Err(SpaceError::NonFiniteData { input: "weights" });
        }
        if let Some(((row, col), &value)) = matrix.indexed_iter().find(|(_, w)| **w < 0.0) {
            return Err(SpaceError::NegativeWeight { row, col, value });
        }
        Ok(Self { matrix })
    }

    /// The underlying matrix.
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Number of locations the matrix is defined over.
    pub fn n_locations(&self) -> usize {
        self.matrix.nrows()
    }

    /// Sum of all weights (`S0` in Moran's I).
    pub fn total(&self) -> f64 {
        self.matrix.sum()
    }

    /// Returns a row-standardised copy: each row sums to one, rows without
    /// neighbours stay zero.
    pub fn row_normalised(&self) -> Self {
        let mut matrix = self.matrix.clone();
        for mut row in matrix.rows_mut() {
            let total = row.sum();
            if total > 0.0 {
                row.mapv_inplace(|w| w / total);
            }
        }
        Self { matrix }
    }

    /// Applies the weights to every row of a `(time, location)` matrix,
    /// returning `values · Wᵀ` (row `t` becomes `W z_t`).
    pub fn lag_matrix(&self, values: ArrayView2<'_, f64>) -> Array2<f64> {
        values.dot(&self.matrix.t())
    }

    /// Applies the weights to a single location vector, returning `W v`.
    pub fn lag_vector(&self, v: ArrayView1<'_, f64>) -> Array1<f64> {
        self.matrix.dot(&v)
    }
}

/// Spatial weight matrices keyed by spatial order `1..=k`.
///
/// Order 0 is the identity and is never stored. Every matrix in the set
/// covers the same `n_locations`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSet {
    n_locations: usize,
    orders: Vec<SpatialWeights>,
}

impl WeightSet {
    /// A weight set with no spatial neighbours: only the implicit order 0.
    pub fn identity(n_locations: usize) -> Self {
        Self {
            n_locations,
            orders: Vec::new(),
        }
    }

    /// Builds a weight set from explicit matrices; `orders[0]` is spatial
    /// order 1.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::DimensionMismatch`] if any matrix is not
    /// `n_locations × n_locations`.
    pub fn new(n_locations: usize, orders: Vec<SpatialWeights>) -> Result<Self, SpaceError> {
        if n_locations == 0 {
            return Err(SpaceError::EmptyData);
        }
        for (i, w) in orders.iter().enumerate() {
            if w.n_locations() != n_locations {
                return Err(SpaceError::DimensionMismatch {
                    name: format!("weights of spatial order {}", i + 1),
                    expected: n_locations,
                    got: w.n_locations(),
                });
            }
        }
        Ok(Self {
            n_locations,
            orders,
        })
    }

    /// Derives contiguity-order weights from an adjacency matrix.
    ///
    /// Order `k` links `i` to `j` when the shortest path from `i` to `j`
    /// along edges `adjacency[(i, j)] > 0` has exactly `k` steps. The
    /// diagonal is ignored. With `row_normalise` each order is
    /// row-standardised.
    ///
    /// # Errors
    ///
    /// Propagates validation errors from [`SpatialWeights::new`].
    pub fn from_adjacency(
        adjacency: &Array2<f64>,
        max_order: usize,
        row_normalise: bool,
    ) -> Result<Self, SpaceError> {
        let adjacency = SpatialWeights::new(adjacency.clone())?;
        let n = adjacency.n_locations();
        let distances = path_lengths(adjacency.matrix());

        let mut orders = Vec::with_capacity(max_order);
        for k in 1..=max_order {
            let raw = Array2::from_shape_fn((n, n), |(i, j)| {
                if distances[i][j] == Some(k) { 1.0 } else { 0.0 }
            });
            let n_links = raw.iter().filter(|w| **w > 0.0).count();
            debug!(order = k, n_links, "built contiguity weights");
            let w = SpatialWeights::new(raw)?;
            orders.push(if row_normalise { w.row_normalised() } else { w });
        }

        Self::new(n, orders)
    }

    /// Number of locations every matrix covers.
    pub fn n_locations(&self) -> usize {
        self.n_locations
    }

    /// Highest stored spatial order (0 for an identity-only set).
    pub fn max_order(&self) -> usize {
        self.orders.len()
    }

    /// Number of spatial orders including the implicit order 0.
    pub fn n_orders(&self) -> usize {
        self.orders.len() + 1
    }

    /// Weights of spatial order `order >= 1`.
    pub fn get(&self, order: usize) -> Option<&SpatialWeights> {
        order.checked_sub(1).and_then(|i| self.orders.get(i))
    }

    /// Spatially lags a `(time, location)` matrix at `order`.
    ///
    /// Order 0 returns a copy of `values`.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::InvalidOrder`] for orders beyond
    /// [`max_order()`](Self::max_order) and [`SpaceError::DimensionMismatch`]
    /// if `values` does not have `n_locations` columns.
    pub fn spatial_lag(
        &self,
        order: usize,
        values: ArrayView2<'_, f64>,
    ) -> Result<Array2<f64>, SpaceError> {
        if values.ncols() != self.n_locations {
            return Err(SpaceError::DimensionMismatch {
                name: "locations".into(),
                expected: self.n_locations,
                got: values.ncols(),
            });
        }
        match order {
            0 => Ok(values.to_owned()),
            k => self
                .get(k)
                .map(|w| w.lag_matrix(values))
                .ok_or(SpaceError::InvalidOrder {
                    order: k,
                    max: self.max_order(),
                }),
        }
    }

    /// Spatially lags a single location vector at `order`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`spatial_lag()`](Self::spatial_lag).
    pub fn lag_vector(
        &self,
        order: usize,
        v: ArrayView1<'_, f64>,
    ) -> Result<Array1<f64>, SpaceError> {
        if v.len() != self.n_locations {
            return Err(SpaceError::DimensionMismatch {
                name: "locations".into(),
                expected: self.n_locations,
                got: v.len(),
            });
        }
        match order {
            0 => Ok(v.to_owned()),
            k => self
                .get(k)
                .map(|w| w.lag_vector(v))
                .ok_or(SpaceError::InvalidOrder {
                    order: k,
                    max: self.max_order(),
                }),
        }
    }
}

/// Breadth-first shortest path lengths between all pairs of locations.
fn path_lengths(adjacency: &Array2<f64>) -> Vec<Vec<Option<usize>>> {
    let n = adjacency.nrows();
    let mut all = Vec::with_capacity(n);
    for source in 0..n {
        let mut dist = vec![None; n];
        dist[source] = Some(0);
        let mut queue = VecDeque::from([source]);
        while let Some(i) = queue.pop_front() {
            let d = dist[i].unwrap_or(0);
            for j in 0..n {
                if i != j && adjacency[(i, j)] > 0.0 && dist[j].is_none() {
                    dist[j] = Some(d + 1);
                    queue.push_back(j);
                }
            }
        }
        all.push(dist);
    }
    all
}
