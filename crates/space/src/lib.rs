//! # strata-space
//!
//! Space-time observation matrices and spatial weights.
//!
//! ## Data Flow
//!
//! ```mermaid
//! graph LR
//!     A["ObservationMatrix::new(names, values)?"] --> C["spatial_lag(order, values)"]
//!     B["WeightSet::from_adjacency(&adj, k, true)?"] --> C
//!     B --> D["moran_i(&values, &weights)?"]
//! ```
//!
//! Rows of an [`ObservationMatrix`] are time steps, columns are locations.
//! A [`WeightSet`] holds one [`SpatialWeights`] per spatial order `1..=k`;
//! order 0 is the implicit identity. Row/column `i` of every weight matrix
//! refers to column `i` of the observation matrix.
//!
//! ## Example
//!
//! ```
//! use ndarray::array;
//! use strata_space::{ObservationMatrix, WeightSet};
//!
//! let obs = ObservationMatrix::new(
//!     vec!["a".into(), "b".into(), "c".into()],
//!     array![[1.0, 2.0, 3.0], [2.0, 3.0, 4.0]],
//! )
//! .unwrap();
//! let adjacency = array![[0.0, 1.0, 0.0], [1.0, 0.0, 1.0], [0.0, 1.0, 0.0]];
//! let weights = WeightSet::from_adjacency(&adjacency, 2, true).unwrap();
//!
//! let lagged = weights.spatial_lag(1, obs.values().view()).unwrap();
//! assert_eq!(lagged.row(0).to_vec(), vec![2.0, 2.0, 2.0]);
//! ```

mod error;
mod moran;
mod observation;
mod weights;

pub use error::SpaceError;
pub use moran::{MoranTest, moran_i, moran_permutation_test};
pub use observation::ObservationMatrix;
pub use weights::{SpatialWeights, WeightSet};
