//! k-means clustering with k-means++ seeding over a pluggable distance.
//!
//! The same assignment/update loop runs over Euclidean space, Manhattan space,
//! or any external metric implementing [`Distance`], such as a travel distance
//! backed by a routing service. A distance that cannot be computed is reported
//! as a run-level failure instead of producing a partial labeling.
//!
//! ```
//! use kmeans_kpp_custom_distance::{DistanceRegistry, KMeans, KMeansConfig};
//! use ndarray::array;
//!
//! let points = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
//! let kmeans = KMeans::new(KMeansConfig::new(2).with_seed(1), &DistanceRegistry::with_builtins())?;
//! let model = kmeans.fit(points.view())?;
//! assert_eq!(model.labels().len(), 4);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod algorithm;
pub mod centroid;
pub mod config;
pub mod distance;
pub mod error;
pub mod initialization;
pub mod load;
pub mod logger;
pub mod travel;

pub use algorithm::{predict, FittedModel, KMeans, Termination};
pub use config::{InitMethod, IterationCap, KMeansConfig};
pub use distance::{Distance, DistanceRegistry, Euclidean, Manhattan};
pub use error::{AssignmentError, ConfigError, DistanceUnavailable, FitError, PredictError};
pub use travel::{RouteService, RouteTable, TravelDistance};
