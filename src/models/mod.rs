//! Pre-fitted model capabilities.
//!
//! The feature transform and the HTTP layer only see two traits:
//! - [`Predictor`]: `predict(vector) -> price (100k units)`
//! - [`ClusterAssigner`]: `assign(latitude, longitude) -> cluster id`
//!
//! Concrete implementations are built from the JSON artifacts in
//! [`crate::io::artifact`]. Both are immutable after construction, so they are
//! shared across request handlers behind an `Arc` without locking.

use crate::domain::DerivedFeatureVector;

pub mod kmeans;
pub mod pipeline;

pub use kmeans::GeoKMeans;
pub use pipeline::{PipelineModel, RegressionTree, Regressor, StandardScaler};

/// A fitted regression pipeline (preprocessing + regressor) treated as a black box.
pub trait Predictor: Send + Sync {
    /// Predicted median house value, in units of 100k.
    fn predict(&self, features: &DerivedFeatureVector) -> f64;

    /// One-line summary for logs and the health endpoint.
    fn describe(&self) -> String;
}

/// A fitted geo-clustering model.
pub trait ClusterAssigner: Send + Sync {
    /// Cluster id for the given coordinates.
    fn assign(&self, latitude: f64, longitude: f64) -> u32;

    fn cluster_count(&self) -> usize;
}
