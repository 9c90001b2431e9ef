//! Feature engineering applied to every request before the models run.

pub mod transform;

pub use transform::transform;
