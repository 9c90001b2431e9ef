//! Core domain types shared across modules.
//!
//! This module defines:
//! - the raw request shape (`RawObservation`)
//! - the fixed-order predictor input (`DerivedFeatureVector`)
//! - response payloads (`PredictionResult`, `ErrorBody`)

pub mod types;

pub use types::*;
