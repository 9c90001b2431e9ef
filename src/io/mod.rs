//! Input/output helpers.
//!
//! - model artifact JSON read + validation (`artifact`)

pub mod artifact;

pub use artifact::*;
