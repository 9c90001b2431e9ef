//! Reporting utilities: currency formatting, response assembly, text output.

pub mod format;

pub use format::*;
