//! `housing-price` library crate.
//!
//! The binary (`housing`) is a thin wrapper around this library so that:
//!
//! - the feature transform and models are testable without spawning processes
//! - the HTTP service and its clients share one set of wire types
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod client;
pub mod domain;
pub mod error;
pub mod features;
pub mod io;
pub mod models;
pub mod report;
pub mod server;
pub mod telemetry;
pub mod tui;
