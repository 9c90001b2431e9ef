//! Logging setup.
//!
//! `RUST_LOG` takes precedence over the `--log-level` flag. The TUI never calls
//! this: it owns the terminal, and log lines would corrupt the screen.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::AppError;

pub fn init(log_level: &str, json: bool) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| AppError::new(2, format!("Invalid log level '{log_level}': {e}")))?;

    let subscriber = tracing_subscriber::registry().with(filter);
    let result = if json {
        subscriber.with(fmt::layer().json().with_writer(std::io::stderr)).try_init()
    } else {
        subscriber.with(fmt::layer().with_writer(std::io::stderr)).try_init()
    };
    result.map_err(|e| AppError::new(2, format!("Failed to init logging: {e}")))
}
