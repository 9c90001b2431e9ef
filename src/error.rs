//! Error types.
//!
//! - [`AppError`]: what the `housing` binary reports (exit code + message)
//! - [`ArtifactError`]: model artifact loading failures (degrade the service)
//! - [`PredictError`]: per-request failures of `POST /predict`
//! - [`ClientError`]: failures seen by the form / CLI client
//!
//! Exit codes used by the binary:
//! - `2`: configuration, artifact, or local I/O problems
//! - `3`: the service rejected a prediction request
//! - `4`: runtime failures (unreachable service, terminal, bind)

use std::path::PathBuf;

use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<ArtifactError> for AppError {
    fn from(err: ArtifactError) -> Self {
        AppError::new(2, err.to_string())
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        let code = match err {
            ClientError::Status { .. } => 3,
            ClientError::Unreachable { .. } | ClientError::Decode(_) | ClientError::Setup(_) => 4,
        };
        AppError::new(code, err.to_string())
    }
}

/// Failure to load a persisted model artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Model artifact not found: {}", .path.display())]
    Missing { path: PathBuf },

    #[error("Failed to read model artifact '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in model artifact '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Model artifact '{}' rejected: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },
}

/// Why a single prediction request failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    /// Well-formed JSON with a missing or non-numeric field.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Body is not parseable JSON.
    #[error("Malformed input: {0}")]
    InvalidJson(String),

    /// Request did not declare `Content-Type: application/json`.
    #[error("Malformed input: {0}")]
    UnsupportedContentType(String),

    /// Artifacts failed to load at startup; nothing is computed.
    #[error("Model not loaded: {reason}")]
    Degraded { reason: String },

    /// Division by zero or a log argument outside its domain.
    #[error("Arithmetic error in feature transform: {0}")]
    ArithmeticDegenerate(String),

    #[error("Predictor returned a non-finite value ({0})")]
    NonFiniteOutput(f64),
}

/// Failures of the HTTP client used by the form and `housing predict`.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection refused, DNS failure, or timeout.
    #[error("Cannot reach the inference service at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// The service answered with a non-200 status.
    #[error("API error: status {status}{}", .detail.as_deref().map(|d| format!(" ({d})")).unwrap_or_default())]
    Status { status: u16, detail: Option<String> },

    #[error("Failed to decode service response: {0}")]
    Decode(String),

    #[error("Failed to build HTTP client: {0}")]
    Setup(String),
}
