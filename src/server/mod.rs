//! HTTP inference service.
//!
//! Routes:
//! - `POST /predict`: `RawObservation` JSON -> `PredictionResult` JSON
//! - `GET /health`: readiness of the loaded artifacts
//!
//! Every failure is answered with `{"error": "..."}`:
//!
//! | condition              | status |
//! |------------------------|--------|
//! | body not JSON          | 400    |
//! | no JSON content type   | 415    |
//! | missing / non-numeric  | 422    |
//! | degenerate arithmetic  | 422    |
//! | artifacts not loaded   | 503    |
//! | non-finite model value | 500    |

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::app::pipeline::{ModelContext, ServiceState};
use crate::domain::{ErrorBody, PredictionResult, RawObservation};
use crate::error::{AppError, PredictError};

/// Shared handler state: the immutable model context.
pub type AppState = Arc<ModelContext>;

impl PredictError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PredictError::MalformedInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PredictError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            PredictError::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            PredictError::Degraded { .. } => StatusCode::SERVICE_UNAVAILABLE,
            PredictError::ArithmeticDegenerate(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PredictError::NonFiniteOutput(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for PredictError {
    fn from(rejection: JsonRejection) -> Self {
        let reason = rejection.body_text();
        match rejection {
            JsonRejection::JsonDataError(_) => PredictError::MalformedInput(reason),
            JsonRejection::MissingJsonContentType(_) => PredictError::UnsupportedContentType(reason),
            _ => PredictError::InvalidJson(reason),
        }
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

/// Build the router over an already-loaded context.
pub fn router(ctx: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .with_state(ctx)
}

async fn predict(
    State(ctx): State<AppState>,
    body: Result<Json<RawObservation>, JsonRejection>,
) -> Result<Json<PredictionResult>, Response> {
    let Json(raw) = body.map_err(|rejection| {
        let err = PredictError::from(rejection);
        warn!(status = %err.status_code(), error = %err, "rejected malformed request");
        err.into_response()
    })?;

    match ctx.predict(&raw) {
        Ok(result) => Ok(Json(result)),
        Err(err) => {
            warn!(status = %err.status_code(), error = %err, "prediction failed");
            Err(err.into_response())
        }
    }
}

async fn health(State(ctx): State<AppState>) -> Response {
    match ctx.state() {
        ServiceState::Ready(models) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "predictor": models.predictor.describe(),
                "clusters": models.clusters.cluster_count(),
            })),
        )
            .into_response(),
        ServiceState::Degraded { reason } => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "error": reason })),
        )
            .into_response(),
    }
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve_on<F>(listener: TcpListener, ctx: AppState, shutdown: F) -> Result<(), AppError>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::new(4, format!("HTTP server error: {e}")))
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, ctx: ModelContext) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::new(4, format!("Failed to bind {addr}: {e}")))?;

    let local = listener.local_addr().unwrap_or(addr);
    if ctx.is_ready() {
        info!(addr = %local, "inference service listening");
    } else {
        warn!(addr = %local, "inference service listening in degraded mode; /predict will return errors");
    }

    serve_on(listener, Arc::new(ctx), shutdown_signal()).await?;
    info!("inference service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C; shutting down");
        return;
    }
    info!("shutdown signal received");
}
