//! HTTP client for the inference service.
//!
//! Used by the terminal form and by `housing predict`. One request per call:
//! no retry, no backoff. Failures are classified so front-ends can render
//! them distinctly (unreachable vs rejected vs undecodable).

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use crate::domain::{ErrorBody, PredictionResult, RawObservation};
use crate::error::ClientError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Setup(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn predict_url(&self) -> String {
        format!("{}/predict", self.base_url)
    }

    /// `POST /predict` with the observation as JSON.
    pub fn predict(&self, raw: &RawObservation) -> Result<PredictionResult, ClientError> {
        let url = self.predict_url();
        debug!(%url, "sending prediction request");

        // No response at all (refused, DNS, timeout, reset) counts as unreachable.
        let resp = self
            .client
            .post(&url)
            .json(raw)
            .send()
            .map_err(|e| ClientError::Unreachable {
                url: url.clone(),
                reason: describe_transport_error(&e),
            })?;

        let status = resp.status();
        if !status.is_success() {
            // Best effort: surface the service's `{"error": ...}` message.
            let detail = resp
                .text()
                .ok()
                .map(|text| match serde_json::from_str::<ErrorBody>(&text) {
                    Ok(body) => body.error,
                    Err(_) => text,
                })
                .filter(|d| !d.trim().is_empty());
            return Err(ClientError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        resp.json::<PredictionResult>()
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        return "request timed out".to_string();
    }
    if e.is_connect() {
        return "connection refused or host unreachable".to_string();
    }
    e.to_string()
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use super::*;
    use crate::app::pipeline::ModelContext;
    use crate::domain::DerivedFeatureVector;
    use crate::models::{GeoKMeans, Predictor};

    struct Constant;

    impl Predictor for Constant {
        fn predict(&self, _features: &DerivedFeatureVector) -> f64 {
            4.52
        }

        fn describe(&self) -> String {
            "constant".to_string()
        }
    }

    /// Run the service on a background runtime; returns its address.
    fn spawn_service(ctx: ModelContext) -> SocketAddr {
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            rt.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                tx.send(listener.local_addr().unwrap()).unwrap();
                crate::server::serve_on(listener, Arc::new(ctx), std::future::pending())
                    .await
                    .unwrap();
            });
        });
        rx.recv().unwrap()
    }

    fn sample() -> RawObservation {
        RawObservation {
            longitude: -118.45,
            latitude: 34.00,
            house_age: 25.0,
            ave_rooms: 5.5,
            ave_bedrms: 1.0,
            population: 1500.0,
            ave_occup: 2.5,
            med_inc: 4.5,
        }
    }

    fn ready() -> ModelContext {
        let clusters = GeoKMeans::new(vec![[37.75, -122.3], [34.05, -118.25]], None).unwrap();
        ModelContext::ready(Arc::new(Constant), Arc::new(clusters))
    }

    #[test]
    fn predicts_against_running_service() {
        let addr = spawn_service(ready());
        let client = ApiClient::new(&format!("http://{addr}/"), Duration::from_secs(5)).unwrap();
        assert_eq!(client.predict_url(), format!("http://{addr}/predict"));

        let result = client.predict(&sample()).unwrap();
        assert_eq!(result.predicted_price_100k, 4.52);
        assert_eq!(result.predicted_price_usd, "$452,000.00");
        assert_eq!(result.input_cluster, 1);
    }

    #[test]
    fn non_200_carries_service_error() {
        let addr = spawn_service(ModelContext::degraded("no artifacts"));
        let client = ApiClient::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap();

        match client.predict(&sample()) {
            Err(ClientError::Status { status, detail }) => {
                assert_eq!(status, 503);
                assert_eq!(detail.as_deref(), Some("Model not loaded: no artifacts"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn closed_port_is_unreachable() {
        // Bind then drop to get a port nobody is listening on.
        let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let client = ApiClient::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();

        match client.predict(&sample()) {
            Err(ClientError::Unreachable { url, .. }) => assert_eq!(url, format!("http://{addr}/predict")),
            other => panic!("expected unreachable, got {other:?}"),
        }
    }
}
