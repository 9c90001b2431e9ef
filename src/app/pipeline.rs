//! Shared "prediction pipeline" used by the HTTP service and `housing explain`.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! degraded check -> feature transform -> predictor -> response formatting
//!
//! The front-ends (axum handler, CLI) only deal with transport and presentation.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::domain::{DerivedFeatureVector, PRICE_UNIT, PredictionResult, RawObservation};
use crate::error::PredictError;
use crate::features::transform;
use crate::io::artifact::{ArtifactPaths, load_clusters, load_pipeline};
use crate::models::{ClusterAssigner, Predictor};
use crate::report::prediction_result;

/// Both fitted models, ready to serve.
#[derive(Clone)]
pub struct LoadedModels {
    pub predictor: Arc<dyn Predictor>,
    pub clusters: Arc<dyn ClusterAssigner>,
}

/// Lifecycle phase of the service, fixed at startup.
#[derive(Clone)]
pub enum ServiceState {
    Ready(LoadedModels),
    Degraded { reason: String },
}

/// Immutable process-wide context: created once, read by every request.
#[derive(Clone)]
pub struct ModelContext {
    state: ServiceState,
}

/// Everything computed for a single observation.
#[derive(Debug, Clone)]
pub struct PredictionRun {
    pub features: DerivedFeatureVector,
    pub price_100k: f64,
    pub result: PredictionResult,
}

impl ModelContext {
    pub fn ready(predictor: Arc<dyn Predictor>, clusters: Arc<dyn ClusterAssigner>) -> Self {
        Self {
            state: ServiceState::Ready(LoadedModels { predictor, clusters }),
        }
    }

    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            state: ServiceState::Degraded {
                reason: reason.into(),
            },
        }
    }

    /// Load both artifacts. Never fails: any load error yields a degraded context.
    pub fn load(paths: &ArtifactPaths) -> Self {
        let predictor = match load_pipeline(&paths.model) {
            Ok(model) => model,
            Err(err) => {
                error!(path = %paths.model.display(), error = %err, "predictor artifact failed to load; serving in degraded mode");
                return Self::degraded(err.to_string());
            }
        };
        let clusters = match load_clusters(&paths.clusters) {
            Ok(model) => model,
            Err(err) => {
                error!(path = %paths.clusters.display(), error = %err, "cluster artifact failed to load; serving in degraded mode");
                return Self::degraded(err.to_string());
            }
        };

        info!(
            predictor = %predictor.describe(),
            clusters = clusters.cluster_count(),
            standardized_coords = clusters.is_standardized(),
            "models loaded"
        );
        Self::ready(Arc::new(predictor), Arc::new(clusters))
    }

    pub fn state(&self) -> &ServiceState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ServiceState::Ready(_))
    }

    /// Run the full pipeline and keep the intermediate features.
    pub fn run(&self, raw: &RawObservation) -> Result<PredictionRun, PredictError> {
        let models = match &self.state {
            ServiceState::Ready(models) => models,
            ServiceState::Degraded { reason } => {
                return Err(PredictError::Degraded {
                    reason: reason.clone(),
                });
            }
        };

        let features = transform(raw, models.clusters.as_ref())?;
        let price_100k = models.predictor.predict(&features);
        if !price_100k.is_finite() {
            return Err(PredictError::NonFiniteOutput(price_100k));
        }
        // A finite output can still overflow once scaled to currency units.
        let price_usd = price_100k * PRICE_UNIT;
        if !price_usd.is_finite() {
            return Err(PredictError::NonFiniteOutput(price_usd));
        }

        let result = prediction_result(price_100k, features.geo_cluster);
        debug!(cluster = result.input_cluster, price_100k, "prediction computed");

        Ok(PredictionRun {
            features,
            price_100k,
            result,
        })
    }

    pub fn predict(&self, raw: &RawObservation) -> Result<PredictionResult, PredictError> {
        self.run(raw).map(|run| run.result)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::FEATURE_COUNT;
    use crate::models::GeoKMeans;
    use crate::report::format_usd;

    /// Sums the feature vector and counts calls.
    #[derive(Default)]
    struct SumPredictor {
        calls: AtomicUsize,
    }

    impl Predictor for SumPredictor {
        fn predict(&self, features: &DerivedFeatureVector) -> f64 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Weighted so that any reordering changes the result.
            features
                .to_array()
                .iter()
                .enumerate()
                .map(|(i, v)| v * (i + 1) as f64 * 1e-3)
                .sum()
        }

        fn describe(&self) -> String {
            "sum".to_string()
        }
    }

    struct ConstPredictor(f64);

    impl Predictor for ConstPredictor {
        fn predict(&self, _features: &DerivedFeatureVector) -> f64 {
            self.0
        }

        fn describe(&self) -> String {
            "const".to_string()
        }
    }

    fn clusters() -> Arc<GeoKMeans> {
        Arc::new(GeoKMeans::new(vec![[34.05, -118.25], [37.75, -122.3], [32.8, -117.1]], None).unwrap())
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

    #[test]
    fn end_to_end_sample() {
        let predictor = Arc::new(SumPredictor::default());
        let ctx = ModelContext::ready(predictor.clone(), clusters());

        let run = ctx.run(&sample()).unwrap();
        assert_eq!(run.features.geo_cluster, 0);
        assert!((run.features.bedrooms_per_room - 1.0 / 5.5).abs() < 1e-9);
        assert!((run.features.medinc_log - 5.5_f64.ln()).abs() < 1e-9);
        assert_eq!(predictor.calls.load(Ordering::SeqCst), 1);

        let expected: f64 = run
            .features
            .to_array()
            .iter()
            .enumerate()
            .map(|(i, v)| v * (i + 1) as f64 * 1e-3)
            .sum();
        assert_eq!(run.price_100k, expected);
        assert_eq!(run.result.predicted_price_usd, format_usd(run.price_100k * PRICE_UNIT));
        assert!((run.result.predicted_price_100k - run.price_100k).abs() <= 5e-5);
        assert_eq!(run.result.input_cluster, 0);
    }

    #[test]
    fn degraded_context_never_computes() {
        let ctx = ModelContext::degraded("Model artifact not found: missing.json");
        assert!(!ctx.is_ready());

        // Even an input that would fail the transform reports the degraded state.
        let mut raw = sample();
        raw.ave_rooms = 0.0;
        for input in [sample(), raw] {
            let err = ctx.predict(&input).unwrap_err();
            assert_eq!(
                err,
                PredictError::Degraded {
                    reason: "Model artifact not found: missing.json".to_string()
                }
            );
        }
    }

    #[test]
    fn degenerate_input_does_not_reach_predictor() {
        let predictor = Arc::new(SumPredictor::default());
        let ctx = ModelContext::ready(predictor.clone(), clusters());
        let mut raw = sample();
        raw.ave_rooms = 0.0;

        let err = ctx.predict(&raw).unwrap_err();
        assert!(matches!(err, PredictError::ArithmeticDegenerate(_)));
        assert_eq!(predictor.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn non_finite_model_output_is_an_error() {
        let ctx = ModelContext::ready(Arc::new(ConstPredictor(f64::NAN)), clusters());
        assert!(matches!(ctx.predict(&sample()), Err(PredictError::NonFiniteOutput(_))));
    }

    #[test]
    fn currency_overflow_is_an_error() {
        // 1e305 is finite, but 1e305 * 100_000 is not.
        let ctx = ModelContext::ready(Arc::new(ConstPredictor(1e305)), clusters());
        match ctx.predict(&sample()) {
            Err(PredictError::NonFiniteOutput(v)) => assert!(v.is_infinite()),
            other => panic!("expected non-finite error, got {other:?}"),
        }

        let ctx = ModelContext::ready(Arc::new(ConstPredictor(-1e305)), clusters());
        assert!(matches!(ctx.predict(&sample()), Err(PredictError::NonFiniteOutput(_))));
    }

    #[test]
    fn predict_is_idempotent() {
        let ctx = ModelContext::ready(Arc::new(SumPredictor::default()), clusters());
        let a = ctx.predict(&sample()).unwrap();
        let b = ctx.predict(&sample()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn load_degrades_on_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("artifacts");
        let ctx = ModelContext::load(&ArtifactPaths {
            model: dir.path().join("housing_pipeline.json"),
            clusters: root.join("kmeans_geo.json"),
        });
        match ctx.state() {
            ServiceState::Degraded { reason } => assert!(reason.contains("not found"), "{reason}"),
            ServiceState::Ready(_) => panic!("expected degraded context"),
        }
    }

    #[test]
    fn load_bundled_artifacts() {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("artifacts");
        let ctx = ModelContext::load(&ArtifactPaths {
            model: root.join("housing_pipeline.json"),
            clusters: root.join("kmeans_geo.json"),
        });
        assert!(ctx.is_ready());

        let run = ctx.run(&sample()).unwrap();
        assert_eq!(run.features.to_array().len(), FEATURE_COUNT);
        assert_eq!(run.result.input_cluster, 0);
        assert!(run.price_100k > 0.0);
    }
}
