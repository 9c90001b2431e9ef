//! Read model artifact JSON files.
//!
//! Artifacts are the portable representation of the fitted models:
//! - the regression pipeline (`housing-pipeline/v1`)
//! - the geo-clustering centroids (`kmeans-geo/v1`)
//!
//! Reading is strict: schema mismatches, wrong feature order, or structurally
//! broken trees are reported as [`ArtifactError::Invalid`] so the service can
//! enter its degraded state instead of serving corrupted predictions.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::{FEATURE_COUNT, FEATURE_NAMES};
use crate::error::ArtifactError;
use crate::models::{GeoKMeans, PipelineModel, RegressionTree, Regressor, StandardScaler};

pub const PIPELINE_FORMAT: &str = "housing-pipeline/v1";
pub const CLUSTERS_FORMAT: &str = "kmeans-geo/v1";

/// Locations of the two artifacts the service needs.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub clusters: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerSpec {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSpec {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RegressorSpec {
    Linear { coefficients: Vec<f64>, intercept: f64 },
    Forest { trees: Vec<TreeSpec> },
}

/// On-disk schema of the regression pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineFile {
    pub format: String,
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub scaler: Option<ScalerSpec>,
    pub regressor: RegressorSpec,
}

/// On-disk schema of the geo-clustering model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClustersFile {
    pub format: String,
    pub centroids: Vec<[f64; 2]>,
    #[serde(default)]
    pub scaler: Option<ScalerSpec>,
}

/// Read and validate the regression pipeline artifact.
pub fn load_pipeline(path: &Path) -> Result<PipelineModel, ArtifactError> {
    let file: PipelineFile = read_json(path)?;
    build_pipeline(file).map_err(|reason| invalid(path, reason))
}

/// Read and validate the geo-clustering artifact.
pub fn load_clusters(path: &Path) -> Result<GeoKMeans, ArtifactError> {
    let file: ClustersFile = read_json(path)?;
    build_clusters(file).map_err(|reason| invalid(path, reason))
}

pub fn build_pipeline(file: PipelineFile) -> Result<PipelineModel, String> {
    check_format(&file.format, PIPELINE_FORMAT)?;

    if file.feature_names.len() != FEATURE_COUNT
        || file.feature_names.iter().zip(FEATURE_NAMES).any(|(got, want)| got != want)
    {
        return Err(format!(
            "feature order {:?} does not match the serving order {:?}",
            file.feature_names, FEATURE_NAMES
        ));
    }

    let scaler = file
        .scaler
        .map(|s| StandardScaler::new(s.mean, s.scale, FEATURE_COUNT))
        .transpose()?;

    let regressor = match file.regressor {
        RegressorSpec::Linear {
            coefficients,
            intercept,
        } => Regressor::linear(coefficients, intercept)?,
        RegressorSpec::Forest { trees } => {
            let mut built = Vec::with_capacity(trees.len());
            for (idx, t) in trees.into_iter().enumerate() {
                let tree = RegressionTree::new(t.children_left, t.children_right, t.feature, t.threshold, t.value)
                    .map_err(|e| format!("tree {idx}: {e}"))?;
                built.push(tree);
            }
            Regressor::forest(built)?
        }
    };

    PipelineModel::new(scaler, regressor)
}

pub fn build_clusters(file: ClustersFile) -> Result<GeoKMeans, String> {
    check_format(&file.format, CLUSTERS_FORMAT)?;
    let scaler = file
        .scaler
        .map(|s| StandardScaler::new(s.mean, s.scale, 2))
        .transpose()?;
    GeoKMeans::new(file.centroids, scaler)
}

fn check_format(got: &str, want: &str) -> Result<(), String> {
    if got != want {
        return Err(format!("unsupported format '{got}' (expected '{want}')"));
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let file = File::open(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ArtifactError::Missing {
                path: path.to_path_buf(),
            }
        } else {
            ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn invalid(path: &Path, reason: String) -> ArtifactError {
    ArtifactError::Invalid {
        path: path.to_path_buf(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::domain::DerivedFeatureVector;
    use crate::models::{ClusterAssigner, Predictor};

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn names_json() -> String {
        serde_json::to_string(&FEATURE_NAMES).unwrap()
    }

    #[test]
    fn missing_file_is_reported_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_pipeline(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::Missing { .. }), "{err}");
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let file = write_temp("not json");
        let err = load_clusters(file.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::Parse { .. }), "{err}");
    }

    #[test]
    fn loads_forest_pipeline() {
        let json = format!(
            r#"{{"format":"housing-pipeline/v1","feature_names":{},
                "regressor":{{"kind":"forest","trees":[
                    {{"children_left":[1,-1,-1],"children_right":[2,-1,-1],"feature":[8,-2,-2],
                      "threshold":[1.5,-2,-2],"value":[0,1.25,3.5]}}]}}}}"#,
            names_json()
        );
        let file = write_temp(&json);
        let model = load_pipeline(file.path()).unwrap();

        let v = DerivedFeatureVector {
            house_age: 25.0,
            ave_rooms: 5.5,
            ave_bedrms: 1.0,
            population: 1500.0,
            ave_occup: 2.5,
            latitude: 34.0,
            longitude: -118.45,
            bedrooms_per_room: 1.0 / 5.5,
            medinc_log: 5.5_f64.ln(),
            geo_cluster: 0,
        };
        assert_eq!(model.predict(&v), 3.5);
    }

    #[test]
    fn rejects_reordered_features() {
        let mut names: Vec<&str> = FEATURE_NAMES.to_vec();
        names.swap(5, 6);
        let json = format!(
            r#"{{"format":"housing-pipeline/v1","feature_names":{},
                "regressor":{{"kind":"linear","coefficients":[0,0,0,0,0,0,0,0,0,0],"intercept":1}}}}"#,
            serde_json::to_string(&names).unwrap()
        );
        let file = write_temp(&json);
        let err = load_pipeline(file.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::Invalid { .. }), "{err}");
        assert!(err.to_string().contains("feature order"));
    }

    #[test]
    fn rejects_unknown_format() {
        let file = write_temp(r#"{"format":"kmeans-geo/v2","centroids":[[34.0,-118.0]]}"#);
        let err = load_clusters(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported format"), "{err}");
    }

    #[test]
    fn bundled_artifacts_load() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("artifacts");
        let model = load_pipeline(&root.join("housing_pipeline.json")).unwrap();
        let clusters = load_clusters(&root.join("kmeans_geo.json")).unwrap();
        assert!(clusters.cluster_count() > 1);
        assert!(!clusters.is_standardized());
        assert!(!model.describe().is_empty());
    }
}
