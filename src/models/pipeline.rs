//! Regression pipeline: optional standardization followed by a regressor.
//!
//! Two regressor families are supported:
//! - `Linear`: `y = β·x + intercept`
//! - `Forest`: mean of array-encoded regression trees
//!
//! Trees use the flat node layout common to CART exporters:
//!
//! ```text
//! children_left[i]  = -1 for a leaf, else index of the left child
//! children_right[i] = index of the right child
//! feature[i]        = column tested at node i
//! threshold[i]      = go left when x[feature[i]] <= threshold[i]
//! value[i]          = prediction when node i is a leaf
//! ```
//!
//! All structural checks happen once, at construction. `predict` never fails.

use nalgebra::DVector;

use crate::domain::{DerivedFeatureVector, FEATURE_COUNT};
use crate::models::Predictor;

/// Per-feature standardization: `(x - mean) / scale`.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: DVector<f64>,
    scale: DVector<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>, width: usize) -> Result<Self, String> {
        if mean.len() != width || scale.len() != width {
            return Err(format!(
                "scaler expects {width} means and scales, got {} and {}",
                mean.len(),
                scale.len()
            ));
        }
        if mean.iter().chain(scale.iter()).any(|v| !v.is_finite()) {
            return Err("scaler contains non-finite values".to_string());
        }
        if scale.iter().any(|s| *s == 0.0) {
            return Err("scaler has a zero scale".to_string());
        }
        Ok(Self {
            mean: DVector::from_vec(mean),
            scale: DVector::from_vec(scale),
        })
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, x: &DVector<f64>) -> DVector<f64> {
        (x - &self.mean).component_div(&self.scale)
    }
}

/// A single regression tree in flat array form.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<f64>,
}

impl RegressionTree {
    pub fn new(
        children_left: Vec<i64>,
        children_right: Vec<i64>,
        feature: Vec<i64>,
        threshold: Vec<f64>,
        value: Vec<f64>,
    ) -> Result<Self, String> {
        let n = children_left.len();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if [children_right.len(), feature.len(), threshold.len(), value.len()]
            .iter()
            .any(|&len| len != n)
        {
            return Err(format!("tree arrays must all have {n} entries"));
        }

        for i in 0..n {
            let left = children_left[i];
            if left < 0 {
                if !value[i].is_finite() {
                    return Err(format!("leaf {i} has a non-finite value"));
                }
                continue;
            }
            let right = children_right[i];
            // Children always come after their parent, which also rules out cycles.
            for child in [left, right] {
                if child <= i as i64 || child >= n as i64 {
                    return Err(format!("node {i} has invalid child index {child}"));
                }
            }
            if feature[i] < 0 || feature[i] >= FEATURE_COUNT as i64 {
                return Err(format!("node {i} tests unknown feature {}", feature[i]));
            }
            if threshold[i].is_nan() {
                return Err(format!("node {i} has a NaN threshold"));
            }
        }

        Ok(Self {
            children_left,
            children_right,
            feature,
            threshold,
            value,
        })
    }

    pub fn node_count(&self) -> usize {
        self.children_left.len()
    }

    pub fn predict(&self, x: &[f64]) -> f64 {
        let mut node = 0usize;
        loop {
            let left = self.children_left[node];
            if left < 0 {
                return self.value[node];
            }
            let column = self.feature[node] as usize;
            node = if x[column] <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }
}

/// Final estimator of the pipeline.
#[derive(Debug, Clone)]
pub enum Regressor {
    Linear {
        coefficients: DVector<f64>,
        intercept: f64,
    },
    Forest {
        trees: Vec<RegressionTree>,
    },
}

impl Regressor {
    pub fn linear(coefficients: Vec<f64>, intercept: f64) -> Result<Self, String> {
        if coefficients.len() != FEATURE_COUNT {
            return Err(format!(
                "linear regressor expects {FEATURE_COUNT} coefficients, got {}",
                coefficients.len()
            ));
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err("linear regressor has non-finite parameters".to_string());
        }
        Ok(Regressor::Linear {
            coefficients: DVector::from_vec(coefficients),
            intercept,
        })
    }

    pub fn forest(trees: Vec<RegressionTree>) -> Result<Self, String> {
        if trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        Ok(Regressor::Forest { trees })
    }

    fn predict(&self, x: &DVector<f64>) -> f64 {
        match self {
            Regressor::Linear {
                coefficients,
                intercept,
            } => coefficients.dot(x) + intercept,
            Regressor::Forest { trees } => {
                let sum: f64 = trees.iter().map(|t| t.predict(x.as_slice())).sum();
                sum / trees.len() as f64
            }
        }
    }
}

/// Composite predictor loaded from a pipeline artifact.
#[derive(Debug, Clone)]
pub struct PipelineModel {
    scaler: Option<StandardScaler>,
    regressor: Regressor,
}

impl PipelineModel {
    pub fn new(scaler: Option<StandardScaler>, regressor: Regressor) -> Result<Self, String> {
        if let Some(scaler) = &scaler {
            if scaler.width() != FEATURE_COUNT {
                return Err(format!(
                    "pipeline scaler covers {} features, expected {FEATURE_COUNT}",
                    scaler.width()
                ));
            }
        }
        Ok(Self { scaler, regressor })
    }

    /// Evaluate on a raw array already in predictor order.
    pub fn predict_array(&self, x: [f64; FEATURE_COUNT]) -> f64 {
        let x = DVector::from_row_slice(&x);
        match &self.scaler {
            Some(scaler) => self.regressor.predict(&scaler.transform(&x)),
            None => self.regressor.predict(&x),
        }
    }
}

impl Predictor for PipelineModel {
    fn predict(&self, features: &DerivedFeatureVector) -> f64 {
        self.predict_array(features.to_array())
    }

    fn describe(&self) -> String {
        let scaler = if self.scaler.is_some() { "scaler + " } else { "" };
        match &self.regressor {
            Regressor::Linear { .. } => format!("{scaler}linear regression"),
            Regressor::Forest { trees } => {
                let nodes: usize = trees.iter().map(RegressionTree::node_count).sum();
                let plural = if trees.len() == 1 { "" } else { "s" };
                format!("{scaler}forest ({} tree{plural}, {nodes} nodes)", trees.len())
            }
        }
    }
}
