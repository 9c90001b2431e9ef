//! Nearest-centroid geo clustering.
//!
//! Centroids are `[latitude, longitude]` pairs. When the artifact carries the
//! scaler that was fitted alongside the clustering, coordinates are
//! standardized before the lookup; otherwise raw coordinates are compared
//! against the centroids directly.

use nalgebra::{DVector, Vector2};

use crate::models::{ClusterAssigner, StandardScaler};

#[derive(Debug, Clone)]
pub struct GeoKMeans {
    centroids: Vec<Vector2<f64>>,
    scaler: Option<StandardScaler>,
}

impl GeoKMeans {
    pub fn new(centroids: Vec<[f64; 2]>, scaler: Option<StandardScaler>) -> Result<Self, String> {
        if centroids.is_empty() {
            return Err("no centroids".to_string());
        }
        if centroids.iter().flatten().any(|v| !v.is_finite()) {
            return Err("centroids contain non-finite coordinates".to_string());
        }
        if let Some(scaler) = &scaler {
            if scaler.width() != 2 {
                return Err(format!("coordinate scaler covers {} columns, expected 2", scaler.width()));
            }
        }
        Ok(Self {
            centroids: centroids.into_iter().map(|[lat, lon]| Vector2::new(lat, lon)).collect(),
            scaler,
        })
    }

    pub fn is_standardized(&self) -> bool {
        self.scaler.is_some()
    }

    fn project(&self, latitude: f64, longitude: f64) -> Vector2<f64> {
        match &self.scaler {
            Some(scaler) => {
                let z = scaler.transform(&DVector::from_row_slice(&[latitude, longitude]));
                Vector2::new(z[0], z[1])
            }
            None => Vector2::new(latitude, longitude),
        }
    }
}

impl ClusterAssigner for GeoKMeans {
    fn assign(&self, latitude: f64, longitude: f64) -> u32 {
        let point = self.project(latitude, longitude);

        // Strict `<` keeps the first (lowest) index on ties.
        let mut best = 0usize;
        let mut best_dist = f64::INFINITY;
        for (idx, centroid) in self.centroids.iter().enumerate() {
            let dist = (centroid - point).norm_squared();
            if dist < best_dist {
                best = idx;
                best_dist = dist;
            }
        }
        best as u32
    }

    fn cluster_count(&self) -> usize {
        self.centroids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn california() -> GeoKMeans {
        GeoKMeans::new(
            vec![[34.05, -118.25], [37.75, -122.3], [32.8, -117.1]],
            None,
        )
        .unwrap()
    }

    #[test]
    fn assigns_nearest_centroid() {
        let km = california();
        assert_eq!(km.assign(34.0, -118.45), 0);
        assert_eq!(km.assign(37.8, -122.4), 1);
        assert_eq!(km.assign(32.7, -117.2), 2);
        assert_eq!(km.cluster_count(), 3);
    }

    #[test]
    fn ties_go_to_lowest_index() {
        let km = GeoKMeans::new(vec![[0.0, 1.0], [0.0, -1.0]], None).unwrap();
        assert_eq!(km.assign(0.0, 0.0), 0);
    }

    #[test]
    fn scaler_changes_the_metric() {
        // In raw space (0, 3) is closer to [0, 4]; after shrinking longitude by 10x
        // it becomes closer to the [1, 0] centroid.
        let raw = GeoKMeans::new(vec![[1.0, 0.0], [0.0, 4.0]], None).unwrap();
        assert_eq!(raw.assign(0.0, 3.0), 1);

        let scaler = StandardScaler::new(vec![0.0, 0.0], vec![1.0, 10.0], 2).unwrap();
        let scaled = GeoKMeans::new(vec![[1.0, 0.0], [0.0, 4.0]], Some(scaler)).unwrap();
        assert!(scaled.is_standardized());
        assert_eq!(scaled.assign(0.0, 3.0), 0);
    }

    #[test]
    fn rejects_empty_or_invalid() {
        assert!(GeoKMeans::new(Vec::new(), None).is_err());
        assert!(GeoKMeans::new(vec![[f64::NAN, 0.0]], None).is_err());
        let wide = StandardScaler::new(vec![0.0; 3], vec![1.0; 3], 3).unwrap();
        assert!(GeoKMeans::new(vec![[0.0, 0.0]], Some(wide)).is_err());
    }
}
