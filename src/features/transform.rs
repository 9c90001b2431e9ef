//! Raw observation -> predictor feature vector.
//!
//! Steps, each pure:
//! 1. `Bedrooms_per_Room = AveBedrms / AveRooms`
//! 2. `MedInc_log = ln(1 + MedInc)`
//! 3. `Geo_Cluster = assign(Latitude, Longitude)`
//! 4. assemble in [`crate::domain::FEATURE_NAMES`] order
//!
//! Degenerate arithmetic (zero rooms, income <= -1) is reported as
//! [`PredictError::ArithmeticDegenerate`]; an infinite or NaN feature never
//! reaches the predictor.

use crate::domain::{DerivedFeatureVector, RawObservation};
use crate::error::PredictError;
use crate::models::ClusterAssigner;

pub fn transform(raw: &RawObservation, clusters: &dyn ClusterAssigner) -> Result<DerivedFeatureVector, PredictError> {
    let bedrooms_per_room = bedrooms_per_room(raw.ave_bedrms, raw.ave_rooms)?;
    let medinc_log = medinc_log(raw.med_inc)?;
    let geo_cluster = clusters.assign(raw.latitude, raw.longitude);

    Ok(DerivedFeatureVector {
        house_age: raw.house_age,
        ave_rooms: raw.ave_rooms,
        ave_bedrms: raw.ave_bedrms,
        population: raw.population,
        ave_occup: raw.ave_occup,
        latitude: raw.latitude,
        longitude: raw.longitude,
        bedrooms_per_room,
        medinc_log,
        geo_cluster,
    })
}

pub fn bedrooms_per_room(ave_bedrms: f64, ave_rooms: f64) -> Result<f64, PredictError> {
    if ave_rooms == 0.0 {
        return Err(PredictError::ArithmeticDegenerate(
            "AveRooms is 0 (Bedrooms_per_Room = AveBedrms / AveRooms is undefined)".to_string(),
        ));
    }
    let ratio = ave_bedrms / ave_rooms;
    if !ratio.is_finite() {
        return Err(PredictError::ArithmeticDegenerate(format!(
            "Bedrooms_per_Room is not finite (AveBedrms={ave_bedrms}, AveRooms={ave_rooms})"
        )));
    }
    Ok(ratio)
}

pub fn medinc_log(med_inc: f64) -> Result<f64, PredictError> {
    if med_inc <= -1.0 {
        return Err(PredictError::ArithmeticDegenerate(format!(
            "MedInc must be greater than -1 for ln(1 + MedInc), got {med_inc}"
        )));
    }
    let v = med_inc.ln_1p();
    if !v.is_finite() {
        return Err(PredictError::ArithmeticDegenerate(format!(
            "ln(1 + MedInc) is not finite for MedInc={med_inc}"
        )));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FEATURE_COUNT;

    /// Always returns the same id.
    struct FixedCluster(u32);

    impl ClusterAssigner for FixedCluster {
        fn assign(&self, _latitude: f64, _longitude: f64) -> u32 {
            self.0
        }

        fn cluster_count(&self) -> usize {
            1
        }
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
    fn vector_follows_fixed_order() {
        let raw = sample();
        let v = transform(&raw, &FixedCluster(3)).unwrap();
        let arr = v.to_array();
        let expected = [
            raw.house_age,
            raw.ave_rooms,
            raw.ave_bedrms,
            raw.population,
            raw.ave_occup,
            raw.latitude,
            raw.longitude,
            raw.ave_bedrms / raw.ave_rooms,
            raw.med_inc.ln_1p(),
            3.0,
        ];
        assert_eq!(arr.len(), FEATURE_COUNT);
        for (got, want) in arr.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "{got} != {want}");
        }
    }

    #[test]
    fn sample_scenario_values() {
        let v = transform(&sample(), &FixedCluster(0)).unwrap();
        assert!((v.bedrooms_per_room - 0.181_818_181_8).abs() < 1e-9);
        assert!((v.medinc_log - 5.5_f64.ln()).abs() < 1e-9);
        assert!((v.medinc_log - 1.704_748_092).abs() < 1e-9);
    }

    #[test]
    fn ratio_and_log_match_definitions() {
        for (bed, rooms) in [(1.0, 5.5), (0.7, 3.2), (2.5, 19.0), (-1.0, 4.0)] {
            let r = bedrooms_per_room(bed, rooms).unwrap();
            assert!((r - bed / rooms).abs() < 1e-9);
        }
        for inc in [0.0, 0.4999, 4.5, 15.0, -0.5] {
            let l = medinc_log(inc).unwrap();
            assert!((l - (1.0 + inc).ln()).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_rooms_is_degenerate() {
        let mut raw = sample();
        raw.ave_rooms = 0.0;
        let err = transform(&raw, &FixedCluster(0)).unwrap_err();
        assert!(matches!(err, PredictError::ArithmeticDegenerate(_)), "{err}");

        raw.ave_rooms = -0.0;
        assert!(transform(&raw, &FixedCluster(0)).is_err());
    }

    #[test]
    fn income_at_or_below_minus_one_is_degenerate() {
        assert!(matches!(medinc_log(-1.0), Err(PredictError::ArithmeticDegenerate(_))));
        assert!(matches!(medinc_log(-3.0), Err(PredictError::ArithmeticDegenerate(_))));
    }

    #[test]
    fn overflowing_ratio_is_degenerate() {
        assert!(bedrooms_per_room(f64::MAX, 1e-300).is_err());
    }

    #[test]
    fn transform_is_deterministic() {
        let raw = sample();
        let a = transform(&raw, &FixedCluster(1)).unwrap();
        let b = transform(&raw, &FixedCluster(1)).unwrap();
        assert_eq!(a, b);
    }
}
