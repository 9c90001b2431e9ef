//! Shared domain types.
//!
//! These types are the request/response contract of the inference service and
//! the unit of work for the feature transform. They are intentionally plain
//! data so they can be:
//!
//! - deserialized straight from the `POST /predict` body
//! - built by hand in the form / CLI front-ends
//! - serialized back to JSON for the response

use serde::{Deserialize, Serialize};

/// Number of raw attributes accepted by the service.
pub const RAW_FIELD_COUNT: usize = 8;

/// Number of features consumed by the predictor.
pub const FEATURE_COUNT: usize = 10;

/// Canonical predictor feature order.
///
/// The predictor artifact was fitted on exactly this column order. Reordering
/// does not raise anywhere downstream; it silently corrupts predictions.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "HouseAge",
    "AveRooms",
    "AveBedrms",
    "Population",
    "AveOccup",
    "Latitude",
    "Longitude",
    "Bedrooms_per_Room",
    "MedInc_log",
    "Geo_Cluster",
];

/// Multiplier from model units (100k) to currency units.
pub const PRICE_UNIT: f64 = 100_000.0;

/// The 8 raw block-group attributes, as sent by clients.
///
/// No range validation happens here: the service accepts any finite float.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawObservation {
    pub longitude: f64,
    pub latitude: f64,
    pub house_age: f64,
    pub ave_rooms: f64,
    pub ave_bedrms: f64,
    pub population: f64,
    pub ave_occup: f64,
    pub med_inc: f64,
}

/// Fixed-order feature vector handed to the predictor.
///
/// Built per request by [`crate::features::transform`] and dropped afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedFeatureVector {
    pub house_age: f64,
    pub ave_rooms: f64,
    pub ave_bedrms: f64,
    pub population: f64,
    pub ave_occup: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub bedrooms_per_room: f64,
    pub medinc_log: f64,
    pub geo_cluster: u32,
}

impl DerivedFeatureVector {
    /// Values in [`FEATURE_NAMES`] order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.house_age,
            self.ave_rooms,
            self.ave_bedrms,
            self.population,
            self.ave_occup,
            self.latitude,
            self.longitude,
            self.bedrooms_per_room,
            self.medinc_log,
            f64::from(self.geo_cluster),
        ]
    }

    /// `(name, value)` pairs in predictor order.
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        FEATURE_NAMES.iter().copied().zip(self.to_array()).collect()
    }
}

/// Successful response body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Raw model output (units of 100k), rounded to 4 decimals.
    pub predicted_price_100k: f64,
    /// `predicted_price_100k * 100000` as `"$X,XXX.XX"`.
    #[serde(rename = "predicted_price_USD")]
    pub predicted_price_usd: String,
    pub input_cluster: u32,
}

/// Error response body (`{"error": "..."}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
