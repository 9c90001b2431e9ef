//! Form model behind the terminal UI: field table, clamped stepping and
//! exact-value entry. Kept free of terminal types so it can be tested directly.

use crate::domain::{RAW_FIELD_COUNT, RawObservation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Location,
    Housing,
    Demographics,
}

impl Group {
    pub fn title(self) -> &'static str {
        match self {
            Group::Location => "Location",
            Group::Housing => "Housing",
            Group::Demographics => "Demographics",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Wire name, as sent to the service.
    pub name: &'static str,
    pub label: &'static str,
    pub group: Group,
    pub default: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: f64,
    /// Decimals shown in the form.
    pub precision: usize,
}

/// Display order. Indices are stable: see [`FormState::to_observation`].
pub const FIELDS: [FieldSpec; RAW_FIELD_COUNT] = [
    FieldSpec { name: "Longitude", label: "Longitude", group: Group::Location, default: -118.45, min: None, max: None, step: 0.01, precision: 2 },
    FieldSpec { name: "Latitude", label: "Latitude", group: Group::Location, default: 34.00, min: None, max: None, step: 0.01, precision: 2 },
    FieldSpec { name: "HouseAge", label: "Median house age (years)", group: Group::Housing, default: 25.0, min: Some(1.0), max: Some(52.0), step: 1.0, precision: 0 },
    FieldSpec { name: "AveRooms", label: "Avg rooms per household", group: Group::Housing, default: 5.5, min: Some(1.0), max: Some(20.0), step: 0.1, precision: 1 },
    FieldSpec { name: "AveBedrms", label: "Avg bedrooms per household", group: Group::Housing, default: 1.0, min: Some(0.5), max: Some(5.0), step: 0.1, precision: 1 },
    FieldSpec { name: "MedInc", label: "Median income (x100k)", group: Group::Demographics, default: 4.5, min: Some(0.5), max: Some(15.0), step: 0.1, precision: 1 },
    FieldSpec { name: "Population", label: "Block population", group: Group::Demographics, default: 1500.0, min: Some(10.0), max: Some(10000.0), step: 10.0, precision: 0 },
    FieldSpec { name: "AveOccup", label: "Avg occupants per household", group: Group::Demographics, default: 2.5, min: Some(1.0), max: Some(5.0), step: 0.1, precision: 1 },
];

const LONGITUDE: usize = 0;
const LATITUDE: usize = 1;
const HOUSE_AGE: usize = 2;
const AVE_ROOMS: usize = 3;
const AVE_BEDRMS: usize = 4;
const MED_INC: usize = 5;
const POPULATION: usize = 6;
const AVE_OCCUP: usize = 7;

/// The observation the form starts with (a west Los Angeles block group).
pub fn default_observation() -> RawObservation {
    FormState::new().to_observation()
}

impl FieldSpec {
    fn clamp(&self, v: f64) -> f64 {
        let v = self.min.map_or(v, |m| v.max(m));
        self.max.map_or(v, |m| v.min(m))
    }

    fn in_range(&self, v: f64) -> bool {
        self.min.is_none_or(|m| v >= m) && self.max.is_none_or(|m| v <= m)
    }

    pub fn range_hint(&self) -> String {
        match (self.min, self.max) {
            (Some(lo), Some(hi)) => format!("[{lo}, {hi}]"),
            _ => "any".to_string(),
        }
    }

    pub fn format_value(&self, v: f64) -> String {
        format!("{v:.*}", self.precision)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    values: [f64; RAW_FIELD_COUNT],
    pub selected: usize,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new()
    }
}

impl FormState {
    pub fn new() -> Self {
        Self {
            values: FIELDS.map(|f| f.default),
            selected: 0,
        }
    }

    pub fn value(&self, idx: usize) -> f64 {
        self.values[idx]
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < FIELDS.len() {
            self.selected += 1;
        }
    }

    /// Step the selected field by `delta` steps, clamped to its range.
    pub fn adjust(&mut self, delta: i32) {
        let spec = &FIELDS[self.selected];
        let raw = self.values[self.selected] + f64::from(delta) * spec.step;
        // Snap to the displayed precision so repeated steps do not accumulate drift.
        let snapped = crate::report::round_to(raw, spec.precision.max(2));
        self.values[self.selected] = spec.clamp(snapped);
    }

    /// Set the selected field from typed text.
    pub fn set_from_text(&mut self, text: &str) -> Result<f64, String> {
        let spec = &FIELDS[self.selected];
        let trimmed = text.trim();
        let v: f64 = trimmed
            .parse()
            .map_err(|_| format!("'{trimmed}' is not a number"))?;
        if !v.is_finite() {
            return Err(format!("{} must be finite", spec.name));
        }
        if !spec.in_range(v) {
            return Err(format!("{} must be within {}", spec.name, spec.range_hint()));
        }
        self.values[self.selected] = v;
        Ok(v)
    }

    pub fn reset(&mut self) {
        self.values = FIELDS.map(|f| f.default);
    }

    pub fn to_observation(&self) -> RawObservation {
        let v = &self.values;
        RawObservation {
            longitude: v[LONGITUDE],
            latitude: v[LATITUDE],
            house_age: v[HOUSE_AGE],
            ave_rooms: v[AVE_ROOMS],
            ave_bedrms: v[AVE_BEDRMS],
            population: v[POPULATION],
            ave_occup: v[AVE_OCCUP],
            med_inc: v[MED_INC],
        }
    }
}
