//! Number formatting and terminal reports.
//!
//! Keeping formatting in one place means the wire format (`predicted_price_USD`)
//! and the text front-ends cannot drift apart.

use crate::domain::{DerivedFeatureVector, PRICE_UNIT, PredictionResult, RawObservation};

/// Round to `decimals` places using the exact decimal expansion of `v`.
pub fn round_to(v: f64, decimals: usize) -> f64 {
    if !v.is_finite() {
        return v;
    }
    format!("{v:.decimals$}").parse().unwrap_or(v)
}

/// `1234567.891` -> `"$1,234,567.89"`.
///
/// Negative amounts keep the sign after the currency symbol (`"$-1,234.50"`),
/// matching what existing clients of the endpoint already parse.
pub fn format_usd(amount: f64) -> String {
    format!("${}", group_thousands(&format!("{amount:.2}")))
}

/// `1234567.891` -> `"$1,234,568"`.
pub fn format_usd_whole(amount: f64) -> String {
    format!("${}", group_thousands(&format!("{amount:.0}")))
}

/// Insert `,` every three digits of the integer part of a plain decimal string.
fn group_thousands(plain: &str) -> String {
    let (sign, digits) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Build the response record from a raw model output.
pub fn prediction_result(price_100k: f64, cluster: u32) -> PredictionResult {
    PredictionResult {
        predicted_price_100k: round_to(price_100k, 4),
        predicted_price_usd: format_usd(price_100k * PRICE_UNIT),
        input_cluster: cluster,
    }
}

/// Short report printed by `housing predict`.
pub fn format_prediction(raw: &RawObservation, result: &PredictionResult) -> String {
    let mut out = String::new();
    out.push_str("=== housing - price estimate ===\n");
    out.push_str(&format!(
        "Location: lat={:.2} lon={:.2} | geo-cluster: {}\n",
        raw.latitude, raw.longitude, result.input_cluster
    ));
    out.push_str(&format!(
        "Median income: {} | price (100k): {}\n",
        format_usd_whole(raw.med_inc * PRICE_UNIT),
        result.predicted_price_100k
    ));
    out.push_str(&format!("Estimated median price: {}\n", result.predicted_price_usd));
    out
}

/// Feature table printed by `housing explain`.
pub fn format_features(features: &DerivedFeatureVector) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<4} {:<18} {:>16}\n", "#", "feature", "value"));
    out.push_str(&format!("{:-<4} {:-<18} {:-<16}\n", "", "", ""));
    for (idx, (name, value)) in features.named().into_iter().enumerate() {
        out.push_str(&format!("{idx:<4} {name:<18} {value:>16.6}\n"));
    }
    out
}
