//! Fuzzy cell value parsing.
//!
//! Spreadsheet cells arrive as free text of inconsistent form ("YES", "1",
//! "รับ", "2.0", blank). These helpers turn them into booleans, counts, and
//! coordinates without ever failing.

use care_map_facility_models::Coordinate;

/// Lowercased words accepted as "yes" by [`truthy`].
const TRUTHY_WORDS: &[&str] = &["1", "y", "yes", "true", "t", "on", "รับ", "ใช่"];

/// Interprets a free-text eligibility cell.
///
/// The trimmed, lowercased value is truthy when it is one of
/// `1 y yes true t on รับ ใช่`, or when it parses as a number strictly
/// greater than zero. Missing and everything else is falsy.
#[must_use]
pub fn truthy(value: Option<&str>) -> bool {
    let Some(value) = value else {
        return false;
    };

    let lower = value.trim().to_lowercase();
    if TRUTHY_WORDS.contains(&lower.as_str()) {
        return true;
    }

    lower.parse::<f64>().is_ok_and(|n| n > 0.0)
}

/// Coerces a numeric cell to a non-negative integer.
///
/// Decimal values are truncated. Missing, non-numeric, non-finite, and
/// negative values become 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn coerce_count(value: Option<&str>) -> u64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite() && *n > 0.0)
        .map_or(0, |n| n.trunc() as u64)
}

/// Parses a latitude/longitude pair. Returns `None` unless both values are
/// finite numbers inside WGS84 bounds.
#[must_use]
pub fn parse_coordinate(latitude: &str, longitude: &str) -> Option<Coordinate> {
    let latitude = latitude.trim().parse::<f64>().ok()?;
    let longitude = longitude.trim().parse::<f64>().ok()?;

    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }

    Some(Coordinate::new(latitude, longitude))
}
