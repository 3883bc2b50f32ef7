//! Column-name resolution for heterogeneous spreadsheets.
//!
//! Each logical field has an ordered list of candidate headers. Resolution
//! tries every candidate for an exact match first, then repeats the list
//! case-insensitively. The first hit wins.

/// Latitude column candidates (required).
pub const LATITUDE: &[&str] = &["ละติจูด", "latitude", "lat"];

/// Longitude column candidates (required).
pub const LONGITUDE: &[&str] = &["ลองจิจูด", "longitude", "lon", "lng"];

/// Hospital name column candidates. Falls back to the first column.
pub const FACILITY_NAME: &[&str] = &[
    "โรงพยาบาล",
    "โรงพาบาล",
    "ชื่อโรงพยาบาล",
    "hospital",
    "name",
    "ชื่อ",
];

/// Community name column candidates. Falls back to the first column.
pub const COMMUNITY_NAME: &[&str] = &["ชุมชน", "ชื่อชุมชน", "community", "name", "ชื่อ"];

/// Community population column candidates (optional).
pub const POPULATION: &[&str] = &[
    "จำนวนประชากร",
    "population",
    "pop",
    "จำนวนประชาชน",
    "ประชากร",
];

/// Hospital bed count column candidates (optional).
pub const BEDS: &[&str] = &["จำนวนเตียง", "beds", "bed_count"];

/// Declared population-to-serve column candidates (optional).
pub const DECLARED_POPULATION: &[&str] =
    &["จำนวนประชากรใกล้เคียงที่ต้องรองรับ", "population_to_serve"];

/// Hospital ownership type column candidates (optional).
pub const FACILITY_TYPE: &[&str] = &["ประเภท", "type", "facility_type"];

/// District name property candidates. Falls back to the first property.
pub const REGION_NAME: &[&str] = &[
    "amp_th", "district", "name", "NAME", "AMP_T", "AMP_THA", "DISTRICT",
];

/// Free-text columns searched for eligibility keywords when no dedicated
/// column exists.
pub const NOTE_COLUMNS: &[&str] = &["note", "notes", "type", "remark", "comment"];

/// Returns the index of the first header matching a candidate, or `None`.
#[must_use]
pub fn resolve_column<S: AsRef<str>>(headers: &[String], candidates: &[S]) -> Option<usize> {
    for candidate in candidates {
        if let Some(idx) = headers.iter().position(|h| h == candidate.as_ref()) {
            return Some(idx);
        }
    }

    for candidate in candidates {
        let wanted = candidate.as_ref().to_lowercase();
        if let Some(idx) = headers.iter().position(|h| h.to_lowercase() == wanted) {
            return Some(idx);
        }
    }

    None
}

/// Like [`resolve_column`], but falls back to the first header. Returns
/// `None` only for a table with no headers at all.
#[must_use]
pub fn resolve_column_or_first<S: AsRef<str>>(
    headers: &[String],
    candidates: &[S],
) -> Option<usize> {
    resolve_column(headers, candidates).or_else(|| (!headers.is_empty()).then_some(0))
}

/// Renders a candidate list for error messages.
#[must_use]
pub fn describe_candidates(candidates: &[&str]) -> String {
    candidates.join(", ")
}
