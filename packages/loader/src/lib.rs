#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Hospital and community CSV loading plus district boundary parsing.
//!
//! Input tables come from hand-maintained spreadsheets, so column names are
//! not fixed. Every logical field is resolved from an ordered list of
//! candidate headers (see [`schema`]). Only the coordinate columns are
//! required; everything else falls back to a default.
//!
//! Bad rows never abort a load: a row whose coordinates do not parse is
//! logged and skipped.

pub mod boundaries;
pub mod entities;
pub mod schema;
pub mod table;
pub mod values;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use care_map_facility_models::{Community, Region};

pub use boundaries::read_regions;
pub use entities::{FacilityTable, communities_from_table, facilities_from_table};
pub use table::{RawRow, RawTable, read_table};
pub use values::{coerce_count, parse_coordinate, truthy};

/// Errors that can occur while loading inputs.
///
/// All of these are fatal for a run. Per-row problems are logged and
/// skipped instead of surfacing here.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A required input file does not exist.
    #[error("Missing required file: {}", path.display())]
    MissingInput {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// Reading an input file failed.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The CSV header could not be read.
    #[error("CSV error in {input}: {source}")]
    Csv {
        /// Input label (usually the file name).
        input: String,
        /// Underlying error.
        source: csv::Error,
    },

    /// A required column matched none of its candidate names.
    #[error("{input}: no {field} column found (tried: {candidates})")]
    MissingColumn {
        /// Input label.
        input: String,
        /// Logical field name (e.g. "latitude").
        field: &'static str,
        /// Comma-separated candidate headers that were tried.
        candidates: String,
    },

    /// The boundary file is not valid `GeoJSON`.
    #[error("GeoJSON error in {input}: {source}")]
    GeoJson {
        /// Input label.
        input: String,
        /// Underlying error.
        source: Box<geojson::Error>,
    },

    /// The boundary file is valid `GeoJSON` but not a feature collection.
    #[error("Invalid boundary file {input}: {message}")]
    InvalidBoundary {
        /// Input label.
        input: String,
        /// Description of what went wrong.
        message: String,
    },
}

/// Loads the hospital table from a CSV file.
///
/// # Errors
///
/// Returns an error if the file is missing or unreadable, or if it has no
/// latitude/longitude column.
pub fn load_facilities(path: &Path) -> Result<FacilityTable, LoadError> {
    let reader = open_input(path)?;
    let table = read_table(reader, &input_label(path))?;
    facilities_from_table(&table)
}

/// Loads the community table from a CSV file.
///
/// # Errors
///
/// Returns an error if the file is missing or unreadable, or if it has no
/// latitude/longitude column.
pub fn load_communities(path: &Path) -> Result<Vec<Community>, LoadError> {
    let reader = open_input(path)?;
    let table = read_table(reader, &input_label(path))?;
    communities_from_table(&table)
}

/// Loads district polygons from a `GeoJSON` file.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable, or not a `GeoJSON`
/// feature collection.
pub fn load_regions(path: &Path) -> Result<Vec<Region>, LoadError> {
    let mut reader = open_input(path)?;
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    read_regions(&text, &input_label(path))
}

fn open_input(path: &Path) -> Result<BufReader<File>, LoadError> {
    if !path.exists() {
        return Err(LoadError::MissingInput {
            path: path.to_path_buf(),
        });
    }

    File::open(path)
        .map(BufReader::new)
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn input_label(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_fatal() {
        let err = load_communities(Path::new("does/not/exist/communities.csv")).unwrap_err();
        assert!(matches!(err, LoadError::MissingInput { .. }));
        assert!(err.to_string().contains("communities.csv"));
    }

    #[test]
    fn labels_inputs_by_file_name() {
        assert_eq!(input_label(Path::new("data/hospitals.csv")), "hospitals.csv");
    }
}
