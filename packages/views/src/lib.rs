#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Config-driven report views.
//!
//! A view is one way of looking at the same assignment pipeline: which
//! hospitals count as eligible, which district (if any) the output is
//! restricted to, which hospital types are emitted, and which report tables
//! are written. Views are TOML files embedded at compile time (see
//! [`registry`]); a user file can add more or override built-ins by id.

pub mod eligibility;
pub mod registry;

use care_map_report_models::ReportSection;
use serde::{Deserialize, Serialize};

pub use eligibility::{EligibilityPredicate, EligibilityRule};
pub use registry::ViewRegistry;

/// Errors that can occur while loading or resolving views.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// A view file is not valid TOML for a view definition.
    #[error("Failed to parse view config {name}: {message}")]
    Parse {
        /// File or embedded config name.
        name: String,
        /// Parser message.
        message: String,
    },

    /// Two views in the same file share an id.
    #[error("Duplicate view id: {0}")]
    DuplicateId(String),

    /// No view has the requested id.
    #[error("Unknown view: {id} (available: {available})")]
    UnknownView {
        /// Requested id.
        id: String,
        /// Comma-separated known ids.
        available: String,
    },

    /// Eligibility keywords could not be compiled.
    #[error("Invalid eligibility keywords: {0}")]
    InvalidKeywords(String),

    /// A user view file could not be read.
    #[error("I/O error reading view config: {0}")]
    Io(#[from] std::io::Error),
}

/// What a [`RegionFilter`] restricts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionScope {
    /// Metrics cover every district; only the emitted tables are limited
    /// to the target.
    #[default]
    Output,
    /// Only hospitals and communities inside the target take part in the
    /// run at all, so weights count in-district assignments only.
    Inputs,
}

/// Restricts a view to one district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionFilter {
    /// District name. Matched trimmed, then case-insensitively.
    pub name: String,
    /// Whether the restriction applies before assignment or only to output.
    #[serde(default)]
    pub scope: RegionScope,
}

/// Restricts emitted hospitals to one ownership type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityFilter {
    /// Expected type (compared after trimming).
    pub facility_type: String,
}

impl FacilityFilter {
    /// Whether a hospital type passes the filter.
    #[must_use]
    pub fn matches(&self, facility_type: &str) -> bool {
        facility_type.trim() == self.facility_type.trim()
    }
}

fn all_sections() -> Vec<ReportSection> {
    ReportSection::ALL.to_vec()
}

/// A complete view definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDefinition {
    /// Unique identifier (e.g. `"bkk_distance_csmbs"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Longer description shown by `care_map views`.
    #[serde(default)]
    pub description: Option<String>,
    /// Which hospitals communities may be assigned to.
    #[serde(default)]
    pub eligibility: EligibilityRule,
    /// Optional single-district restriction.
    #[serde(default)]
    pub region_filter: Option<RegionFilter>,
    /// Optional hospital-type restriction of the output.
    #[serde(default)]
    pub facility_filter: Option<FacilityFilter>,
    /// Report tables to emit. Defaults to all of them.
    #[serde(default = "all_sections")]
    pub sections: Vec<ReportSection>,
}

impl ViewDefinition {
    /// Whether this view emits a table.
    #[must_use]
    pub fn emits(&self, section: ReportSection) -> bool {
        self.sections.contains(&section)
    }
}

/// Parses a single view definition from TOML.
///
/// # Errors
///
/// Returns [`ViewError::Parse`] if the TOML does not describe a view.
pub fn parse_view_toml(name: &str, toml_str: &str) -> Result<ViewDefinition, ViewError> {
    toml::de::from_str(toml_str).map_err(|e| ViewError::Parse {
        name: name.to_owned(),
        message: e.to_string(),
    })
}
