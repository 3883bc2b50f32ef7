#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Hospital, community, and district boundary entity types.
//!
//! These are the immutable records produced by the loader. Derived values
//! (weights, region counters) never live here; they are computed into the
//! report types in `care_map_report_models`.

use std::collections::BTreeMap;

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

/// Index of a facility in load order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FacilityId(pub usize);

/// Index of a community in load order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CommunityId(pub usize);

/// Index of a region in boundary feature order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RegionId(pub usize);

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude and longitude.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns the position as a `geo` point (x = longitude, y = latitude).
    #[must_use]
    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }
}

/// A hospital row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    /// Position in the loaded facility list.
    pub id: FacilityId,
    /// Hospital name.
    pub name: String,
    /// Hospital location.
    pub position: Coordinate,
    /// Bed count (0 when missing or non-numeric).
    pub beds: u64,
    /// Population the hospital declares it must serve, as given in the
    /// source table (0 when missing).
    pub declared_population: u64,
    /// Ownership type (e.g. "รัฐ" for public, "เอกชน" for private). Empty
    /// when the table has no type column.
    pub facility_type: String,
    /// Every raw cell of the source row keyed by trimmed header.
    pub attributes: BTreeMap<String, String>,
}

impl Facility {
    /// Returns the raw value of a column, if the row has it.
    #[must_use]
    pub fn attribute(&self, column: &str) -> Option<&str> {
        self.attributes.get(column).map(String::as_str)
    }
}

/// A community (population center) row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    /// Position in the loaded community list.
    pub id: CommunityId,
    /// Community name.
    pub name: String,
    /// Community location.
    pub position: Coordinate,
    /// Resident count (0 when missing or non-numeric).
    pub population: u64,
}

/// A named district polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Position in the boundary feature collection.
    pub id: RegionId,
    /// District name resolved from the feature properties.
    pub name: String,
    /// District outline. `None` when the feature had no usable areal
    /// geometry; such regions still appear in the report with zero counts.
    pub geometry: Option<MultiPolygon<f64>>,
}
