#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Assignment, facility metric, and district metric report types.
//!
//! Everything here is derived from the loaded entities by the assignment
//! engine and the aggregator. The [`Report`] is the serialized hand-off to
//! whatever renders maps, dashboards, or further analysis.

use care_map_facility_models::{Community, CommunityId, Coordinate, FacilityId, RegionId};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The nearest eligible facility for one community.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// The community this entry belongs to.
    pub community: CommunityId,
    /// Nearest eligible facility. `None` when no facility is eligible.
    pub facility: Option<FacilityId>,
    /// Geodesic distance to `facility` in meters. `None` exactly when
    /// `facility` is `None`.
    pub distance_meters: Option<f64>,
}

/// One [`Assignment`] per community, in community order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assignments {
    entries: Vec<Assignment>,
}

impl Assignments {
    /// Wraps assignment entries. Entry `i` must belong to community `i`.
    #[must_use]
    pub const fn new(entries: Vec<Assignment>) -> Self {
        Self { entries }
    }

    /// Number of entries (one per community).
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry for a community.
    #[must_use]
    pub fn get(&self, community: CommunityId) -> Option<&Assignment> {
        self.entries
            .get(community.0)
            .filter(|entry| entry.community == community)
    }

    /// Iterates entries in community order.
    pub fn iter(&self) -> std::slice::Iter<'_, Assignment> {
        self.entries.iter()
    }

    /// Number of communities that have a facility.
    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.entries.iter().filter(|e| e.facility.is_some()).count()
    }

    /// Whether this table holds exactly one entry for each of the given
    /// communities, in order.
    #[must_use]
    pub fn covers(&self, communities: &[Community]) -> bool {
        self.entries.len() == communities.len()
            && self
                .entries
                .iter()
                .zip(communities)
                .all(|(entry, community)| entry.community == community.id)
    }
}

impl<'a> IntoIterator for &'a Assignments {
    type Item = &'a Assignment;
    type IntoIter = std::slice::Iter<'a, Assignment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Derived values for a single facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityMetrics {
    /// Facility id.
    pub facility: FacilityId,
    /// Facility name.
    pub name: String,
    /// Ownership type as loaded.
    pub facility_type: String,
    /// District containing the facility, if any.
    pub region: Option<RegionId>,
    /// Name of `region`.
    pub region_name: Option<String>,
    /// Whether the view's eligibility rule accepted this facility.
    pub eligible: bool,
    /// Number of communities whose nearest eligible facility is this one.
    pub weight: u64,
    /// Total population of those communities.
    pub served_population: u64,
    /// Bed count as loaded.
    pub beds: u64,
    /// Declared population to serve as loaded.
    pub declared_population: u64,
}

/// Derived counters for a single district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionMetrics {
    /// Region id.
    pub region: RegionId,
    /// District name.
    pub name: String,
    /// Facilities located in the district.
    pub hospital_count: u64,
    /// Communities located in the district.
    pub community_count: u64,
    /// Sum of the weights of facilities located in the district.
    pub sum_assigned_weight: u64,
    /// Total population of communities located in the district.
    pub sum_population: u64,
    /// `sum_assigned_weight` divided by the largest `sum_assigned_weight`
    /// over all districts, or 0 when that maximum is 0.
    pub normalized_score: f64,
}

/// Counters for points that fall inside no district.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignedMetrics {
    /// Facilities outside every district.
    pub hospital_count: u64,
    /// Communities outside every district.
    pub community_count: u64,
    /// Sum of the weights of facilities outside every district.
    pub sum_assigned_weight: u64,
    /// Population of communities outside every district.
    pub sum_population: u64,
}

/// A row of the community-to-facility table as emitted in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    /// Community id.
    pub community: CommunityId,
    /// Community name.
    pub community_name: String,
    /// Community population.
    pub population: u64,
    /// District containing the community, if any.
    pub region: Option<RegionId>,
    /// Nearest eligible facility.
    pub facility: Option<FacilityId>,
    /// Name of `facility`.
    pub facility_name: Option<String>,
    /// Geodesic distance in meters.
    pub distance_meters: Option<f64>,
}

/// Dataset-wide counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Facilities loaded.
    pub total_facilities: u64,
    /// Facilities accepted by the eligibility rule.
    pub eligible_facilities: u64,
    /// Communities loaded.
    pub total_communities: u64,
    /// Communities with a nearest eligible facility.
    pub assigned_communities: u64,
    /// Districts loaded.
    pub total_regions: u64,
}

/// Tables a view can emit.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReportSection {
    /// Per-facility weights.
    Facilities,
    /// Per-district counters.
    Regions,
    /// Community-to-facility table.
    Assignments,
}

impl ReportSection {
    /// Every section, in output order.
    pub const ALL: &[Self] = &[Self::Facilities, Self::Regions, Self::Assignments];
}

/// The complete output of one run of a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// View id that produced this report.
    pub view: String,
    /// Suggested map center.
    pub center: Option<Coordinate>,
    /// Dataset-wide counts (always computed over the full inputs).
    pub summary: Summary,
    /// Per-facility table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facilities: Option<Vec<FacilityMetrics>>,
    /// Per-district table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<RegionMetrics>>,
    /// Points that fell in no district.
    pub unassigned: UnassignedMetrics,
    /// Community-to-facility table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignments: Option<Vec<AssignmentRecord>>,
}

/// Nearest facility for one community under one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileOption {
    /// View id whose eligibility rule was applied.
    pub view: String,
    /// View display name.
    pub view_name: String,
    /// Nearest eligible facility, if any.
    pub facility: Option<FacilityId>,
    /// Its name.
    pub facility_name: Option<String>,
    /// Geodesic distance in meters.
    pub distance_meters: Option<f64>,
}

/// Where one community would be sent under several eligibility rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityProfile {
    /// The community.
    pub community: CommunityId,
    /// Its name.
    pub name: String,
    /// Its position.
    pub position: Coordinate,
    /// Its population.
    pub population: u64,
    /// District containing it, if any.
    pub region_name: Option<String>,
    /// One entry per rule, in the order requested.
    pub options: Vec<ProfileOption>,
}

/// One hospital and the communities it is nearest to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityProfile {
    /// View id whose eligibility rule was applied.
    pub view: String,
    /// The hospital's metrics, including its district.
    pub facility: FacilityMetrics,
    /// Communities assigned to it, in community order.
    pub communities: Vec<AssignmentRecord>,
}
