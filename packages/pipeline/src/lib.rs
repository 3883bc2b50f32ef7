#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! End-to-end view runs.
//!
//! A run always recomputes everything from the loaded [`Dataset`]:
//! eligibility, nearest-hospital assignment, and district aggregation over
//! the full inputs. The view's district and hospital-type filters only
//! select what goes into the emitted [`Report`]; they never change the
//! metrics themselves. The exception is a district filter scoped to
//! inputs (see [`prepare`]), which runs on that district's hospitals and
//! communities alone.

pub mod export;
pub mod profile;

#[cfg(test)]
mod fixtures;

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::PathBuf;

use care_map_aggregate::{AggregateError, Aggregation, aggregate};
use care_map_assign::assign;
use care_map_facility_models::{
    Community, CommunityId, Coordinate, Facility, FacilityId, Region, RegionId,
};
use care_map_loader::{FacilityTable, LoadError, load_communities, load_facilities, load_regions};
use care_map_report_models::{
    Assignment, AssignmentRecord, Assignments, FacilityMetrics, Report, ReportSection, Summary,
};
use care_map_spatial::{RegionIndex, region_centroid};
use care_map_views::{RegionScope, ViewDefinition, ViewError};

pub use export::regions_geojson;
pub use profile::{profile_community, profile_facility};

/// Errors that can occur during a run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Loading an input failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Aggregation was given inconsistent inputs.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// A view could not be loaded or resolved.
    #[error(transparent)]
    View(#[from] ViewError),

    /// The view's district filter names no loaded district.
    #[error("Unknown district: {0}")]
    UnknownRegion(String),

    /// No community has the requested name.
    #[error("Unknown community: {0}")]
    UnknownCommunity(String),

    /// No hospital has the requested name.
    #[error("Unknown hospital: {0}")]
    UnknownFacility(String),

    /// Writing an output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing an output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Paths of the three input files.
#[derive(Debug, Clone)]
pub struct Inputs {
    /// Hospital CSV.
    pub hospitals: PathBuf,
    /// Community CSV.
    pub communities: PathBuf,
    /// District boundary GeoJSON.
    pub districts: PathBuf,
}

/// Everything loaded from the inputs. Immutable for the rest of a run.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Hospitals plus the hospital table's header row.
    pub facilities: FacilityTable,
    /// Communities in file order.
    pub communities: Vec<Community>,
    /// Districts in file order.
    pub regions: Vec<Region>,
}

impl Dataset {
    /// Loads all three inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if any input is missing or unreadable, or a required
    /// column cannot be resolved.
    pub fn load(inputs: &Inputs) -> Result<Self, PipelineError> {
        let facilities = load_facilities(&inputs.hospitals)?;
        let communities = load_communities(&inputs.communities)?;
        let regions = load_regions(&inputs.districts)?;

        log::info!(
            "Loaded {} hospitals, {} communities, {} districts",
            facilities.facilities.len(),
            communities.len(),
            regions.len()
        );

        Ok(Self {
            facilities,
            communities,
            regions,
        })
    }

    /// Finds a district by name: trimmed exact match first, then
    /// case-insensitive. The first match in file order wins.
    #[must_use]
    pub fn region_named(&self, name: &str) -> Option<&Region> {
        find_named(&self.regions, name, |r| r.name.as_str())
    }

    /// Finds a community by name, with the same rules as
    /// [`Self::region_named`].
    #[must_use]
    pub fn community_named(&self, name: &str) -> Option<&Community> {
        find_named(&self.communities, name, |c| c.name.as_str())
    }

    /// Finds a hospital by name, with the same rules as
    /// [`Self::region_named`].
    #[must_use]
    pub fn facility_named(&self, name: &str) -> Option<&Facility> {
        find_named(&self.facilities.facilities, name, |f| f.name.as_str())
    }

    /// The hospitals and communities located in one district, renumbered
    /// densely in file order, with that district as the only district.
    ///
    /// Location uses the same first-match rules as aggregation over the
    /// full district list.
    #[must_use]
    pub fn within(&self, region: &Region) -> Self {
        let index = RegionIndex::build(&self.regions);
        let inside = |position: Coordinate| index.locate(position) == Some(region.id);

        let facilities = self
            .facilities
            .facilities
            .iter()
            .filter(|f| inside(f.position))
            .enumerate()
            .map(|(idx, f)| Facility {
                id: FacilityId(idx),
                ..f.clone()
            })
            .collect();
        let communities = self
            .communities
            .iter()
            .filter(|c| inside(c.position))
            .enumerate()
            .map(|(idx, c)| Community {
                id: CommunityId(idx),
                ..c.clone()
            })
            .collect();

        Self {
            facilities: FacilityTable {
                columns: self.facilities.columns.clone(),
                facilities,
            },
            communities,
            regions: vec![region.clone()],
        }
    }
}

/// The dataset a view runs on: the full dataset, or for a district filter
/// scoped to inputs, only what lies inside that district.
///
/// # Errors
///
/// Returns [`PipelineError::UnknownRegion`] if an input-scoped district
/// filter matches no loaded district.
pub fn prepare<'a>(
    dataset: &'a Dataset,
    view: &ViewDefinition,
) -> Result<Cow<'a, Dataset>, PipelineError> {
    let Some(filter) = view
        .region_filter
        .as_ref()
        .filter(|f| f.scope == RegionScope::Inputs)
    else {
        return Ok(Cow::Borrowed(dataset));
    };

    let region = dataset
        .region_named(&filter.name)
        .ok_or_else(|| PipelineError::UnknownRegion(filter.name.clone()))?;
    let scoped = dataset.within(region);
    log::info!(
        "View {}: inputs scoped to {:?} ({} hospitals, {} communities)",
        view.id,
        region.name,
        scoped.facilities.facilities.len(),
        scoped.communities.len()
    );

    Ok(Cow::Owned(scoped))
}

fn find_named<'a, T>(items: &'a [T], name: &str, key: impl Fn(&T) -> &str) -> Option<&'a T> {
    let wanted = name.trim();
    items
        .iter()
        .find(|item| key(item).trim() == wanted)
        .or_else(|| {
            let wanted = wanted.to_lowercase();
            items
                .iter()
                .find(|item| key(item).trim().to_lowercase() == wanted)
        })
}

/// Full-dataset results of one view, before output selection.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Eligibility of each hospital, in hospital order.
    pub eligible: Vec<bool>,
    /// Nearest eligible hospital of each community.
    pub assignments: Assignments,
    /// Hospital and district metrics.
    pub aggregation: Aggregation,
}

/// Runs eligibility, assignment, and aggregation for a view.
///
/// # Errors
///
/// Returns an error if the view's eligibility rule cannot be compiled.
pub fn evaluate(dataset: &Dataset, view: &ViewDefinition) -> Result<Evaluation, PipelineError> {
    let predicate = view.eligibility.compile(&dataset.facilities.columns)?;
    let facilities = &dataset.facilities.facilities;

    let eligible: Vec<bool> = facilities
        .iter()
        .map(|f| predicate.is_eligible(f))
        .collect();
    log::info!(
        "View {}: {} of {} hospitals eligible",
        view.id,
        eligible.iter().filter(|e| **e).count(),
        facilities.len()
    );

    let is_eligible = |f: &Facility| eligible.get(f.id.0).copied().unwrap_or(false);
    let assignments = assign(&dataset.communities, facilities, is_eligible);
    let aggregation = aggregate(
        facilities,
        &dataset.communities,
        &dataset.regions,
        &assignments,
        is_eligible,
    )?;

    Ok(Evaluation {
        eligible,
        assignments,
        aggregation,
    })
}

/// Runs a view and builds its report.
///
/// # Errors
///
/// Returns an error if the eligibility rule cannot be compiled or the
/// district filter names an unknown district.
pub fn run(dataset: &Dataset, view: &ViewDefinition) -> Result<Report, PipelineError> {
    let dataset = prepare(dataset, view)?;
    let evaluation = evaluate(&dataset, view)?;
    build_report(&dataset, view, &evaluation)
}

/// One row of the assignment table.
fn assignment_record(
    dataset: &Dataset,
    entry: &Assignment,
    community: &Community,
    region: Option<RegionId>,
) -> AssignmentRecord {
    AssignmentRecord {
        community: community.id,
        community_name: community.name.clone(),
        population: community.population,
        region,
        facility: entry.facility,
        facility_name: entry
            .facility
            .and_then(|f| dataset.facilities.facilities.get(f.0))
            .map(|f| f.name.clone()),
        distance_meters: entry.distance_meters,
    }
}

/// Selects the parts of an evaluation a view emits.
///
/// With a district filter: districts are limited to the target; hospitals
/// are kept when inside the target or serving a community inside it;
/// assignments are kept when the community or its hospital is inside the
/// target. With a hospital-type filter: hospitals and assignments are
/// limited to hospitals of that type.
///
/// # Errors
///
/// Returns [`PipelineError::UnknownRegion`] if the district filter matches
/// no loaded district.
pub fn build_report(
    dataset: &Dataset,
    view: &ViewDefinition,
    evaluation: &Evaluation,
) -> Result<Report, PipelineError> {
    let Evaluation {
        eligible,
        assignments,
        aggregation,
    } = evaluation;

    let target = view
        .region_filter
        .as_ref()
        .map(|filter| {
            dataset
                .region_named(&filter.name)
                .ok_or_else(|| PipelineError::UnknownRegion(filter.name.clone()))
        })
        .transpose()?;
    let target_id = target.map(|r| r.id);
    if let Some(region) = target {
        log::info!("View {}: restricting output to {:?}", view.id, region.name);
    }

    let in_target = |region: Option<RegionId>| target_id.is_none_or(|t| region == Some(t));
    let facility_region =
        |id: FacilityId| aggregation.facilities.get(id.0).and_then(|m| m.region);
    let passes_type = |id: FacilityId| {
        view.facility_filter.as_ref().is_none_or(|filter| {
            dataset
                .facilities
                .facilities
                .get(id.0)
                .is_some_and(|f| filter.matches(&f.facility_type))
        })
    };

    // Hospitals serving at least one community inside the target.
    let linked: BTreeSet<FacilityId> = if target_id.is_some() {
        assignments
            .iter()
            .zip(&aggregation.community_regions)
            .filter(|(_, region)| in_target(**region))
            .filter_map(|(entry, _)| entry.facility)
            .collect()
    } else {
        BTreeSet::new()
    };

    let facilities = view.emits(ReportSection::Facilities).then(|| {
        aggregation
            .facilities
            .iter()
            .filter(|m: &&FacilityMetrics| passes_type(m.facility))
            .filter(|m| in_target(m.region) || linked.contains(&m.facility))
            .cloned()
            .collect::<Vec<_>>()
    });

    let regions = view.emits(ReportSection::Regions).then(|| {
        aggregation
            .regions
            .iter()
            .filter(|m| in_target(Some(m.region)))
            .cloned()
            .collect::<Vec<_>>()
    });

    let assignment_records = view.emits(ReportSection::Assignments).then(|| {
        assignments
            .iter()
            .zip(&dataset.communities)
            .zip(&aggregation.community_regions)
            .filter(|((entry, _), region)| {
                in_target(**region) || entry.facility.is_some_and(|f| in_target(facility_region(f)))
            })
            .filter(|((entry, _), _)| {
                view.facility_filter.is_none() || entry.facility.is_some_and(passes_type)
            })
            .map(|((entry, community), region)| {
                assignment_record(dataset, entry, community, *region)
            })
            .collect::<Vec<_>>()
    });

    log::info!(
        "View {}: emitting {} hospitals, {} districts, {} assignments",
        view.id,
        facilities.as_ref().map_or(0, Vec::len),
        regions.as_ref().map_or(0, Vec::len),
        assignment_records.as_ref().map_or(0, Vec::len)
    );

    let summary = Summary {
        total_facilities: count(dataset.facilities.facilities.len()),
        eligible_facilities: count(eligible.iter().filter(|e| **e).count()),
        total_communities: count(dataset.communities.len()),
        assigned_communities: count(assignments.assigned_count()),
        total_regions: count(dataset.regions.len()),
    };

    Ok(Report {
        view: view.id.clone(),
        center: target
            .and_then(region_centroid)
            .or_else(|| mean_position(&dataset.communities)),
        summary,
        facilities,
        regions,
        unassigned: aggregation.unassigned,
        assignments: assignment_records,
    })
}

fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// Mean community position, or `None` without communities.
fn mean_position(communities: &[Community]) -> Option<Coordinate> {
    if communities.is_empty() {
        return None;
    }

    let (lat, lon) = communities.iter().fold((0.0, 0.0), |(lat, lon), c| {
        (lat + c.position.latitude, lon + c.position.longitude)
    });
    #[allow(clippy::cast_precision_loss)]
    let n = communities.len() as f64;

    Some(Coordinate::new(lat / n, lon / n))
}
