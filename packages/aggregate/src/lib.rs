#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Per-hospital weights and per-district counters.
//!
//! Takes the loaded entities plus a complete assignment table and produces
//! an [`Aggregation`]:
//!
//! * hospital `weight` (communities assigned) and `served_population`
//! * district `hospital_count`, `community_count`, `sum_population`, and
//!   `sum_assigned_weight` (sum of contained hospitals' weights)
//! * district `normalized_score` against the heaviest district
//! * an unassigned bucket for points inside no district
//!
//! Everything is accumulated in local buffers and returned as one value, so
//! callers never observe partially computed weights.

use std::collections::BTreeMap;

use care_map_facility_models::{Community, Coordinate, Facility, FacilityId, Region, RegionId};
use care_map_report_models::{Assignments, FacilityMetrics, RegionMetrics, UnassignedMetrics};
use care_map_spatial::{Placement, RegionIndex};

/// Errors that can occur during aggregation.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    /// The assignment table was computed for a different community set.
    #[error(
        "Assignment table has {assignments} entries but {communities} communities were given; \
         assignments must be recomputed for the current inputs"
    )]
    AssignmentMismatch {
        /// Entries in the assignment table.
        assignments: usize,
        /// Communities passed to the aggregator.
        communities: usize,
    },

    /// The assignment table references a facility that was not given.
    #[error("Assignment references unknown hospital id {0}")]
    UnknownFacility(usize),
}

/// The aggregated output of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    /// One entry per facility, in facility order.
    pub facilities: Vec<FacilityMetrics>,
    /// One entry per region, in region order.
    pub regions: Vec<RegionMetrics>,
    /// Counters for points inside no region.
    pub unassigned: UnassignedMetrics,
    /// District of each community, in community order.
    pub community_regions: Vec<Option<RegionId>>,
}

impl Aggregation {
    /// Sum of all facility weights.
    #[must_use]
    pub fn total_weight(&self) -> u64 {
        self.facilities.iter().map(|f| f.weight).sum()
    }
}

#[derive(Default, Clone, Copy)]
struct Counters {
    hospitals: u64,
    communities: u64,
    weight: u64,
    population: u64,
}

/// Aggregates an assignment table over facilities and regions.
///
/// `eligible` is only recorded on each facility's metrics; weights come
/// solely from `assignments`.
///
/// # Errors
///
/// Returns an error if `assignments` does not hold exactly one entry per
/// community or references a facility outside `facilities`.
pub fn aggregate<F>(
    facilities: &[Facility],
    communities: &[Community],
    regions: &[Region],
    assignments: &Assignments,
    eligible: F,
) -> Result<Aggregation, AggregateError>
where
    F: Fn(&Facility) -> bool,
{
    if !assignments.covers(communities) {
        return Err(AggregateError::AssignmentMismatch {
            assignments: assignments.len(),
            communities: communities.len(),
        });
    }

    // ── Facility weights ────────────────────────────────────────────
    let mut weights = vec![0_u64; facilities.len()];
    let mut served = vec![0_u64; facilities.len()];
    for (entry, community) in assignments.iter().zip(communities) {
        let Some(FacilityId(idx)) = entry.facility else {
            continue;
        };
        if facilities.get(idx).is_none_or(|f| f.id != FacilityId(idx)) {
            return Err(AggregateError::UnknownFacility(idx));
        }
        weights[idx] += 1;
        served[idx] += community.population;
    }

    // ── District membership ─────────────────────────────────────────
    let index = RegionIndex::build(regions);
    let slots: BTreeMap<RegionId, usize> = regions
        .iter()
        .enumerate()
        .map(|(slot, region)| (region.id, slot))
        .collect();
    let mut counters = vec![Counters::default(); regions.len()];
    let mut outside = Counters::default();

    let mut facility_regions = Vec::with_capacity(facilities.len());
    for (idx, facility) in facilities.iter().enumerate() {
        let region = locate(&index, facility.position, "hospital", &facility.name);
        let bucket = region
            .and_then(|r| slots.get(&r))
            .map_or(&mut outside, |slot| &mut counters[*slot]);
        bucket.hospitals += 1;
        bucket.weight += weights[idx];
        facility_regions.push(region);
    }

    let mut community_regions = Vec::with_capacity(communities.len());
    for community in communities {
        let region = locate(&index, community.position, "community", &community.name);
        let bucket = region
            .and_then(|r| slots.get(&r))
            .map_or(&mut outside, |slot| &mut counters[*slot]);
        bucket.communities += 1;
        bucket.population += community.population;
        community_regions.push(region);
    }

    // ── Publish ─────────────────────────────────────────────────────
    let max_weight = counters.iter().map(|c| c.weight).max().unwrap_or(0);

    let region_metrics: Vec<RegionMetrics> = regions
        .iter()
        .zip(&counters)
        .map(|(region, c)| RegionMetrics {
            region: region.id,
            name: region.name.clone(),
            hospital_count: c.hospitals,
            community_count: c.communities,
            sum_assigned_weight: c.weight,
            sum_population: c.population,
            normalized_score: normalize(c.weight, max_weight),
        })
        .collect();

    let facility_metrics: Vec<FacilityMetrics> = facilities
        .iter()
        .enumerate()
        .map(|(idx, facility)| {
            let region = facility_regions[idx];
            FacilityMetrics {
                facility: facility.id,
                name: facility.name.clone(),
                facility_type: facility.facility_type.clone(),
                region,
                region_name: region
                    .and_then(|r| slots.get(&r))
                    .map(|slot| regions[*slot].name.clone()),
                eligible: eligible(facility),
                weight: weights[idx],
                served_population: served[idx],
                beds: facility.beds,
                declared_population: facility.declared_population,
            }
        })
        .collect();

    if outside.hospitals + outside.communities > 0 {
        log::info!(
            "{} hospitals and {} communities fall inside no district",
            outside.hospitals,
            outside.communities
        );
    }

    Ok(Aggregation {
        facilities: facility_metrics,
        regions: region_metrics,
        unassigned: UnassignedMetrics {
            hospital_count: outside.hospitals,
            community_count: outside.communities,
            sum_assigned_weight: outside.weight,
            sum_population: outside.population,
        },
        community_regions,
    })
}

fn locate(
    index: &RegionIndex,
    position: Coordinate,
    kind: &str,
    name: &str,
) -> Option<RegionId> {
    let placement = index.place(position);
    match placement {
        Placement::Interior(_) => {}
        Placement::Boundary(region) => {
            log::debug!("{kind} {name:?} lies on a district outline, using district {}", region.0);
        }
        Placement::Outside => log::debug!("{kind} {name:?} is inside no district"),
    }
    placement.region()
}

#[allow(clippy::cast_precision_loss)]
fn normalize(value: u64, max: u64) -> f64 {
    if max == 0 {
        0.0
    } else {
        value as f64 / max as f64
    }
}

#[cfg(test)]
mod tests {
    use care_map_assign::assign;
    use care_map_facility_models::CommunityId;
    use geo::{MultiPolygon, polygon};

    use super::*;

    fn facility(id: usize, lat: f64, lon: f64) -> Facility {
        Facility {
            id: FacilityId(id),
            name: format!("h{id}"),
            position: Coordinate::new(lat, lon),
            beds: 10,
            declared_population: 0,
            facility_type: String::new(),
            attributes: BTreeMap::new(),
        }
    }

    fn community(id: usize, lat: f64, lon: f64, population: u64) -> Community {
        Community {
            id: CommunityId(id),
            name: format!("c{id}"),
            position: Coordinate::new(lat, lon),
            population,
        }
    }

    fn rect(id: usize, name: &str, lon0: f64, lat0: f64, lon1: f64, lat1: f64) -> Region {
        Region {
            id: RegionId(id),
            name: name.to_string(),
            geometry: Some(MultiPolygon(vec![polygon![
                (x: lon0, y: lat0),
                (x: lon1, y: lat0),
                (x: lon1, y: lat1),
                (x: lon0, y: lat1),
                (x: lon0, y: lat0),
            ]])),
        }
    }

    /// Two districts split at longitude 100.55.
    fn districts() -> Vec<Region> {
        vec![
            rect(0, "west", 100.40, 13.70, 100.55, 13.85),
            rect(1, "east", 100.55, 13.70, 100.95, 13.95),
        ]
    }

    #[test]
    fn concrete_scenario_weights() {
        let communities = vec![
            community(0, 13.75, 100.50, 100),
            community(1, 13.76, 100.52, 200),
            community(2, 13.80, 100.60, 300),
        ];
        let facilities = vec![facility(0, 13.751, 100.501), facility(1, 13.90, 100.90)];
        let eligible = |f: &Facility| f.id == FacilityId(0);
        let regions = districts();

        let assignments = assign(&communities, &facilities, eligible);
        let result = aggregate(&facilities, &communities, &regions, &assignments, eligible).unwrap();

        assert_eq!(result.facilities[0].weight, 3);
        assert_eq!(result.facilities[0].served_population, 600);
        assert!(result.facilities[0].eligible);
        assert_eq!(result.facilities[1].weight, 0);
        assert!(!result.facilities[1].eligible);

        let west = &result.regions[0];
        assert_eq!(west.hospital_count, 1);
        assert_eq!(west.community_count, 2);
        assert_eq!(west.sum_population, 300);
        assert_eq!(west.sum_assigned_weight, 3);
        assert!((west.normalized_score - 1.0).abs() < f64::EPSILON);

        let east = &result.regions[1];
        assert_eq!(east.hospital_count, 1);
        assert_eq!(east.community_count, 1);
        assert_eq!(east.sum_assigned_weight, 0);
        assert!(east.normalized_score.abs() < f64::EPSILON);

        assert_eq!(result.facilities[0].region_name.as_deref(), Some("west"));
        assert_eq!(
            result.community_regions,
            vec![Some(RegionId(0)), Some(RegionId(0)), Some(RegionId(1))]
        );
    }

    #[test]
    fn weights_are_conserved() {
        let communities: Vec<Community> = (0..12)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let step = i as f64 * 0.03;
                community(i, 13.71 + step / 3.0, 100.41 + step, 50)
            })
            .collect();
        let facilities = vec![
            facility(0, 13.72, 100.45),
            facility(1, 13.80, 100.70),
            facility(2, 13.75, 100.60),
        ];
        let regions = districts();
        let eligible = |f: &Facility| f.id != FacilityId(2);

        let assignments = assign(&communities, &facilities, eligible);
        let result = aggregate(&facilities, &communities, &regions, &assignments, eligible).unwrap();

        assert_eq!(result.total_weight(), assignments.assigned_count() as u64);
        let region_total: u64 = result.regions.iter().map(|r| r.sum_assigned_weight).sum();
        assert_eq!(
            region_total + result.unassigned.sum_assigned_weight,
            result.total_weight()
        );
        assert_eq!(result.facilities[2].weight, 0);
    }

    #[test]
    fn normalized_scores_are_bounded() {
        let communities = vec![
            community(0, 13.75, 100.45, 1),
            community(1, 13.75, 100.46, 1),
            community(2, 13.80, 100.80, 1),
        ];
        let facilities = vec![facility(0, 13.75, 100.44), facility(1, 13.80, 100.81)];
        let regions = districts();

        let assignments = assign(&communities, &facilities, |_| true);
        let result = aggregate(&facilities, &communities, &regions, &assignments, |_| true).unwrap();

        for region in &result.regions {
            assert!((0.0..=1.0).contains(&region.normalized_score));
        }
        assert!(
            result
                .regions
                .iter()
                .any(|r| (r.normalized_score - 1.0).abs() < f64::EPSILON)
        );
        assert!((result.regions[1].normalized_score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn all_zero_weights_normalize_to_zero() {
        let communities = vec![community(0, 13.75, 100.45, 1)];
        let facilities = vec![facility(0, 13.75, 100.44)];
        let regions = districts();

        let assignments = assign(&communities, &facilities, |_| false);
        let result = aggregate(&facilities, &communities, &regions, &assignments, |_| false).unwrap();

        assert!(result.regions.iter().all(|r| r.normalized_score == 0.0));
    }

    #[test]
    fn boundary_community_goes_to_first_listed_district() {
        let communities = vec![community(0, 13.75, 100.55, 10)];
        let facilities = vec![facility(0, 13.75, 100.45)];
        let regions = districts();

        let assignments = assign(&communities, &facilities, |_| true);
        let result = aggregate(&facilities, &communities, &regions, &assignments, |_| true).unwrap();

        assert_eq!(result.community_regions, vec![Some(RegionId(0))]);
        assert_eq!(result.regions[0].community_count, 1);
        assert_eq!(result.regions[1].community_count, 0);
    }

    #[test]
    fn points_outside_every_district_go_to_unassigned_bucket() {
        let communities = vec![
            community(0, 13.75, 100.45, 70),
            community(1, 14.50, 101.50, 30),
        ];
        let facilities = vec![facility(0, 14.50, 101.40)];
        let regions = districts();

        let assignments = assign(&communities, &facilities, |_| true);
        let result = aggregate(&facilities, &communities, &regions, &assignments, |_| true).unwrap();

        assert_eq!(result.unassigned.hospital_count, 1);
        assert_eq!(result.unassigned.community_count, 1);
        assert_eq!(result.unassigned.sum_population, 30);
        assert_eq!(result.unassigned.sum_assigned_weight, 2);
        assert_eq!(result.facilities[0].region, None);
        assert!(result.regions.iter().all(|r| r.normalized_score == 0.0));
    }

    #[test]
    fn stale_assignments_are_rejected() {
        let communities = vec![
            community(0, 13.75, 100.45, 1),
            community(1, 13.76, 100.46, 1),
        ];
        let facilities = vec![facility(0, 13.75, 100.44)];
        let regions = districts();

        let stale = assign(&communities[..1], &facilities, |_| true);
        let err = aggregate(&facilities, &communities, &regions, &stale, |_| true).unwrap_err();
        assert!(matches!(
            err,
            AggregateError::AssignmentMismatch {
                assignments: 1,
                communities: 2
            }
        ));

        let full = assign(&communities, &facilities, |_| true);
        let err = aggregate(&[], &communities, &regions, &full, |_| true).unwrap_err();
        assert!(matches!(err, AggregateError::UnknownFacility(0)));
    }
}
