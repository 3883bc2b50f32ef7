#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Nearest eligible hospital assignment.
//!
//! For every community, scans the eligible hospitals in load order and keeps
//! the one at the smallest geodesic (WGS84 ellipsoid) distance. A later
//! hospital only replaces the current best when it is strictly closer, so
//! ties resolve to the hospital loaded first.
//!
//! This is a plain O(communities x hospitals) scan. Hospital counts are in
//! the hundreds at most.

use care_map_facility_models::{Community, Coordinate, Facility, FacilityId};
use care_map_report_models::{Assignment, Assignments};
use geo::{Distance, Geodesic};

/// Geodesic distance between two positions in meters.
#[must_use]
pub fn geodesic_meters(a: Coordinate, b: Coordinate) -> f64 {
    Geodesic.distance(a.to_point(), b.to_point())
}

/// Nearest facility to a position among the given candidates.
///
/// Returns the facility id and distance in meters, or `None` when there
/// are no candidates.
#[must_use]
pub fn nearest<'a, I>(position: Coordinate, candidates: I) -> Option<(FacilityId, f64)>
where
    I: IntoIterator<Item = &'a Facility>,
{
    let mut best: Option<(FacilityId, f64)> = None;

    for facility in candidates {
        let distance = geodesic_meters(position, facility.position);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((facility.id, distance)),
        }
    }

    best
}

/// Assigns every community to its nearest eligible facility.
///
/// The eligibility predicate is evaluated once per facility. The result has
/// exactly one entry per community, in community order. A community gets
/// `(None, None)` when no facility is eligible.
pub fn assign<F>(communities: &[Community], facilities: &[Facility], eligible: F) -> Assignments
where
    F: Fn(&Facility) -> bool,
{
    let candidates: Vec<&Facility> = facilities.iter().filter(|f| eligible(f)).collect();

    log::info!(
        "Assigning {} communities to {} eligible of {} hospitals",
        communities.len(),
        candidates.len(),
        facilities.len()
    );

    if candidates.is_empty() && !communities.is_empty() {
        log::warn!("No eligible hospitals; every community is left unassigned");
    }

    let entries = communities
        .iter()
        .map(|community| {
            let found = nearest(community.position, candidates.iter().copied());
            Assignment {
                community: community.id,
                facility: found.map(|(id, _)| id),
                distance_meters: found.map(|(_, d)| d),
            }
        })
        .collect();

    Assignments::new(entries)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use care_map_facility_models::CommunityId;

    use super::*;

    fn facility(id: usize, lat: f64, lon: f64) -> Facility {
        Facility {
            id: FacilityId(id),
            name: format!("h{id}"),
            position: Coordinate::new(lat, lon),
            beds: 0,
            declared_population: 0,
            facility_type: String::new(),
            attributes: BTreeMap::new(),
        }
    }

    fn community(id: usize, lat: f64, lon: f64) -> Community {
        Community {
            id: CommunityId(id),
            name: format!("c{id}"),
            position: Coordinate::new(lat, lon),
            population: 100,
        }
    }

    /// Deterministic pseudo-random sequence in [0, 1).
    fn sequence(seed: u64, n: usize) -> Vec<f64> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                #[allow(clippy::cast_precision_loss)]
                let value = (state >> 11) as f64 / (1_u64 << 53) as f64;
                value
            })
            .collect()
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = geodesic_meters(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0));
        assert!((d - 111_319.49).abs() < 1.0, "got {d}");
    }

    #[test]
    fn short_bangkok_distance() {
        let d = geodesic_meters(
            Coordinate::new(13.75, 100.50),
            Coordinate::new(13.751, 100.501),
        );
        assert!((150.0..160.0).contains(&d), "got {d}");
    }

    #[test]
    fn ineligible_facility_is_ignored_regardless_of_distance() {
        let communities = vec![
            community(0, 13.75, 100.50),
            community(1, 13.76, 100.52),
            community(2, 13.80, 100.60),
        ];
        let facilities = vec![facility(0, 13.751, 100.501), facility(1, 13.90, 100.90)];

        let result = assign(&communities, &facilities, |f| f.id == FacilityId(0));

        assert_eq!(result.len(), 3);
        for entry in &result {
            assert_eq!(entry.facility, Some(FacilityId(0)));
            assert!(entry.distance_meters.is_some());
        }
    }

    #[test]
    fn no_eligible_facility_leaves_everyone_unassigned() {
        let communities = vec![community(0, 13.75, 100.50), community(1, 13.76, 100.52)];
        let facilities = vec![facility(0, 13.751, 100.501)];

        let result = assign(&communities, &facilities, |_| false);

        assert!(result.covers(&communities));
        assert_eq!(result.assigned_count(), 0);
        for entry in &result {
            assert_eq!(entry.facility, None);
            assert_eq!(entry.distance_meters, None);
        }
    }

    #[test]
    fn ties_go_to_first_loaded_facility() {
        let communities = vec![community(0, 13.75, 100.50)];
        // Same position twice: identical distances.
        let facilities = vec![
            facility(0, 13.80, 100.50),
            facility(1, 13.76, 100.50),
            facility(2, 13.76, 100.50),
        ];

        let result = assign(&communities, &facilities, |_| true);
        assert_eq!(
            result.get(CommunityId(0)).and_then(|a| a.facility),
            Some(FacilityId(1))
        );
    }

    #[test]
    fn every_community_appears_exactly_once() {
        let communities: Vec<Community> = (0..25)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let offset = i as f64 * 0.01;
                community(i, 13.6 + offset, 100.4 + offset)
            })
            .collect();
        let facilities = vec![facility(0, 13.7, 100.5), facility(1, 13.9, 100.7)];

        let result = assign(&communities, &facilities, |_| true);

        assert!(result.covers(&communities));
        let ids: Vec<usize> = result.iter().map(|a| a.community.0).collect();
        assert_eq!(ids, (0..25).collect::<Vec<_>>());
    }

    #[test]
    fn matches_brute_force_minimum() {
        let values = sequence(42, 200);
        let (fac_vals, comm_vals) = values.split_at(80);

        let facilities: Vec<Facility> = fac_vals
            .chunks(2)
            .enumerate()
            .map(|(i, v)| facility(i, 13.5 + v[0] * 0.5, 100.3 + v[1] * 0.6))
            .collect();
        let communities: Vec<Community> = comm_vals
            .chunks(2)
            .enumerate()
            .map(|(i, v)| community(i, 13.5 + v[0] * 0.5, 100.3 + v[1] * 0.6))
            .collect();

        let eligible = |f: &Facility| f.id.0 % 3 != 0;
        let result = assign(&communities, &facilities, eligible);

        for c in &communities {
            let entry = result.get(c.id).unwrap();
            let chosen = entry.facility.unwrap();
            assert!(eligible(&facilities[chosen.0]));

            let brute_min = facilities
                .iter()
                .filter(|f| eligible(f))
                .map(|f| geodesic_meters(c.position, f.position))
                .fold(f64::INFINITY, f64::min);
            let chosen_distance = entry.distance_meters.unwrap();
            assert!((chosen_distance - brute_min).abs() < 1e-9);
            assert!(
                (geodesic_meters(c.position, facilities[chosen.0].position) - chosen_distance)
                    .abs()
                    < 1e-9
            );
        }
    }

    #[test]
    fn nearest_over_empty_candidates() {
        assert_eq!(nearest(Coordinate::new(13.75, 100.5), &[]), None);
    }
}
