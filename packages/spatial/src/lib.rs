#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory spatial index for district attribution.
//!
//! Builds an R-tree over district envelopes and answers "which district is
//! this point in" with input-order first-match semantics: candidates from
//! the R-tree are re-sorted by their position in the boundary file, so the
//! result is the same as a linear scan over the districts.

use care_map_facility_models::{Coordinate, Region, RegionId};
use geo::{BoundingRect, Centroid, Contains, Intersects, MultiPolygon};
use rstar::{AABB, RTree, RTreeObject};

/// A district polygon stored in the R-tree with its input position.
struct BoundaryEntry {
    region: RegionId,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for BoundaryEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// How a point was matched to a district.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The point lies strictly inside the district.
    Interior(RegionId),
    /// The point lies on the district outline and inside no district.
    Boundary(RegionId),
    /// The point touches no district.
    Outside,
}

impl Placement {
    /// The matched district, if any.
    #[must_use]
    pub const fn region(self) -> Option<RegionId> {
        match self {
            Self::Interior(region) | Self::Boundary(region) => Some(region),
            Self::Outside => None,
        }
    }
}

/// Pre-built R-tree over district polygons.
pub struct RegionIndex {
    tree: RTree<BoundaryEntry>,
}

impl RegionIndex {
    /// Indexes every region that has a geometry. Regions without one can
    /// never match a point.
    #[must_use]
    pub fn build(regions: &[Region]) -> Self {
        let entries: Vec<BoundaryEntry> = regions
            .iter()
            .filter_map(|region| {
                let polygon = region.geometry.clone()?;
                Some(BoundaryEntry {
                    region: region.id,
                    envelope: compute_envelope(&polygon),
                    polygon,
                })
            })
            .collect();

        log::debug!(
            "Indexed {} of {} districts into spatial index",
            entries.len(),
            regions.len()
        );

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Locates the district containing a point.
    ///
    /// Districts are tried in input order. A point strictly inside a
    /// district matches the first such district. Otherwise a point on an
    /// outline matches the first district it touches, so a point on a
    /// shared edge always goes to the district listed first.
    #[must_use]
    pub fn place(&self, position: Coordinate) -> Placement {
        let point = position.to_point();
        let query_env = AABB::from_point([point.x(), point.y()]);

        let mut candidates: Vec<&BoundaryEntry> = self
            .tree
            .locate_in_envelope_intersecting(&query_env)
            .collect();
        candidates.sort_by_key(|entry| entry.region);

        if let Some(entry) = candidates.iter().find(|e| e.polygon.contains(&point)) {
            return Placement::Interior(entry.region);
        }
        if let Some(entry) = candidates.iter().find(|e| e.polygon.intersects(&point)) {
            return Placement::Boundary(entry.region);
        }
        Placement::Outside
    }

    /// Shorthand for [`Self::place`] reduced to the matched district.
    #[must_use]
    pub fn locate(&self, position: Coordinate) -> Option<RegionId> {
        self.place(position).region()
    }

    /// Number of indexed polygons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether no polygon was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// Centroid of a district outline, if it has one.
#[must_use]
pub fn region_centroid(region: &Region) -> Option<Coordinate> {
    let centroid = region.geometry.as_ref()?.centroid()?;
    Some(Coordinate::new(centroid.y(), centroid.x()))
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}
