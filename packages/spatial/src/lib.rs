#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index for neighborhood attribution.
//!
//! Takes the normalized boundary regions once at startup, builds an R-tree
//! over their exterior rings, and resolves state-plane camera positions to
//! neighborhood names. Containment uses the ray-casting rule in
//! [`polygon::contains`]; the R-tree only narrows the candidate rings.

pub mod polygon;
pub mod projection;

use geo::{BoundingRect, Coord, LineString};
use rain_map_neighborhood_models::{BoundaryRegion, UNKNOWN_NEIGHBORHOOD};
use rstar::{AABB, RTree, RTreeObject};

pub use projection::{StatePlaneProjection, TransformError};

/// One exterior ring stored in the R-tree with its dataset position.
struct RingEntry {
    /// Index of the owning region in dataset order.
    region: usize,
    /// Index of the ring within its region.
    ring_index: usize,
    envelope: AABB<[f64; 2]>,
    ring: LineString<f64>,
}

impl RTreeObject for RingEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Resolves coordinates to neighborhood names.
///
/// Built once per run and shared read-only. When regions overlap, the one
/// that appears first in the dataset wins.
pub struct NeighborhoodIndex {
    projection: StatePlaneProjection,
    names: Vec<String>,
    rings: RTree<RingEntry>,
}

impl NeighborhoodIndex {
    /// Builds the index from regions in dataset order.
    #[must_use]
    pub fn new(regions: &[BoundaryRegion], projection: StatePlaneProjection) -> Self {
        let mut entries = Vec::new();

        for (region, boundary) in regions.iter().enumerate() {
            for (ring_index, ring) in boundary.rings().iter().enumerate() {
                let ring: LineString<f64> = ring.iter().map(|&[x, y]| Coord { x, y }).collect();
                let Some(envelope) = compute_envelope(&ring) else {
                    log::debug!("{}: skipping empty ring {ring_index}", boundary.name);
                    continue;
                };
                entries.push(RingEntry {
                    region,
                    ring_index,
                    envelope,
                    ring,
                });
            }
        }

        log::info!(
            "Indexed {} rings across {} neighborhoods",
            entries.len(),
            regions.len()
        );

        Self {
            projection,
            names: regions.iter().map(|r| r.name.clone()).collect(),
            rings: RTree::bulk_load(entries),
        }
    }

    /// The projection applied by [`Self::resolve`].
    #[must_use]
    pub const fn projection(&self) -> &StatePlaneProjection {
        &self.projection
    }

    /// Resolves a projected coordinate to a neighborhood name, or
    /// [`UNKNOWN_NEIGHBORHOOD`] when no region contains it.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError`] if the coordinate cannot be reprojected.
    pub fn resolve(&self, x: f64, y: f64) -> Result<&str, TransformError> {
        let geographic = self.projection.inverse(x, y)?;
        Ok(self
            .lookup(geographic.x, geographic.y)
            .unwrap_or(UNKNOWN_NEIGHBORHOOD))
    }

    /// Looks up the first region, in dataset order, whose exterior ring
    /// contains the geographic point.
    #[must_use]
    pub fn lookup(&self, lng: f64, lat: f64) -> Option<&str> {
        let point = Coord { x: lng, y: lat };
        let query_env = AABB::from_point([lng, lat]);

        self.rings
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| polygon::contains(point, &entry.ring.0))
            .min_by_key(|entry| (entry.region, entry.ring_index))
            .map(|entry| self.names[entry.region].as_str())
    }
}

/// Compute the bounding box envelope of a ring, or `None` if it is empty.
fn compute_envelope(ring: &LineString<f64>) -> Option<AABB<[f64; 2]>> {
    ring.bounding_rect()
        .map(|rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}
