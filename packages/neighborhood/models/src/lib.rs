#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Neighborhood boundary source definition types.
//!
//! Defines the TOML schema for neighborhood data sources and the
//! normalized boundary types produced after fetching and parsing. Upstream
//! geometry encodings are resolved into [`BoundaryGeometry`] at ingestion
//! time, so downstream consumers only ever see flat exterior rings.

use serde::{Deserialize, Serialize};

/// Name returned when a coordinate falls outside every known boundary.
pub const UNKNOWN_NEIGHBORHOOD: &str = "Unknown";

/// A neighborhood boundary data source, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborhoodSource {
    /// Unique source identifier (e.g., `"seattle_neighborhoods"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// City the boundaries cover.
    pub city: String,
    /// Two-letter state abbreviation.
    pub state: String,
    /// Fetcher configuration.
    pub fetcher: NeighborhoodFetcherConfig,
    /// Field mapping for extracting name and geometry.
    pub fields: NeighborhoodFieldMapping,
}

impl NeighborhoodSource {
    /// Returns the source identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the human-readable source name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// How to fetch neighborhood boundary data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NeighborhoodFetcherConfig {
    /// `ArcGIS` `FeatureServer` or `MapServer` query endpoint.
    ///
    /// Appends `?where=1%3D1&outFields=*&f=geojson` plus paging parameters.
    Arcgis {
        /// Base query URL (up to `.../query`).
        url: String,
        /// Maximum records to request per page (default: 1000).
        max_records: Option<u32>,
    },
    /// Direct `GeoJSON` URL (static file or API returning standard `GeoJSON`).
    GeojsonUrl {
        /// Full URL that returns a `GeoJSON` `FeatureCollection`.
        url: String,
    },
}

/// Field mapping for extracting neighborhood name and geometry from
/// raw API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborhoodFieldMapping {
    /// Property field containing the neighborhood name.
    pub name: String,
    /// How to extract polygon geometry from each feature.
    pub geometry: GeometryExtractor,
}

/// How to extract polygon geometry from a feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeometryExtractor {
    /// Geometry is a `GeoJSON` `Polygon` or `MultiPolygon` object.
    Geojson,
    /// Geometry uses Esri JSON format (`{ "rings": [...] }`).
    EsriRings,
}

/// A closed sequence of `[x, y]` positions. The closing edge from the last
/// position back to the first is implied.
pub type Ring = Vec<[f64; 2]>;

/// Exterior rings of a boundary, tagged by the upstream geometry kind.
///
/// Interior rings (holes) are dropped during normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryGeometry {
    /// A single polygon.
    Polygon {
        /// Outer ring of the polygon.
        exterior: Ring,
    },
    /// Several disjoint polygons sharing one name.
    MultiPolygon {
        /// Outer ring of each member polygon, in dataset order.
        exteriors: Vec<Ring>,
    },
}

impl BoundaryGeometry {
    /// Returns the exterior rings in dataset order.
    #[must_use]
    pub fn rings(&self) -> &[Ring] {
        match self {
            Self::Polygon { exterior } => std::slice::from_ref(exterior),
            Self::MultiPolygon { exteriors } => exteriors,
        }
    }
}

/// A named neighborhood region, ready for point lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryRegion {
    /// Human-readable neighborhood name.
    pub name: String,
    /// Exterior ring geometry.
    pub geometry: BoundaryGeometry,
}

impl BoundaryRegion {
    /// Creates a single-polygon region.
    #[must_use]
    pub fn polygon(name: impl Into<String>, exterior: Ring) -> Self {
        Self {
            name: name.into(),
            geometry: BoundaryGeometry::Polygon { exterior },
        }
    }

    /// Returns the exterior rings in dataset order.
    #[must_use]
    pub fn rings(&self) -> &[Ring] {
        self.geometry.rings()
    }
}
