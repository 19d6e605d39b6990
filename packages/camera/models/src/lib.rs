#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Camera source definitions and the records that flow through a rain
//! detection run.
//!
//! A run turns each [`CameraRecord`] into a [`CameraOutcome`]. Scored
//! cameras carry a [`RainObservation`]; the aggregator folds those into one
//! [`AggregateRainRecord`] per (neighborhood, street label) key.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder used for either street when a camera URL has no street pair.
pub const UNKNOWN_STREET: &str = "Unknown";

/// A traffic camera data source, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSource {
    /// Unique source identifier (e.g., `"seattle_traffic_cameras"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// City the cameras are in.
    pub city: String,
    /// Two-letter state abbreviation.
    pub state: String,
    /// URL returning a `GeoJSON` `FeatureCollection` of camera points.
    pub url: String,
    /// Projection the camera point coordinates are published in.
    pub projection: SourceProjection,
    /// Field mapping for extracting the camera image URL.
    pub fields: CameraFieldMapping,
}

impl CameraSource {
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

/// Coordinate reference system of a camera dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceProjection {
    /// EPSG:2285, NAD83 / Washington North in US survey feet.
    WashingtonNorthFtus,
}

/// Field mapping for camera features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraFieldMapping {
    /// Property field holding the camera image URL.
    pub url: String,
}

/// One camera as listed in the camera dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRecord {
    /// Image URL, which doubles as the camera identifier.
    pub url: String,
    /// Easting in the source projection.
    pub x: f64,
    /// Northing in the source projection.
    pub y: f64,
}

/// The two streets of an intersection, parsed from a camera URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreetLabel {
    /// First street token, verbatim.
    pub street_a: String,
    /// Second street token, verbatim.
    pub street_b: String,
}

impl StreetLabel {
    /// Creates a label from two street names.
    #[must_use]
    pub fn new(street_a: impl Into<String>, street_b: impl Into<String>) -> Self {
        Self {
            street_a: street_a.into(),
            street_b: street_b.into(),
        }
    }

    /// The label used when a URL does not name an intersection.
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_STREET, UNKNOWN_STREET)
    }

    /// Whether this is the [`Self::unknown`] label.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.street_a == UNKNOWN_STREET && self.street_b == UNKNOWN_STREET
    }
}

impl fmt::Display for StreetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} and {}", self.street_a, self.street_b)
    }
}

/// A scored camera frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RainObservation {
    /// Neighborhood the camera resolved to.
    pub neighborhood: String,
    /// Street label in `"<a> and <b>"` form.
    pub street_label: String,
    /// Edge density of the frame.
    pub edge_density: f64,
}

/// Per-(neighborhood, street) summary emitted at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRainRecord {
    /// Neighborhood name.
    pub neighborhood: String,
    /// Street label in `"<a> and <b>"` form.
    pub street_label: String,
    /// Mean density of the rain-positive frames, or 0 when there were none.
    pub average_density: f64,
    /// Whether any contributing frame was rain-positive.
    pub rain_detected: bool,
    /// When the batch was finalized. Shared by every record of a run.
    pub timestamp: DateTime<Utc>,
}

/// Why a camera produced no observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The camera coordinate could not be reprojected.
    Transform(String),
    /// The image request failed or returned a non-success status.
    Fetch(String),
    /// The response body was not a decodable image.
    Decode(String),
}

impl SkipReason {
    /// Short machine-friendly name of the reason.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Transform(_) => "transform",
            Self::Fetch(_) => "fetch",
            Self::Decode(_) => "decode",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform(msg) => write!(f, "coordinate transform failed: {msg}"),
            Self::Fetch(msg) => write!(f, "image fetch failed: {msg}"),
            Self::Decode(msg) => write!(f, "image decode failed: {msg}"),
        }
    }
}

/// Result of processing one camera.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraOutcome {
    /// The frame was fetched, decoded, and scored.
    Observed(RainObservation),
    /// The camera was skipped; the batch continued.
    Skipped {
        /// Camera image URL.
        url: String,
        /// Neighborhood, if it was resolved before the failure.
        neighborhood: Option<String>,
        /// Street label in `"<a> and <b>"` form.
        street_label: String,
        /// What went wrong.
        reason: SkipReason,
    },
}

/// Everything a batch run produced.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// One outcome per processed camera, in dataset order.
    pub outcomes: Vec<CameraOutcome>,
    /// Finalized aggregate records, ordered by key.
    pub records: Vec<AggregateRainRecord>,
    /// Cameras excluded before processing (no URL, or a bare image id URL).
    pub excluded: usize,
}

impl BatchReport {
    /// Number of cameras that produced an observation.
    #[must_use]
    pub fn observed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, CameraOutcome::Observed(_)))
            .count()
    }

    /// Cameras that were skipped, with their reasons.
    pub fn skipped(&self) -> impl Iterator<Item = (&str, &SkipReason)> {
        self.outcomes.iter().filter_map(|o| match o {
            CameraOutcome::Skipped { url, reason, .. } => Some((url.as_str(), reason)),
            CameraOutcome::Observed(_) => None,
        })
    }
}
