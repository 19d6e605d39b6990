#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Library for estimating rain at traffic cameras and attributing it to
//! neighborhoods.
//!
//! A run loads the neighborhood boundaries and the camera list, scores
//! each camera's current frame one at a time, and folds the scores into
//! one record per (neighborhood, street) pair.

pub mod pipeline;

use std::collections::BTreeMap;
use std::time::Duration;

use rain_map_camera::progress::ProgressCallback;
use rain_map_camera::{CameraError, HttpImageSource};
use rain_map_camera_models::{BatchReport, CameraSource, SourceProjection};
use rain_map_database::DbError;
use rain_map_detect::{DetectConfig, EdgeDensityEstimator};
use rain_map_neighborhood::NeighborhoodError;
use rain_map_neighborhood_models::NeighborhoodSource;
use rain_map_spatial::{NeighborhoodIndex, StatePlaneProjection, TransformError};
use thiserror::Error;

pub use pipeline::{BatchContext, process_camera, run_batch};

/// Default boundary source used by the CLI.
pub const DEFAULT_NEIGHBORHOOD_SOURCE: &str = "seattle_neighborhoods";

/// Default camera source used by the CLI.
pub const DEFAULT_CAMERA_SOURCE: &str = "seattle_traffic_cameras";

/// Errors that abort a whole run. Per-camera failures never surface here.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Boundary dataset could not be loaded.
    #[error(transparent)]
    Neighborhood(#[from] NeighborhoodError),

    /// Camera list could not be loaded.
    #[error(transparent)]
    Camera(#[from] CameraError),

    /// A coordinate could not be reprojected.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Storage failed.
    #[error(transparent)]
    Db(#[from] DbError),

    /// HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Unknown source id or similar configuration problem.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

/// Knobs for a full run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Boundary source id.
    pub neighborhood_source: String,
    /// Camera source id.
    pub camera_source: String,
    /// Edge detection and rain classification tuning.
    pub detect: DetectConfig,
    /// Only process the first `limit` cameras.
    pub limit: Option<usize>,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            neighborhood_source: DEFAULT_NEIGHBORHOOD_SOURCE.to_string(),
            camera_source: DEFAULT_CAMERA_SOURCE.to_string(),
            detect: DetectConfig::default(),
            limit: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Builds the HTTP client shared by dataset and image requests.
///
/// # Errors
///
/// Returns [`IngestError::Http`] if the TLS backend cannot be initialized.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, IngestError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("rain_map/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Looks up a boundary source by id.
///
/// # Errors
///
/// Returns [`IngestError::Config`] if no source has that id.
pub fn neighborhood_source(id: &str) -> Result<NeighborhoodSource, IngestError> {
    rain_map_neighborhood::registry::find_source(id).ok_or_else(|| IngestError::Config {
        message: format!("Unknown neighborhood source: {id}"),
    })
}

/// Looks up a camera source by id.
///
/// # Errors
///
/// Returns [`IngestError::Config`] if no source has that id.
pub fn camera_source(id: &str) -> Result<CameraSource, IngestError> {
    rain_map_camera::registry::find_source(id).ok_or_else(|| IngestError::Config {
        message: format!("Unknown camera source: {id}"),
    })
}

/// The projection that reverses a dataset's published coordinates.
///
/// # Errors
///
/// Returns [`IngestError::Transform`] if the projection definition cannot
/// be parsed.
pub fn projection_for(projection: SourceProjection) -> Result<StatePlaneProjection, IngestError> {
    Ok(match projection {
        SourceProjection::WashingtonNorthFtus => StatePlaneProjection::washington_north()?,
    })
}

/// Fetches the boundary dataset and builds a resolver for cameras
/// published in `projection`.
///
/// # Errors
///
/// Returns [`IngestError`] if the projection cannot be built or the
/// boundary dataset cannot be loaded.
pub async fn load_index(
    client: &reqwest::Client,
    source: &NeighborhoodSource,
    projection: SourceProjection,
) -> Result<NeighborhoodIndex, IngestError> {
    let projection = projection_for(projection)?;
    let regions = rain_map_neighborhood::load_regions(client, source).await?;
    Ok(NeighborhoodIndex::new(&regions, projection))
}

/// Runs a full batch against the live datasets.
///
/// Loading failures abort the run; per-camera failures are recorded in the
/// returned report.
///
/// # Errors
///
/// Returns [`IngestError`] if a source id is unknown or a dataset cannot
/// be loaded.
pub async fn run(
    options: &RunOptions,
    progress: &dyn ProgressCallback,
) -> Result<BatchReport, IngestError> {
    let client = build_client(options.timeout)?;
    let boundaries = neighborhood_source(&options.neighborhood_source)?;
    let cameras = camera_source(&options.camera_source)?;

    progress.set_message(format!("Loading {}", boundaries.name));
    let index = load_index(&client, &boundaries, cameras.projection).await?;

    progress.set_message(format!("Loading {}", cameras.name));
    let mut catalog = rain_map_camera::load_cameras(&client, &cameras).await?;
    if let Some(limit) = options.limit
        && catalog.cameras.len() > limit
    {
        log::info!("Limiting run to the first {limit} of {} cameras", catalog.cameras.len());
        catalog.cameras.truncate(limit);
    }

    let images = HttpImageSource::new(client);
    let estimator = EdgeDensityEstimator::new(options.detect);
    let ctx = BatchContext {
        index: &index,
        images: &images,
        estimator: &estimator,
    };

    Ok(run_batch(&ctx, catalog, progress).await)
}

/// Counts skipped cameras by reason.
#[must_use]
pub fn skip_summary(report: &BatchReport) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for (_, reason) in report.skipped() {
        *counts.entry(reason.kind()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use rain_map_camera_models::{CameraOutcome, SkipReason};

    fn skipped(kind: SkipReason) -> CameraOutcome {
        CameraOutcome::Skipped {
            url: "https://host/images/a_b_N.jpg".to_string(),
            neighborhood: None,
            street_label: "a and b".to_string(),
            reason: kind,
        }
    }

    #[test]
    fn summarizes_skips_by_reason() {
        let report = BatchReport {
            outcomes: vec![
                skipped(SkipReason::Fetch("timeout".to_string())),
                skipped(SkipReason::Fetch("404".to_string())),
                skipped(SkipReason::Decode("bad magic".to_string())),
            ],
            records: Vec::new(),
            excluded: 0,
        };
        let summary = skip_summary(&report);
        assert_eq!(summary.get("fetch"), Some(&2));
        assert_eq!(summary.get("decode"), Some(&1));
        assert_eq!(summary.get("transform"), None);
    }

    #[test]
    fn default_sources_are_registered() {
        let options = RunOptions::default();
        assert!(neighborhood_source(&options.neighborhood_source).is_ok());
        let cameras = camera_source(&options.camera_source).unwrap();
        assert_eq!(cameras.projection, SourceProjection::WashingtonNorthFtus);
    }

    #[test]
    fn camera_projection_reverses_published_feet() {
        let projection = projection_for(SourceProjection::WashingtonNorthFtus).unwrap();
        let pike_place = projection.inverse(1_269_000.0, 227_000.0).unwrap();
        assert!((-122.35..-122.33).contains(&pike_place.x), "longitude {}", pike_place.x);
        assert!((47.60..47.62).contains(&pike_place.y), "latitude {}", pike_place.y);
    }

    #[test]
    fn unknown_source_is_a_config_error() {
        assert!(matches!(
            camera_source("atlantis"),
            Err(IngestError::Config { .. })
        ));
    }
}
