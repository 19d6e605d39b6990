#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Neighborhood boundary fetching and normalization.
//!
//! Downloads neighborhood polygons from city open data portals and turns
//! them into [`BoundaryRegion`](rain_map_neighborhood_models::BoundaryRegion)
//! values for the spatial resolver. Sources are defined as TOML files
//! embedded at compile time.

pub mod fetchers;
pub mod normalize;
pub mod registry;

use rain_map_neighborhood_models::{BoundaryRegion, NeighborhoodSource};
use thiserror::Error;

/// Errors that can occur during neighborhood operations.
#[derive(Debug, Error)]
pub enum NeighborhoodError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Data conversion or normalization error.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Fetches and normalizes every boundary region of a source.
///
/// Regions are returned in dataset order, which is the order the resolver
/// uses to break ties between overlapping polygons.
///
/// # Errors
///
/// Returns [`NeighborhoodError`] if fetching fails or a feature carries a
/// malformed coordinate.
pub async fn load_regions(
    client: &reqwest::Client,
    source: &NeighborhoodSource,
) -> Result<Vec<BoundaryRegion>, NeighborhoodError> {
    log::info!(
        "Fetching neighborhoods for {} ({}, {}): {}",
        source.id,
        source.city,
        source.state,
        source.name,
    );

    let features = fetchers::fetch_features(client, source).await?;
    log::info!("{}: fetched {} raw features", source.id, features.len());

    let regions = normalize::normalize_features(&features, &source.fields)?;
    log::info!(
        "{}: normalized {} regions from {} features",
        source.id,
        regions.len(),
        features.len()
    );

    Ok(regions)
}
