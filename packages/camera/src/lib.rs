#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Traffic camera catalog, street labels, and frame retrieval.
//!
//! Camera lists are fetched as `GeoJSON` point collections described by
//! TOML source definitions embedded at compile time. Each camera's image
//! URL is both its identifier and the place its current frame is
//! downloaded from.

pub mod fetcher;
pub mod image_source;
pub mod normalize;
pub mod progress;
pub mod registry;
pub mod street;

use rain_map_camera_models::{CameraRecord, CameraSource};
use thiserror::Error;

pub use image_source::{HttpImageSource, ImageSource};

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Request to {url} failed with status {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Image bytes could not be decoded.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A feature was not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Data conversion or normalization error.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Cameras ready for processing, plus how many were dropped up front.
#[derive(Debug, Clone, Default)]
pub struct CameraCatalog {
    /// Cameras in dataset order.
    pub cameras: Vec<CameraRecord>,
    /// Features excluded before processing.
    pub excluded: usize,
}

/// Fetches and normalizes the camera list of a source.
///
/// # Errors
///
/// Returns [`CameraError`] if the dataset cannot be fetched or parsed.
pub async fn load_cameras(
    client: &reqwest::Client,
    source: &CameraSource,
) -> Result<CameraCatalog, CameraError> {
    log::info!(
        "Fetching cameras for {} ({}, {}): {}",
        source.id,
        source.city,
        source.state,
        source.name,
    );

    let features = fetcher::fetch(client, &source.url).await?;
    let catalog = normalize::normalize_features(features, &source.fields)?;

    log::info!(
        "{}: {} cameras usable, {} excluded",
        source.id,
        catalog.cameras.len(),
        catalog.excluded
    );

    Ok(catalog)
}
