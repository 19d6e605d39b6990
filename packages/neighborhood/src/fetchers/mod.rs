//! Fetcher dispatch and implementations for different API types.
//!
//! Each fetcher downloads a raw `GeoJSON` `FeatureCollection` from a
//! city's open data portal and returns its `features` array.

pub mod arcgis;
pub mod geojson_url;

use rain_map_neighborhood_models::{NeighborhoodFetcherConfig, NeighborhoodSource};

use crate::NeighborhoodError;

/// Fetches raw `GeoJSON` features from the source's API.
///
/// # Errors
///
/// Returns [`NeighborhoodError`] if the HTTP request or response
/// parsing fails.
pub async fn fetch_features(
    client: &reqwest::Client,
    source: &NeighborhoodSource,
) -> Result<Vec<serde_json::Value>, NeighborhoodError> {
    match &source.fetcher {
        NeighborhoodFetcherConfig::Arcgis { url, max_records } => {
            arcgis::fetch(client, url, *max_records).await
        }
        NeighborhoodFetcherConfig::GeojsonUrl { url } => geojson_url::fetch(client, url).await,
    }
}

/// Parses a response body and pulls out its `features` array.
///
/// `label` names the API in error messages.
fn parse_collection(body: &str, label: &str) -> Result<serde_json::Value, NeighborhoodError> {
    let json: serde_json::Value =
        serde_json::from_str(body).map_err(|e| NeighborhoodError::Conversion {
            message: format!("Failed to parse {label} response: {e}"),
        })?;

    if let Some(error) = json.get("error") {
        return Err(NeighborhoodError::Conversion {
            message: format!(
                "{label} API error: {}",
                error["message"].as_str().unwrap_or("unknown error")
            ),
        });
    }

    if !json["features"].is_array() {
        return Err(NeighborhoodError::Conversion {
            message: format!("No features array in {label} response"),
        });
    }

    Ok(json)
}
