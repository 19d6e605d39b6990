//! `GeoJSON` camera list fetcher.

use geojson::{Feature, GeoJson};

use crate::CameraError;

/// Fetches every feature of a `GeoJSON` `FeatureCollection`.
///
/// # Errors
///
/// Returns [`CameraError`] if the request fails, the server answers with a
/// non-success status, or the body is not a feature collection.
pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<Vec<Feature>, CameraError> {
    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(CameraError::Status {
            url: url.to_string(),
            status: resp.status().as_u16(),
        });
    }
    let body = resp.text().await?;
    let features = parse_collection(&body)?;
    log::debug!("Fetched {} camera features from {url}", features.len());
    Ok(features)
}

/// Parses a response body as a `FeatureCollection`.
fn parse_collection(body: &str) -> Result<Vec<Feature>, CameraError> {
    match body.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(collection.features),
        GeoJson::Feature(_) | GeoJson::Geometry(_) => Err(CameraError::Conversion {
            message: "Camera dataset is not a FeatureCollection".to_string(),
        }),
    }
}
