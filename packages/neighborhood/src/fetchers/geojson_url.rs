//! Direct `GeoJSON` URL fetcher.

use crate::NeighborhoodError;

/// Fetches all features from a URL returning a `GeoJSON`
/// `FeatureCollection`.
///
/// # Errors
///
/// Returns [`NeighborhoodError`] if the request fails or the response
/// cannot be parsed.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<serde_json::Value>, NeighborhoodError> {
    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(NeighborhoodError::Conversion {
            message: format!("GeoJSON request failed with status {}", resp.status()),
        });
    }
    let body = resp.text().await?;
    let mut json = super::parse_collection(&body, "GeoJSON")?;

    match json["features"].take() {
        serde_json::Value::Array(features) => Ok(features),
        _ => Ok(Vec::new()),
    }
}
