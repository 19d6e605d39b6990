//! `ArcGIS` `FeatureServer` / `MapServer` fetcher.
//!
//! Queries an `ArcGIS` REST endpoint with `f=geojson`. Pages through
//! services with transfer limits via `resultOffset`.

use crate::NeighborhoodError;

/// Builds the query URL for one page of results.
fn page_url(base_url: &str, record_count: u32, offset: u32) -> String {
    format!(
        "{base_url}\
         ?where=1%3D1\
         &outFields=*\
         &f=geojson\
         &returnGeometry=true\
         &resultRecordCount={record_count}\
         &resultOffset={offset}"
    )
}

/// Fetches all features from an `ArcGIS` query endpoint.
///
/// Keeps requesting pages while the server reports
/// `exceededTransferLimit`.
///
/// # Errors
///
/// Returns [`NeighborhoodError`] if a request fails or a response cannot
/// be parsed.
pub async fn fetch(
    client: &reqwest::Client,
    base_url: &str,
    max_records: Option<u32>,
) -> Result<Vec<serde_json::Value>, NeighborhoodError> {
    let record_count = max_records.unwrap_or(1000);
    let mut all_features = Vec::new();
    let mut offset = 0u32;

    loop {
        let resp = client
            .get(page_url(base_url, record_count, offset))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(NeighborhoodError::Conversion {
                message: format!("ArcGIS request failed with status {}", resp.status()),
            });
        }
        let body = resp.text().await?;
        let mut json = super::parse_collection(&body, "ArcGIS")?;

        let exceeded = json["exceededTransferLimit"].as_bool().unwrap_or(false);
        let serde_json::Value::Array(features) = json["features"].take() else {
            break;
        };
        if features.is_empty() {
            break;
        }

        let page_len = u32::try_from(features.len()).unwrap_or(u32::MAX);
        all_features.extend(features);
        log::debug!("ArcGIS page at offset {offset}: {page_len} features");

        if !exceeded {
            break;
        }
        offset = offset.saturating_add(page_len);
    }

    Ok(all_features)
}
