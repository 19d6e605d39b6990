//! Converts camera `GeoJSON` features into [`CameraRecord`]s.
//!
//! Features without an image URL, with a bare image id URL, or without a
//! point geometry are counted as excluded rather than failing the load.

use geojson::{Feature, Value};
use rain_map_camera_models::{CameraFieldMapping, CameraRecord};

use crate::{CameraCatalog, CameraError, street};

/// Normalizes camera features in dataset order.
///
/// # Errors
///
/// Returns [`CameraError::Conversion`] if a point carries a non-numeric
/// or missing ordinate.
pub fn normalize_features(
    features: Vec<Feature>,
    fields: &CameraFieldMapping,
) -> Result<CameraCatalog, CameraError> {
    let mut catalog = CameraCatalog::default();

    for (index, feature) in features.into_iter().enumerate() {
        let Some(url) = image_url(&feature, &fields.url) else {
            log::debug!("Camera feature {index}: no {} property, excluding", fields.url);
            catalog.excluded += 1;
            continue;
        };

        if street::is_excluded(&url) {
            log::debug!("Camera feature {index}: bare image id {url}, excluding");
            catalog.excluded += 1;
            continue;
        }

        let Some(position) = point_position(&feature) else {
            log::warn!("Camera {url}: geometry is not a point, excluding");
            catalog.excluded += 1;
            continue;
        };

        let [x, y] = match position.as_slice() {
            [x, y, ..] => [*x, *y],
            _ => {
                return Err(CameraError::Conversion {
                    message: format!("Camera {url}: point has {} ordinates", position.len()),
                });
            }
        };

        catalog.cameras.push(CameraRecord { url, x, y });
    }

    Ok(catalog)
}

fn image_url(feature: &Feature, field: &str) -> Option<String> {
    feature
        .property(field)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(ToString::to_string)
}

fn point_position(feature: &Feature) -> Option<&Vec<f64>> {
    match &feature.geometry.as_ref()?.value {
        Value::Point(position) => Some(position),
        _ => None,
    }
}
