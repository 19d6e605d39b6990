//! Normalizes raw `GeoJSON` features into [`BoundaryRegion`] values.
//!
//! Uses the source's [`NeighborhoodFieldMapping`] to extract the
//! neighborhood name and geometry from each feature. Upstream datasets mix
//! encodings: a polygon's first ring may arrive either as a flat list of
//! positions or wrapped in one extra level of nesting. The depth is
//! detected here, once, so the point-in-polygon engine only ever sees flat
//! rings.

use rain_map_neighborhood_models::{
    BoundaryGeometry, BoundaryRegion, GeometryExtractor, NeighborhoodFieldMapping, Ring,
};
use serde_json::Value;

use crate::NeighborhoodError;

/// Normalizes a list of raw `GeoJSON` features into boundary regions,
/// preserving dataset order.
///
/// Features with missing names or unsupported geometry kinds are skipped.
///
/// # Errors
///
/// Returns [`NeighborhoodError::Conversion`] if any position is not a
/// pair of numbers.
pub fn normalize_features(
    features: &[Value],
    fields: &NeighborhoodFieldMapping,
) -> Result<Vec<BoundaryRegion>, NeighborhoodError> {
    let mut regions = Vec::with_capacity(features.len());
    for feature in features {
        if let Some(region) = normalize_feature(feature, fields)? {
            regions.push(region);
        }
    }
    Ok(regions)
}

/// Normalizes a single feature. `Ok(None)` means the feature was skipped.
fn normalize_feature(
    feature: &Value,
    fields: &NeighborhoodFieldMapping,
) -> Result<Option<BoundaryRegion>, NeighborhoodError> {
    let Some(name) = feature
        .get("properties")
        .and_then(|props| props.get(&fields.name))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
    else {
        return Ok(None);
    };

    let Some(geometry) = feature.get("geometry").filter(|g| !g.is_null()) else {
        log::debug!("{name}: feature has no geometry, skipping");
        return Ok(None);
    };

    let geometry = match &fields.geometry {
        GeometryExtractor::Geojson => geojson_geometry(name, geometry)?,
        GeometryExtractor::EsriRings => esri_geometry(name, geometry)?,
    };

    Ok(geometry.map(|geometry| BoundaryRegion {
        name: name.to_string(),
        geometry,
    }))
}

/// Converts a `GeoJSON` `Polygon` / `MultiPolygon` object.
fn geojson_geometry(
    name: &str,
    geometry: &Value,
) -> Result<Option<BoundaryGeometry>, NeighborhoodError> {
    let kind = geometry.get("type").and_then(Value::as_str).unwrap_or("");
    let coordinates = &geometry["coordinates"];

    match kind {
        "Polygon" => Ok(exterior_ring(name, coordinates)?
            .map(|exterior| BoundaryGeometry::Polygon { exterior })),
        "MultiPolygon" => {
            let Some(members) = coordinates.as_array() else {
                log::debug!("{name}: MultiPolygon without coordinates, skipping");
                return Ok(None);
            };
            let mut exteriors = Vec::with_capacity(members.len());
            for member in members {
                if let Some(ring) = exterior_ring(name, member)? {
                    exteriors.push(ring);
                }
            }
            if exteriors.is_empty() {
                return Ok(None);
            }
            Ok(Some(BoundaryGeometry::MultiPolygon { exteriors }))
        }
        other => {
            log::debug!("{name}: unsupported geometry type {other:?}, skipping");
            Ok(None)
        }
    }
}

/// Converts Esri JSON geometry (`{ "rings": [...] }`). Every ring is
/// treated as the exterior of its own polygon.
fn esri_geometry(
    name: &str,
    geometry: &Value,
) -> Result<Option<BoundaryGeometry>, NeighborhoodError> {
    let Some(rings) = geometry.get("rings").and_then(Value::as_array) else {
        log::debug!("{name}: Esri geometry without rings, skipping");
        return Ok(None);
    };

    let mut exteriors = Vec::with_capacity(rings.len());
    for ring in rings {
        let parsed = parse_ring(name, ring)?;
        if !parsed.is_empty() {
            exteriors.push(parsed);
        }
    }

    Ok(match exteriors.len() {
        0 => None,
        1 => exteriors
            .pop()
            .map(|exterior| BoundaryGeometry::Polygon { exterior }),
        _ => Some(BoundaryGeometry::MultiPolygon { exteriors }),
    })
}

/// Extracts the exterior ring of one polygon's coordinate array.
///
/// The first element of `polygon` is the exterior. When that element's
/// first member is itself an array of arrays, the exterior arrived one
/// level deeper and its first nested sequence is used instead.
fn exterior_ring(name: &str, polygon: &Value) -> Result<Option<Ring>, NeighborhoodError> {
    let Some(mut exterior) = polygon.as_array().and_then(|rings| rings.first()) else {
        log::debug!("{name}: polygon without rings, skipping");
        return Ok(None);
    };

    if exterior[0][0].is_array() {
        exterior = &exterior[0];
    }

    let ring = parse_ring(name, exterior)?;
    if ring.is_empty() {
        return Ok(None);
    }
    Ok(Some(ring))
}

/// Parses a flat array of `[x, y]` positions. Extra members (z, m) are
/// ignored.
fn parse_ring(name: &str, ring: &Value) -> Result<Ring, NeighborhoodError> {
    let Some(positions) = ring.as_array() else {
        return Err(NeighborhoodError::Conversion {
            message: format!("{name}: ring is not an array: {ring}"),
        });
    };

    positions
        .iter()
        .map(|position| {
            match (
                position.get(0).and_then(Value::as_f64),
                position.get(1).and_then(Value::as_f64),
            ) {
                (Some(x), Some(y)) => Ok([x, y]),
                _ => Err(NeighborhoodError::Conversion {
                    message: format!("{name}: malformed position {position}"),
                }),
            }
        })
        .collect()
}
