//! Compile-time registry of traffic camera sources.
//!
//! Each entry is a `(name, toml_content)` pair embedded via `include_str!`.

use rain_map_camera_models::CameraSource;

/// Number of registered camera sources. Enforced by a test.
#[cfg(test)]
const EXPECTED_SOURCE_COUNT: usize = 1;

const SOURCE_TOMLS: &[(&str, &str)] = &[("seattle", include_str!("../sources/seattle.toml"))];

/// Returns all registered camera sources.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. Since these are
/// compile-time constants, parse failures indicate a development error.
#[must_use]
pub fn all_sources() -> Vec<CameraSource> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse camera source '{name}': {e}"))
        })
        .collect()
}

/// Looks up a source by its identifier.
#[must_use]
pub fn find_source(id: &str) -> Option<CameraSource> {
    all_sources().into_iter().find(|s| s.id == id)
}
