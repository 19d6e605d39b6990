//! Compile-time registry of neighborhood boundary data sources.
//!
//! Each entry is a `(name, toml_content)` pair embedded via `include_str!`.
//! Adding a new city requires creating a TOML file in `sources/` and adding
//! a corresponding entry here.

use rain_map_neighborhood_models::NeighborhoodSource;

/// Number of registered neighborhood sources. Enforced by a test.
#[cfg(test)]
const EXPECTED_SOURCE_COUNT: usize = 1;

/// Embedded TOML source definitions.
const SOURCE_TOMLS: &[(&str, &str)] = &[("seattle", include_str!("../sources/seattle.toml"))];

/// Returns all registered neighborhood sources.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. Since these are
/// compile-time constants, parse failures indicate a development error.
#[must_use]
pub fn all_sources() -> Vec<NeighborhoodSource> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse neighborhood source '{name}': {e}"))
        })
        .collect()
}

/// Looks up a source by its identifier.
#[must_use]
pub fn find_source(id: &str) -> Option<NeighborhoodSource> {
    all_sources().into_iter().find(|s| s.id == id)
}
