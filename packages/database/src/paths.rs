//! Canonical file paths for the `DuckDB` data directory.

use std::path::{Path, PathBuf};

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`. Falls back to the
/// manifest directory itself if the crate is built outside the workspace.
#[must_use]
pub fn project_root() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .ancestors()
        .nth(2)
        .unwrap_or(manifest)
        .to_path_buf()
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the default path of the rain observations `DuckDB` file.
#[must_use]
pub fn rain_db_path() -> PathBuf {
    data_dir().join("rain_data.duckdb")
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rain_db_lives_under_data_dir() {
        let path = rain_db_path();
        assert!(path.starts_with(data_dir()));
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("rain_data.duckdb"));
    }
}
