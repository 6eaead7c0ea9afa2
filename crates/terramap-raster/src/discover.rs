//! Tile discovery by filename pattern.

use crate::{RasterError, Result};
use glob::glob;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Find raster files in `dir` whose names match `pattern` (e.g. `"*.tif"`).
///
/// The order of the returned paths follows the glob walk and should not be
/// relied on. A missing directory or a pattern with no matches is an error
/// rather than an empty list, so an empty mosaic is never produced silently.
pub fn discover_tiles<P: AsRef<Path>>(dir: P, pattern: &str) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let full_pattern = dir.join(pattern).to_string_lossy().into_owned();

    let entries = glob(&full_pattern).map_err(|e| RasterError::InvalidPattern {
        pattern: full_pattern.clone(),
        reason: e.to_string(),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            // Unreadable entries are skipped, not fatal
            Err(e) => warn!("Skipping unreadable path {}: {}", e.path().display(), e),
        }
    }

    if paths.is_empty() {
        return Err(RasterError::NoInputs {
            dir: dir.to_path_buf(),
            pattern: pattern.to_string(),
        });
    }

    debug!("Discovered {} raster files matching {}", paths.len(), full_pattern);
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_matches_pattern_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.tif"), b"").unwrap();
        fs::write(dir.path().join("b.tif"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("sub.tif")).unwrap();

        let mut paths = discover_tiles(dir.path(), "*.tif").unwrap();
        paths.sort();
        assert_eq!(paths, vec![dir.path().join("a.tif"), dir.path().join("b.tif")]);
    }

    #[test]
    fn test_no_matches_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_tiles(dir.path(), "*.tif").unwrap_err();
        assert!(matches!(err, RasterError::NoInputs { .. }));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let err = discover_tiles("/definitely/not/here", "*.tif").unwrap_err();
        assert!(matches!(err, RasterError::NoInputs { .. }));
    }

    #[test]
    fn test_invalid_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_tiles(dir.path(), "[*.tif").unwrap_err();
        assert!(matches!(err, RasterError::InvalidPattern { .. }));
    }
}
