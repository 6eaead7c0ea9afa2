//! Error types for the raster crate.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading, merging or writing rasters.
#[derive(Debug, Error)]
pub enum RasterError {
    /// I/O error reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF encode or decode error.
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// Invalid GeoTIFF - missing or malformed georeferencing tags.
    #[error("Invalid GeoTIFF {path}: {reason}")]
    InvalidGeoTiff {
        /// File being read.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// The glob pattern could not be parsed.
    #[error("Invalid file pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Full pattern that was rejected.
        pattern: String,
        /// Parser message.
        reason: String,
    },

    /// No raster files matched the discovery pattern.
    #[error("No raster files match '{pattern}' in {dir}")]
    NoInputs {
        /// Directory that was searched.
        dir: PathBuf,
        /// Filename pattern.
        pattern: String,
    },

    /// Input tiles use different coordinate reference systems.
    #[error("CRS mismatch: {path} uses {found}, expected {expected}")]
    CrsMismatch {
        /// Offending tile.
        path: PathBuf,
        /// CRS of the first tile.
        expected: String,
        /// CRS of the offending tile.
        found: String,
    },

    /// Input tiles use different pixel sizes.
    #[error("Resolution mismatch: {path} has {found:?}, expected {expected:?}")]
    ResolutionMismatch {
        /// Offending tile.
        path: PathBuf,
        /// Pixel size (x, y) of the first tile.
        expected: (f64, f64),
        /// Pixel size (x, y) of the offending tile.
        found: (f64, f64),
    },

    /// The transform has rotation terms, which the merge cannot handle.
    #[error("Unsupported (rotated) transform in {0}")]
    UnsupportedTransform(PathBuf),

    /// Only single-band rasters are supported.
    #[error("Unsupported band count {count} in {path}")]
    UnsupportedBandCount {
        /// File being read.
        path: PathBuf,
        /// Samples per pixel found.
        count: u16,
    },

    /// The output driver is not supported by the writer.
    #[error("Unsupported raster driver '{0}' (only GTiff can be written)")]
    UnsupportedDriver(String),

    /// Pixel buffer length does not match the profile dimensions.
    #[error("Pixel buffer has {actual} values but profile is {width}x{height}")]
    DimensionMismatch {
        /// Profile width.
        width: u32,
        /// Profile height.
        height: u32,
        /// Number of values supplied.
        actual: usize,
    },

    /// Merge was called with no tiles.
    #[error("Cannot merge an empty tile set")]
    EmptyMerge,
}
