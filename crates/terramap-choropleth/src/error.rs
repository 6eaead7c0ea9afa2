//! Error types for the choropleth crate.

use thiserror::Error;

/// Errors that can occur while loading, joining or rendering region data.
#[derive(Debug, Error)]
pub enum ChoroplethError {
    /// I/O error reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed delimited text.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed GeoJSON.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error when fetching features.
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// The feature service answered with a non-success status.
    #[error("Feature request to {url} failed: HTTP {status}")]
    HttpStatus {
        /// Request URL including query.
        url: String,
        /// Status code returned.
        status: u16,
    },

    /// The feature service URL could not be parsed.
    #[error("Invalid feature service URL '{url}': {reason}")]
    InvalidUrl {
        /// URL as configured.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// A required column is missing from the attribute table.
    #[error("Column '{0}' not found in attribute table")]
    MissingColumn(String),

    /// Two table rows share a join key.
    #[error("Duplicate join key '{0}' in attribute table")]
    DuplicateKey(String),

    /// A key is too short to strip the configured prefix from.
    #[error("Key '{key}' is too short to strip a {prefix_len}-character prefix")]
    KeyTooShort {
        /// Offending key.
        key: String,
        /// Prefix length being stripped.
        prefix_len: usize,
    },

    /// The GeoJSON document was not a FeatureCollection.
    #[error("Expected a GeoJSON FeatureCollection")]
    NotFeatureCollection,

    /// A feature has no geometry.
    #[error("Feature {index} has no geometry")]
    MissingGeometry {
        /// Feature position in the collection.
        index: usize,
    },

    /// A feature's geometry is not a polygon or multipolygon.
    #[error("Feature {index} has unsupported geometry type {kind}")]
    UnsupportedGeometry {
        /// Feature position in the collection.
        index: usize,
        /// GeoJSON geometry type name.
        kind: String,
    },

    /// A feature lacks the identifier property used as join key.
    #[error("Feature {index} has no usable '{property}' property")]
    MissingIdProperty {
        /// Feature position in the collection.
        index: usize,
        /// Property name looked up.
        property: String,
    },

    /// Some geometries had no matching attribute row under a strict join.
    #[error("{} geometries have no matching attribute row: {}", .keys.len(), .keys.join(", "))]
    UnmatchedKeys {
        /// Geometry keys without a match.
        keys: Vec<String>,
    },

    /// No numeric values to classify.
    #[error("No numeric values to classify")]
    EmptyClassification,

    /// Class count must be at least one.
    #[error("Invalid class count {0}")]
    InvalidClassCount(usize),

    /// A colour string could not be parsed.
    #[error("Invalid colour '{0}' (expected #rrggbb)")]
    InvalidColor(String),

    /// Unknown palette name.
    #[error("Unknown palette '{0}'")]
    UnknownPalette(String),
}
