//! Error types for the terramap runner.

use std::path::PathBuf;
use terramap_choropleth::ChoroplethError;
use terramap_raster::RasterError;
use thiserror::Error;

/// Errors that can occur while running a pipeline.
#[derive(Debug, Error)]
pub enum CliError {
    /// Raster discovery, merge or write failed.
    #[error(transparent)]
    Raster(#[from] RasterError),

    /// Table, geometry or map output failed.
    #[error(transparent)]
    Choropleth(#[from] ChoroplethError),

    /// Config file could not be parsed.
    #[error("Invalid config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Config could not be serialized.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A config value is unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, CliError>;
