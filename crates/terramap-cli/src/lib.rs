//! # terramap-cli
//!
//! Configuration and pipeline orchestration for the `terramap` binary.
//!
//! - [`run_mosaic`]: discover GeoTIFF tiles, merge them and write one mosaic
//! - [`run_choropleth`]: join a CSV onto region polygons and write SVG and
//!   HTML choropleth maps
//!
//! Both take their settings from [`Config`], loaded from YAML.

pub mod config;
mod error;
pub mod pipeline;

pub use config::{ChoroplethConfig, Config, MapConfig, MosaicConfig, WfsConfig};
pub use error::{CliError, Result};
pub use pipeline::{run_choropleth, run_mosaic, ChoroplethSummary, MosaicSummary};
