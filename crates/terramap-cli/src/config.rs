//! YAML configuration.
//!
//! Every field has a default, so a partial (or empty) file is valid:
//!
//! ```yaml
//! mosaic:
//!   input_dir: srtm
//! choropleth:
//!   wfs:
//!     url: https://example.org/geoserver/wfs
//!     type_name: admin:districts
//! ```

use crate::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use terramap_choropleth::{JoinPolicy, Palette, Rgb, TileProvider, WfsRequest};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Raster mosaic settings.
    pub mosaic: MosaicConfig,
    /// Choropleth map settings.
    pub choropleth: ChoroplethConfig,
}

impl Config {
    /// Parse YAML text. Blank input yields the defaults.
    pub fn from_yaml(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Load a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text).map_err(|source| CliError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Inputs and output of the `mosaic` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    /// Directory searched for tiles.
    pub input_dir: PathBuf,
    /// Glob pattern relative to `input_dir`.
    pub pattern: String,
    /// Mosaic GeoTIFF path.
    pub output: PathBuf,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/dem"),
            pattern: "*.tif".to_string(),
            output: PathBuf::from("output/mosaic.tif"),
        }
    }
}

/// WFS endpoint used to fetch region polygons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WfsConfig {
    pub url: Option<String>,
    pub type_name: Option<String>,
    pub request: String,
    pub version: Option<String>,
    pub output_format: String,
    pub timeout_secs: u64,
}

impl Default for WfsConfig {
    fn default() -> Self {
        Self {
            url: None,
            type_name: None,
            request: "GetFeature".to_string(),
            version: Some("2.0.0".to_string()),
            output_format: "application/json".to_string(),
            timeout_secs: 30,
        }
    }
}

impl WfsConfig {
    /// The configured request, or `None` when no endpoint is set.
    pub fn request(&self) -> Result<Option<WfsRequest>> {
        let (url, type_name) = match (&self.url, &self.type_name) {
            (None, _) => return Ok(None),
            (Some(url), Some(type_name)) => (url, type_name),
            (Some(_), None) => {
                return Err(CliError::Config(
                    "choropleth.wfs.type_name is required when a WFS url is set".to_string(),
                ))
            }
        };
        Ok(Some(WfsRequest {
            url: url.clone(),
            type_name: type_name.clone(),
            request: self.request.clone(),
            version: self.version.clone(),
            output_format: self.output_format.clone(),
        }))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Interactive map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Initial centre as `[lat, lon]`.
    pub center: [f64; 2],
    pub zoom: u8,
    /// Base map name, e.g. `OpenStreetMap` or `CartoDB positron`.
    pub tiles: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: [48.7, 19.7],
            zoom: 7,
            tiles: "OpenStreetMap".to_string(),
        }
    }
}

impl MapConfig {
    pub fn tile_provider(&self) -> Result<TileProvider> {
        TileProvider::from_name(&self.tiles)
            .ok_or_else(|| CliError::Config(format!("unknown tile provider '{}'", self.tiles)))
    }
}

/// Inputs, classification and outputs of the `choropleth` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoroplethConfig {
    /// Attribute table.
    pub csv_path: PathBuf,
    /// Single-character field delimiter.
    pub delimiter: String,
    /// Column holding the join key.
    pub key_column: String,
    /// Numeric column to map.
    pub value_column: String,
    /// Characters stripped from the front of each key before joining.
    pub key_prefix_len: usize,
    /// Local GeoJSON used instead of the WFS when set.
    pub geometry_file: Option<PathBuf>,
    pub wfs: WfsConfig,
    /// Feature property holding the join key.
    pub id_property: String,
    /// Fields shown in the hover tooltip.
    pub tooltip_fields: Vec<String>,
    pub classes: usize,
    pub palette: String,
    /// Fill for regions without a value.
    pub missing_color: String,
    /// Fail instead of warning when a geometry has no attribute row.
    pub strict_join: bool,
    /// Legend caption and map title.
    pub legend_name: String,
    pub map: MapConfig,
    pub static_output: PathBuf,
    pub html_output: PathBuf,
}

impl Default for ChoroplethConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("data/employment.csv"),
            delimiter: ",".to_string(),
            key_column: "code".to_string(),
            value_column: "employment_rate".to_string(),
            key_prefix_len: 2,
            geometry_file: None,
            wfs: WfsConfig::default(),
            id_property: "id".to_string(),
            tooltip_fields: vec!["name".to_string()],
            classes: 5,
            palette: "YlGn".to_string(),
            missing_color: "#bdbdbd".to_string(),
            strict_join: false,
            legend_name: "Employment rate (%)".to_string(),
            map: MapConfig::default(),
            static_output: PathBuf::from("output/choropleth.svg"),
            html_output: PathBuf::from("output/choropleth.html"),
        }
    }
}

impl ChoroplethConfig {
    /// The delimiter as a single byte.
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter.as_bytes() {
            [b] => Ok(*b),
            _ => Err(CliError::Config(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            ))),
        }
    }

    pub fn palette(&self) -> Result<Palette> {
        Ok(self.palette.parse()?)
    }

    pub fn missing_color(&self) -> Result<Rgb> {
        Ok(self.missing_color.parse()?)
    }

    pub fn join_policy(&self) -> JoinPolicy {
        if self.strict_join {
            JoinPolicy::Strict
        } else {
            JoinPolicy::Warn
        }
    }
}
