//! # terramap-choropleth
//!
//! Join tabular region statistics to region polygons and render them as
//! choropleth maps.
//!
//! ## Overview
//!
//! The pipeline has four stages:
//! - Load an attribute table from delimited text ([`AttributeTable`]) and
//!   normalize its join keys (e.g. `SK001` → `001`)
//! - Load region polygons from a WFS endpoint ([`WfsClient`]) or a local
//!   GeoJSON file ([`load_geometries_from_file`])
//! - Inner-join the two on the key ([`join`]), reporting any unmatched keys
//! - Classify a numeric column into quantile classes ([`QuantileScale`]) and
//!   render a static SVG ([`render_svg`]) and an interactive HTML map
//!   ([`WebMap`])
//!
//! ## Example
//!
//! ```no_run
//! use terramap_choropleth::{
//!     join, load_geometries_from_file, AttributeTable, JoinPolicy, Palette, QuantileScale,
//! };
//!
//! let mut table = AttributeTable::from_path("data/employment.csv", "code", b',')?;
//! table.strip_key_prefix(2)?;
//!
//! let geometries = load_geometries_from_file("data/districts.geojson", "id")?;
//! let outcome = join(&table, geometries, JoinPolicy::Warn)?;
//!
//! let values = outcome.numeric_values("employment_rate");
//! let scale = QuantileScale::new(&values, 5, &Palette::YlGn)?;
//! println!("{} regions in {} classes", outcome.regions.len(), scale.class_count());
//! # Ok::<(), terramap_choropleth::ChoroplethError>(())
//! ```

mod classify;
mod error;
mod geometry;
mod join;
mod render;
mod table;
mod web_map;
mod wfs;

pub use classify::{fill_color, Palette, QuantileScale, Rgb, DEFAULT_MISSING_COLOR};
pub use error::ChoroplethError;
pub use geometry::{load_geometries_from_file, parse_feature_collection, RegionGeometry};
pub use join::{join, JoinOutcome, JoinPolicy, JoinReport, JoinedRegion};
pub use render::{render_svg, save_svg, SvgOptions};
pub use table::{AttributeTable, RegionRecord};
pub use web_map::{
    ChoroplethLayer, Layer, Legend, TileProvider, TooltipLayer, WebMap, WebMapBuilder,
};
pub use wfs::{WfsClient, WfsRequest, DEFAULT_TIMEOUT};

/// Result type for choropleth operations.
pub type Result<T> = std::result::Result<T, ChoroplethError>;
