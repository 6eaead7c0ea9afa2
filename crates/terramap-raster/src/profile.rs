//! Raster metadata used as a write template.

use crate::{Crs, GeoTransform, Mosaic, RasterTile};

/// Driver name for GeoTIFF output.
pub const DEFAULT_DRIVER: &str = "GTiff";

/// Metadata describing how a raster is laid out on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterProfile {
    /// Output format driver. Only `GTiff` can be written.
    pub driver: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Number of bands.
    pub count: u16,
    /// Sample type name, e.g. `float32`.
    pub dtype: String,
    /// Pixel to world transform.
    pub transform: GeoTransform,
    /// Coordinate reference system.
    pub crs: Crs,
    /// No-data value.
    pub nodata: Option<f32>,
}

impl RasterProfile {
    /// Copy a tile's metadata.
    pub fn from_tile(tile: &RasterTile) -> Self {
        let (width, height) = tile.dimensions();
        Self {
            driver: DEFAULT_DRIVER.to_string(),
            width,
            height,
            count: 1,
            dtype: "float32".to_string(),
            transform: tile.transform(),
            crs: tile.crs(),
            nodata: tile.nodata(),
        }
    }

    /// This profile with driver, dimensions, transform and CRS replaced by
    /// the mosaic's. Band count, dtype and nodata carry over from the template.
    pub fn updated_for(&self, mosaic: &Mosaic) -> Self {
        let (width, height) = mosaic.dimensions();
        Self {
            driver: DEFAULT_DRIVER.to_string(),
            width,
            height,
            transform: mosaic.transform(),
            crs: mosaic.crs(),
            ..self.clone()
        }
    }
}
