//! # terramap-raster
//!
//! Elevation tile discovery, mosaicking and GeoTIFF writing.
//!
//! This crate covers the raster half of terramap:
//! - Find GeoTIFF tiles in a directory by filename pattern
//! - Decode each tile together with its georeferencing (affine transform,
//!   EPSG code, nodata value)
//! - Merge the tiles into a single grid covering the union of their extents
//! - Write the merged grid back out as a single-band Float32 GeoTIFF
//!
//! ## Example
//!
//! ```no_run
//! use terramap_raster::{discover_tiles, merge_files, write_raster};
//!
//! let paths = discover_tiles("data/dem", "*.tif")?;
//! let (mosaic, template) = merge_files(&paths)?;
//!
//! let profile = template.updated_for(&mosaic);
//! write_raster("output/mosaic.tif", &profile, mosaic.data())?;
//! # Ok::<(), terramap_raster::RasterError>(())
//! ```

mod discover;
mod error;
mod geokeys;
mod mosaic;
mod profile;
mod tile;
mod transform;
mod writer;

pub use discover::discover_tiles;
pub use error::RasterError;
pub use mosaic::{merge, merge_files, Mosaic};
pub use profile::{RasterProfile, DEFAULT_DRIVER};
pub use tile::RasterTile;
pub use transform::{Bounds, Crs, GeoTransform};
pub use writer::write_raster;

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;
