//! Merging tiles into a single mosaic grid.

use crate::transform::EPSILON;
use crate::{Bounds, Crs, GeoTransform, RasterError, RasterProfile, RasterTile, Result};
use std::path::Path;
use tracing::{debug, info};

/// A merged grid covering the union of its input tiles.
#[derive(Debug, Clone)]
pub struct Mosaic {
    /// Pixel values in row-major order.
    data: Vec<f32>,
    /// Width in pixels.
    width: u32,
    /// Height in pixels.
    height: u32,
    /// Pixel to world mapping.
    transform: GeoTransform,
    /// Shared CRS of the inputs.
    crs: Crs,
    /// No-data value used for uncovered pixels, if the inputs declared one.
    nodata: Option<f32>,
}

impl Mosaic {
    /// Merged pixel values in row-major order.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Consume the mosaic, returning its pixel buffer.
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Dimensions in pixels (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pixel to world transform.
    pub fn transform(&self) -> GeoTransform {
        self.transform
    }

    /// Coordinate reference system.
    pub fn crs(&self) -> Crs {
        self.crs
    }

    /// No-data value.
    pub fn nodata(&self) -> Option<f32> {
        self.nodata
    }

    /// World extent of the mosaic.
    pub fn bounds(&self) -> Bounds {
        self.transform.bounds(self.width, self.height)
    }

    /// Pixel size (x, y).
    pub fn resolution(&self) -> (f64, f64) {
        self.transform.resolution()
    }
}

/// Number of whole pixels needed to span `extent` at `res`.
///
/// Aligned grids land within floating-point noise of an integer; anything
/// else is rounded up so the extent is fully covered.
fn pixel_span(extent: f64, res: f64) -> u32 {
    let span = extent / res;
    if (span - span.round()).abs() < 1e-6 {
        span.round() as u32
    } else {
        span.ceil() as u32
    }
}

fn same_resolution(a: (f64, f64), b: (f64, f64)) -> bool {
    let close = |x: f64, y: f64| (x - y).abs() <= EPSILON.max(x.abs() * 1e-9);
    close(a.0, b.0) && close(a.1, b.1)
}

/// Merge tiles into a single grid.
///
/// The output extent is the union of the input extents at the first tile's
/// resolution. Uncovered pixels hold the first tile's nodata value (0 when
/// it has none). Where tiles overlap, the first valid value in input order
/// wins.
///
/// All tiles must be north-up and share a CRS and pixel size.
pub fn merge(tiles: &[RasterTile]) -> Result<Mosaic> {
    let first = tiles.first().ok_or(RasterError::EmptyMerge)?;
    let res = first.resolution();

    for tile in tiles {
        if !tile.transform().is_north_up() {
            return Err(RasterError::UnsupportedTransform(tile.path().to_path_buf()));
        }
        if tile.crs() != first.crs() {
            return Err(RasterError::CrsMismatch {
                path: tile.path().to_path_buf(),
                expected: first.crs().to_string(),
                found: tile.crs().to_string(),
            });
        }
        if !same_resolution(tile.resolution(), res) {
            return Err(RasterError::ResolutionMismatch {
                path: tile.path().to_path_buf(),
                expected: res,
                found: tile.resolution(),
            });
        }
    }

    let bounds = tiles
        .iter()
        .skip(1)
        .fold(first.bounds(), |acc, tile| acc.union(&tile.bounds()));

    let width = pixel_span(bounds.width(), res.0);
    let height = pixel_span(bounds.height(), res.1);
    let transform = GeoTransform::from_origin(bounds.west, bounds.north, res.0, res.1);

    let nodata = first.nodata();
    let fill = nodata.unwrap_or(0.0);
    let mut data = vec![fill; width as usize * height as usize];
    let mut filled = vec![false; data.len()];

    debug!(
        "Merging {} tiles into {}x{} grid at {:?}",
        tiles.len(),
        width,
        height,
        res
    );

    for tile in tiles {
        let tile_bounds = tile.bounds();
        let col_off = ((tile_bounds.west - bounds.west) / res.0).round() as i64;
        let row_off = ((bounds.north - tile_bounds.north) / res.1).round() as i64;
        let (tile_width, tile_height) = tile.dimensions();

        for row in 0..tile_height {
            let dst_row = row_off + row as i64;
            if dst_row < 0 || dst_row >= height as i64 {
                continue;
            }
            for col in 0..tile_width {
                let dst_col = col_off + col as i64;
                if dst_col < 0 || dst_col >= width as i64 {
                    continue;
                }
                let idx = dst_row as usize * width as usize + dst_col as usize;
                if filled[idx] {
                    continue;
                }
                if let Some(value) = tile.value_at(col, row) {
                    data[idx] = value;
                    filled[idx] = true;
                }
            }
        }
    }

    Ok(Mosaic {
        data,
        width,
        height,
        transform,
        crs: first.crs(),
        nodata,
    })
}

/// Open every path, merge the tiles, and return the mosaic together with
/// the first tile's profile for use as a write template.
///
/// Each file is closed as soon as its pixels have been decoded.
pub fn merge_files<P: AsRef<Path>>(paths: &[P]) -> Result<(Mosaic, RasterProfile)> {
    let mut tiles = Vec::with_capacity(paths.len());
    for path in paths {
        tiles.push(RasterTile::open(path)?);
    }

    let template = tiles
        .first()
        .map(RasterProfile::from_tile)
        .ok_or(RasterError::EmptyMerge)?;
    let mosaic = merge(&tiles)?;

    let (width, height) = mosaic.dimensions();
    info!(
        "Merged {} tiles into {}x{} mosaic ({})",
        tiles.len(),
        width,
        height,
        mosaic.crs()
    );

    Ok((mosaic, template))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(west: f64, north: f64, width: u32, height: u32, value: f32) -> RasterTile {
        RasterTile::new(
            vec![value; (width * height) as usize],
            width,
            height,
            GeoTransform::from_origin(west, north, 1.0, 1.0),
            Crs::Geographic(4326),
            Some(-9999.0),
        )
        .unwrap()
    }

    #[test]
    fn test_merge_side_by_side() {
        let mosaic = merge(&[tile(0.0, 2.0, 2, 2, 1.0), tile(2.0, 2.0, 2, 2, 2.0)]).unwrap();

        assert_eq!(mosaic.dimensions(), (4, 2));
        assert_eq!(mosaic.data(), &[1.0, 1.0, 2.0, 2.0, 1.0, 1.0, 2.0, 2.0]);
        assert_eq!(mosaic.nodata(), Some(-9999.0));
    }

    #[test]
    fn test_gap_filled_with_nodata() {
        // Diagonal tiles leave two uncovered quadrants
        let mosaic = merge(&[tile(0.0, 2.0, 1, 1, 1.0), tile(1.0, 1.0, 1, 1, 2.0)]).unwrap();

        assert_eq!(mosaic.dimensions(), (2, 2));
        assert_eq!(mosaic.data(), &[1.0, -9999.0, -9999.0, 2.0]);
    }

    #[test]
    fn test_first_valid_value_wins() {
        // Left pixel of the first tile is nodata, so the second tile shows through
        let a = RasterTile::new(
            vec![-9999.0, 1.0],
            2,
            1,
            GeoTransform::from_origin(0.0, 1.0, 1.0, 1.0),
            Crs::Geographic(4326),
            Some(-9999.0),
        )
        .unwrap();
        let b = tile(0.0, 1.0, 2, 1, 5.0);

        let mosaic = merge(&[a, b]).unwrap();
        assert_eq!(mosaic.data(), &[5.0, 1.0]);
    }

    #[test]
    fn test_crs_mismatch() {
        let a = tile(0.0, 1.0, 1, 1, 1.0);
        let b = RasterTile::new(
            vec![1.0],
            1,
            1,
            GeoTransform::from_origin(1.0, 1.0, 1.0, 1.0),
            Crs::Projected(3857),
            None,
        )
        .unwrap();
        assert!(matches!(merge(&[a, b]), Err(RasterError::CrsMismatch { .. })));
    }

    #[test]
    fn test_resolution_mismatch() {
        let a = tile(0.0, 1.0, 1, 1, 1.0);
        let b = RasterTile::new(
            vec![1.0; 4],
            2,
            2,
            GeoTransform::from_origin(1.0, 1.0, 0.5, 0.5),
            Crs::Geographic(4326),
            None,
        )
        .unwrap();
        assert!(matches!(merge(&[a, b]), Err(RasterError::ResolutionMismatch { .. })));
    }

    #[test]
    fn test_empty_merge() {
        assert!(matches!(merge(&[]), Err(RasterError::EmptyMerge)));
    }

    #[test]
    fn test_pixel_span() {
        assert_eq!(pixel_span(3.0, 1.0), 3);
        assert_eq!(pixel_span(0.3, 0.1), 3);
        assert_eq!(pixel_span(3.5, 1.0), 4);
    }
}
