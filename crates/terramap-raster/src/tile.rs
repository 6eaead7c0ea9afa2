//! Single raster tile representation.

use crate::geokeys::{
    crs_from_directory, TAG_GDAL_NODATA, TAG_GEO_KEY_DIRECTORY, TAG_MODEL_PIXEL_SCALE,
    TAG_MODEL_TIEPOINT, TAG_MODEL_TRANSFORMATION,
};
use crate::{Bounds, Crs, GeoTransform, RasterError, Result};
use std::path::{Path, PathBuf};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::debug;

/// A single-band georeferenced raster loaded from a GeoTIFF file.
///
/// The file handle only lives for the duration of [`RasterTile::open`]; once
/// the pixels are decoded the tile is a plain in-memory grid.
#[derive(Debug, Clone)]
pub struct RasterTile {
    /// Source file (empty for tiles built in memory).
    path: PathBuf,
    /// Pixel values in row-major order (north to south, west to east).
    data: Vec<f32>,
    /// Width of the tile in pixels.
    width: u32,
    /// Height of the tile in pixels.
    height: u32,
    /// Pixel to world mapping.
    transform: GeoTransform,
    /// Coordinate reference system.
    crs: Crs,
    /// No-data value (pixels equal to this are treated as missing).
    nodata: Option<f32>,
}

impl RasterTile {
    /// Build a tile from an in-memory grid.
    pub fn new(
        data: Vec<f32>,
        width: u32,
        height: u32,
        transform: GeoTransform,
        crs: Crs,
        nodata: Option<f32>,
    ) -> Result<Self> {
        if data.len() != width as usize * height as usize {
            return Err(RasterError::DimensionMismatch {
                width,
                height,
                actual: data.len(),
            });
        }
        Ok(Self {
            path: PathBuf::new(),
            data,
            width,
            height,
            transform,
            crs,
            nodata,
        })
    }

    /// Load a tile from a GeoTIFF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let mut decoder = Decoder::new(file)?;

        // Elevation tiles can be large: 10812 x 10812 f32 pixels is ~466 MB
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 1024 * 1024 * 1024; // 1 GB
        limits.intermediate_buffer_size = 1024 * 1024 * 1024; // 1 GB
        limits.ifd_value_size = 1024 * 1024 * 1024;
        decoder = decoder.with_limits(limits);

        let samples = decoder.get_tag_u32(Tag::SamplesPerPixel).unwrap_or(1);
        if samples != 1 {
            return Err(RasterError::UnsupportedBandCount {
                path: path.to_path_buf(),
                count: samples as u16,
            });
        }

        let (width, height) = decoder.dimensions()?;
        let transform = Self::read_transform(&mut decoder, path)?;
        let crs = decoder
            .get_tag_u16_vec(TAG_GEO_KEY_DIRECTORY)
            .map(|dir| crs_from_directory(&dir))
            .unwrap_or(Crs::Unknown);
        let nodata = Self::read_nodata_value(&mut decoder);
        let data = Self::decode_pixels(&mut decoder)?;

        debug!(
            path = %path.display(),
            width,
            height,
            %crs,
            ?nodata,
            "opened raster tile"
        );

        Ok(Self {
            path: path.to_path_buf(),
            data,
            width,
            height,
            transform,
            crs,
            nodata,
        })
    }

    /// Read the affine transform from GeoTIFF tags.
    fn read_transform<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
        path: &Path,
    ) -> Result<GeoTransform> {
        let tiepoint = decoder.get_tag_f64_vec(TAG_MODEL_TIEPOINT);
        let pixel_scale = decoder.get_tag_f64_vec(TAG_MODEL_PIXEL_SCALE);

        if let (Ok(tiepoint), Ok(scale)) = (tiepoint, pixel_scale) {
            if let Some(transform) = GeoTransform::from_tiepoint_and_scale(&tiepoint, &scale) {
                return Ok(transform);
            }
        }

        // Fallback: full 4x4 model transformation matrix
        if let Ok(matrix) = decoder.get_tag_f64_vec(TAG_MODEL_TRANSFORMATION) {
            if let Some(transform) = GeoTransform::from_model_transformation(&matrix) {
                return Ok(transform);
            }
        }

        Err(RasterError::InvalidGeoTiff {
            path: path.to_path_buf(),
            reason: "no ModelTiepoint/ModelPixelScale or ModelTransformation tags".to_string(),
        })
    }

    /// Decode pixel data from the TIFF decoder, converting to f32.
    fn decode_pixels<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
    ) -> Result<Vec<f32>> {
        let result = decoder.read_image()?;

        match result {
            DecodingResult::F32(data) => Ok(data),
            DecodingResult::F64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I16(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I32(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U16(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U32(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U8(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I8(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        }
    }

    /// Read the no-data value from the GDAL_NODATA tag, if present.
    fn read_nodata_value<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
    ) -> Option<f32> {
        decoder
            .get_tag_ascii_string(TAG_GDAL_NODATA)
            .ok()
            .and_then(|s| s.trim().trim_end_matches('\0').parse().ok())
    }

    /// Check whether a value is this tile's no-data marker.
    pub fn is_nodata(&self, value: f32) -> bool {
        match self.nodata {
            Some(nodata) if nodata.is_nan() => value.is_nan(),
            Some(nodata) => value == nodata,
            None => value.is_nan(),
        }
    }

    /// Get the value at a pixel, or `None` when out of range or no-data.
    pub fn value_at(&self, col: u32, row: u32) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let value = self.data[row as usize * self.width as usize + col as usize];
        (!self.is_nodata(value)).then_some(value)
    }

    /// Get the value of the pixel containing a world coordinate.
    pub fn sample(&self, x: f64, y: f64) -> Option<f32> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        if !self.bounds().contains(x, y) || !self.transform.is_north_up() {
            return None;
        }
        let col = ((x - self.transform.origin_x) / self.transform.pixel_width).floor();
        let row = ((y - self.transform.origin_y) / self.transform.pixel_height).floor();
        // The east and south edges belong to the last column/row
        let col = (col as u32).min(self.width - 1);
        let row = (row as u32).min(self.height - 1);
        self.value_at(col, row)
    }

    /// Source file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw pixel values in row-major order.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Get the dimensions of this tile in pixels.
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

    /// No-data value, if any.
    pub fn nodata(&self) -> Option<f32> {
        self.nodata
    }

    /// Get the world extent of this tile.
    pub fn bounds(&self) -> Bounds {
        self.transform.bounds(self.width, self.height)
    }

    /// Get the resolution in world units per pixel.
    pub fn resolution(&self) -> (f64, f64) {
        self.transform.resolution()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tile(nodata: Option<f32>) -> RasterTile {
        RasterTile::new(
            vec![1.0, 2.0, -9999.0, 4.0],
            2,
            2,
            GeoTransform::from_origin(10.0, 50.0, 0.5, 0.5),
            Crs::Geographic(4326),
            nodata,
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        let result = RasterTile::new(
            vec![0.0; 3],
            2,
            2,
            GeoTransform::from_origin(0.0, 0.0, 1.0, 1.0),
            Crs::Unknown,
            None,
        );
        assert!(matches!(result, Err(RasterError::DimensionMismatch { actual: 3, .. })));
    }

    #[test]
    fn test_value_at_respects_nodata() {
        let tile = small_tile(Some(-9999.0));
        assert_eq!(tile.value_at(0, 0), Some(1.0));
        assert_eq!(tile.value_at(0, 1), None);
        assert_eq!(tile.value_at(5, 0), None);

        let tile = small_tile(None);
        assert_eq!(tile.value_at(0, 1), Some(-9999.0));
    }

    #[test]
    fn test_sample_world_coordinates() {
        let tile = small_tile(Some(-9999.0));
        assert_eq!(tile.bounds(), Bounds { west: 10.0, south: 49.0, east: 11.0, north: 50.0 });

        assert_eq!(tile.sample(10.1, 49.9), Some(1.0));
        assert_eq!(tile.sample(10.9, 49.9), Some(2.0));
        assert_eq!(tile.sample(10.9, 49.1), Some(4.0));
        // South-east corner belongs to the last pixel
        assert_eq!(tile.sample(11.0, 49.0), Some(4.0));
        assert_eq!(tile.sample(12.0, 49.5), None);
    }

    #[test]
    fn test_nan_nodata() {
        let tile = RasterTile::new(
            vec![f32::NAN, 3.0],
            2,
            1,
            GeoTransform::from_origin(0.0, 1.0, 1.0, 1.0),
            Crs::Unknown,
            Some(f32::NAN),
        )
        .unwrap();
        assert_eq!(tile.value_at(0, 0), None);
        assert_eq!(tile.value_at(1, 0), Some(3.0));
    }

    #[test]
    fn test_sample_empty_tile() {
        let tile = RasterTile::new(
            Vec::new(),
            0,
            0,
            GeoTransform::from_origin(10.0, 50.0, 0.5, 0.5),
            Crs::Unknown,
            None,
        )
        .unwrap();
        assert_eq!(tile.sample(10.0, 50.0), None);
    }

    #[test]
    fn test_open_reads_georeferencing_tags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.tif");
        let tile = small_tile(Some(-9999.0));
        crate::write_raster(&path, &crate::RasterProfile::from_tile(&tile), tile.data()).unwrap();

        let reopened = RasterTile::open(&path).unwrap();
        assert_eq!(reopened.dimensions(), (2, 2));
        assert_eq!(reopened.transform(), tile.transform());
        assert_eq!(reopened.crs(), Crs::Geographic(4326));
        assert_eq!(reopened.nodata(), Some(-9999.0));
        assert_eq!(reopened.data(), tile.data());
        assert_eq!(reopened.value_at(0, 1), None);
    }
}
