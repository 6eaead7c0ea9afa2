//! GeoTIFF output.

use crate::geokeys::{
    directory_for_crs, TAG_GDAL_NODATA, TAG_GEO_KEY_DIRECTORY, TAG_MODEL_PIXEL_SCALE,
    TAG_MODEL_TIEPOINT, TAG_MODEL_TRANSFORMATION,
};
use crate::{RasterError, RasterProfile, Result, DEFAULT_DRIVER};
use std::fs;
use std::io::BufWriter;
use std::path::Path;
use tiff::encoder::{colortype, TiffEncoder};
use tracing::info;

/// Write a single-band Float32 GeoTIFF described by `profile`.
///
/// Creates parent directories as needed and overwrites any existing file.
/// A failed write may leave a partial file behind.
pub fn write_raster<P: AsRef<Path>>(path: P, profile: &RasterProfile, data: &[f32]) -> Result<()> {
    let path = path.as_ref();

    if !profile.driver.eq_ignore_ascii_case(DEFAULT_DRIVER) {
        return Err(RasterError::UnsupportedDriver(profile.driver.clone()));
    }
    if profile.count != 1 {
        return Err(RasterError::UnsupportedBandCount {
            path: path.to_path_buf(),
            count: profile.count,
        });
    }
    if data.len() != profile.width as usize * profile.height as usize {
        return Err(RasterError::DimensionMismatch {
            width: profile.width,
            height: profile.height,
            actual: data.len(),
        });
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = fs::File::create(path)?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file))?;
    let mut image =
        encoder.new_image::<colortype::Gray32Float>(profile.width, profile.height)?;

    let t = profile.transform;
    if t.is_north_up() {
        let (res_x, res_y) = t.resolution();
        let scale = [res_x, res_y, 0.0];
        let tiepoint = [0.0, 0.0, 0.0, t.origin_x, t.origin_y, 0.0];
        image
            .encoder()
            .write_tag(TAG_MODEL_PIXEL_SCALE, &scale[..])?;
        image
            .encoder()
            .write_tag(TAG_MODEL_TIEPOINT, &tiepoint[..])?;
    } else {
        let matrix = [
            t.pixel_width, t.row_rotation, 0.0, t.origin_x,
            t.col_rotation, t.pixel_height, 0.0, t.origin_y,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        image
            .encoder()
            .write_tag(TAG_MODEL_TRANSFORMATION, &matrix[..])?;
    }

    let directory = directory_for_crs(profile.crs);
    image
        .encoder()
        .write_tag(TAG_GEO_KEY_DIRECTORY, &directory[..])?;

    if let Some(nodata) = profile.nodata {
        let text = nodata_string(nodata);
        image
            .encoder()
            .write_tag(TAG_GDAL_NODATA, text.as_str())?;
    }

    image.write_data(data)?;

    info!(
        "Wrote {}x{} raster to {}",
        profile.width,
        profile.height,
        path.display()
    );
    Ok(())
}

/// GDAL_NODATA text for a value.
fn nodata_string(nodata: f32) -> String {
    if nodata.is_nan() {
        "nan".to_string()
    } else {
        nodata.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Crs, GeoTransform};

    fn profile() -> RasterProfile {
        RasterProfile {
            driver: "GTiff".to_string(),
            width: 2,
            height: 2,
            count: 1,
            dtype: "float32".to_string(),
            transform: GeoTransform::from_origin(0.0, 2.0, 1.0, 1.0),
            crs: Crs::Geographic(4326),
            nodata: Some(-9999.0),
        }
    }

    #[test]
    fn test_rejects_other_drivers() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = profile();
        p.driver = "PNG".to_string();
        let err = write_raster(dir.path().join("x.png"), &p, &[0.0; 4]).unwrap_err();
        assert!(matches!(err, RasterError::UnsupportedDriver(d) if d == "PNG"));
    }

    #[test]
    fn test_rejects_wrong_buffer_length() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_raster(dir.path().join("x.tif"), &profile(), &[0.0; 3]).unwrap_err();
        assert!(matches!(err, RasterError::DimensionMismatch { actual: 3, .. }));
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/mosaic.tif");
        write_raster(&path, &profile(), &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_nodata_string() {
        assert_eq!(nodata_string(-9999.0), "-9999");
        assert_eq!(nodata_string(f32::NAN), "nan");
        assert!(nodata_string(f32::NAN).parse::<f32>().unwrap().is_nan());
    }
}
