//! GeoTIFF tag numbers and GeoKey directory encoding.

use crate::Crs;
use tiff::tags::Tag;

// The decoder maps these codes to named variants; `Tag::Unknown(code)` never
// matches on lookup.

/// ModelPixelScaleTag (33550).
pub(crate) const TAG_MODEL_PIXEL_SCALE: Tag = Tag::ModelPixelScaleTag;
/// ModelTiepointTag (33922).
pub(crate) const TAG_MODEL_TIEPOINT: Tag = Tag::ModelTiepointTag;
/// ModelTransformationTag (34264).
pub(crate) const TAG_MODEL_TRANSFORMATION: Tag = Tag::ModelTransformationTag;
/// GeoKeyDirectoryTag (34735).
pub(crate) const TAG_GEO_KEY_DIRECTORY: Tag = Tag::GeoKeyDirectoryTag;
/// GDAL_NODATA (42113), stored as an ASCII string.
pub(crate) const TAG_GDAL_NODATA: Tag = Tag::GdalNodata;

const KEY_MODEL_TYPE: u16 = 1024;
const KEY_RASTER_TYPE: u16 = 1025;
const KEY_GEOGRAPHIC_TYPE: u16 = 2048;
const KEY_PROJECTED_CS_TYPE: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const USER_DEFINED: u16 = 32767;

/// Extract the CRS from a GeoKeyDirectory.
///
/// Only keys stored inline (TIFFTagLocation = 0) are considered. A projected
/// CS code wins over a geographic one, and each keeps the kind of key it was
/// stored under.
pub(crate) fn crs_from_directory(directory: &[u16]) -> Crs {
    if directory.len() < 4 {
        return Crs::Unknown;
    }
    let key_count = directory[3] as usize;

    let mut geographic = None;
    let mut projected = None;
    for entry in directory[4..].chunks_exact(4).take(key_count) {
        let (key, location, value) = (entry[0], entry[1], entry[3]);
        if location != 0 || value == 0 || value == USER_DEFINED {
            continue;
        }
        match key {
            KEY_GEOGRAPHIC_TYPE => geographic = Some(value),
            KEY_PROJECTED_CS_TYPE => projected = Some(value),
            _ => {}
        }
    }

    projected
        .map(Crs::Projected)
        .or(geographic.map(Crs::Geographic))
        .unwrap_or(Crs::Unknown)
}

/// Encode a GeoKeyDirectory describing `crs`.
pub(crate) fn directory_for_crs(crs: Crs) -> Vec<u16> {
    let mut keys: Vec<[u16; 4]> = Vec::with_capacity(3);
    match crs {
        Crs::Geographic(code) => {
            keys.push([KEY_MODEL_TYPE, 0, 1, MODEL_TYPE_GEOGRAPHIC]);
            keys.push([KEY_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA]);
            keys.push([KEY_GEOGRAPHIC_TYPE, 0, 1, code]);
        }
        Crs::Projected(code) => {
            keys.push([KEY_MODEL_TYPE, 0, 1, MODEL_TYPE_PROJECTED]);
            keys.push([KEY_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA]);
            keys.push([KEY_PROJECTED_CS_TYPE, 0, 1, code]);
        }
        Crs::Unknown => keys.push([KEY_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA]),
    }

    let mut directory = vec![1, 1, 0, keys.len() as u16];
    for key in keys {
        directory.extend_from_slice(&key);
    }
    directory
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_roundtrip() {
        for crs in [
            Crs::Geographic(4326),
            Crs::Projected(32633),
            Crs::Projected(4647),
            Crs::Unknown,
        ] {
            assert_eq!(crs_from_directory(&directory_for_crs(crs)), crs);
        }
    }

    #[test]
    fn test_projected_wins_over_geographic() {
        let directory = [
            1, 1, 0, 3, //
            1024, 0, 1, 1, //
            2048, 0, 1, 4258, //
            3072, 0, 1, 3035,
        ];
        assert_eq!(crs_from_directory(&directory), Crs::Projected(3035));
    }

    #[test]
    fn test_user_defined_and_truncated() {
        assert_eq!(crs_from_directory(&[1, 1, 0, 1, 2048, 0, 1, 32767]), Crs::Unknown);
        assert_eq!(crs_from_directory(&[1, 1]), Crs::Unknown);
        // Key count larger than the entries present
        assert_eq!(crs_from_directory(&[1, 1, 0, 5, 2048, 0, 1, 4326]), Crs::Geographic(4326));
    }

    #[test]
    fn test_projected_code_in_geographic_range() {
        assert_eq!(
            directory_for_crs(Crs::Projected(4647)),
            vec![1, 1, 0, 3, 1024, 0, 1, 1, 1025, 0, 1, 1, 3072, 0, 1, 4647]
        );
    }
}
