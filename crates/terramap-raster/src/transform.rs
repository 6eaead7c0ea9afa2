//! Affine transforms, extents and coordinate reference systems.

use std::fmt;

/// Tolerance used when comparing pixel sizes and grid alignment.
pub(crate) const EPSILON: f64 = 1e-9;

/// Affine mapping from pixel (col, row) to world (x, y), in GDAL order.
///
/// ```text
/// x = origin_x + col * pixel_width  + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// For a north-up grid the rotation terms are zero and `pixel_height` is
/// negative (rows run southward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// World x of the top-left corner of the top-left pixel.
    pub origin_x: f64,
    /// Pixel size along x.
    pub pixel_width: f64,
    /// Row rotation term (zero for north-up).
    pub row_rotation: f64,
    /// World y of the top-left corner of the top-left pixel.
    pub origin_y: f64,
    /// Column rotation term (zero for north-up).
    pub col_rotation: f64,
    /// Pixel size along y (negative for north-up).
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Build a north-up transform from the top-left corner and pixel sizes.
    ///
    /// Both `res_x` and `res_y` are given as positive sizes.
    pub fn from_origin(west: f64, north: f64, res_x: f64, res_y: f64) -> Self {
        Self {
            origin_x: west,
            pixel_width: res_x,
            row_rotation: 0.0,
            origin_y: north,
            col_rotation: 0.0,
            pixel_height: -res_y,
        }
    }

    /// Build a transform from GeoTIFF ModelTiepoint and ModelPixelScale values.
    ///
    /// Tiepoint format is `[i, j, k, x, y, z]`: raster point (i, j) maps to
    /// model point (x, y). Only the first tiepoint is used.
    pub fn from_tiepoint_and_scale(tiepoint: &[f64], scale: &[f64]) -> Option<Self> {
        if tiepoint.len() < 6 || scale.len() < 2 {
            return None;
        }
        let (i, j) = (tiepoint[0], tiepoint[1]);
        let (x, y) = (tiepoint[3], tiepoint[4]);
        let (scale_x, scale_y) = (scale[0], scale[1]);

        Some(Self::from_origin(x - i * scale_x, y + j * scale_y, scale_x, scale_y))
    }

    /// Build a transform from a GeoTIFF ModelTransformation matrix (4x4, row-major).
    pub fn from_model_transformation(matrix: &[f64]) -> Option<Self> {
        if matrix.len() < 16 {
            return None;
        }
        Some(Self {
            origin_x: matrix[3],
            pixel_width: matrix[0],
            row_rotation: matrix[1],
            origin_y: matrix[7],
            col_rotation: matrix[4],
            pixel_height: matrix[5],
        })
    }

    /// The six coefficients in GDAL order.
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    /// True when the grid has no rotation and rows run southward.
    pub fn is_north_up(&self) -> bool {
        self.row_rotation.abs() < EPSILON
            && self.col_rotation.abs() < EPSILON
            && self.pixel_width > 0.0
            && self.pixel_height < 0.0
    }

    /// Pixel size as positive (x, y) distances.
    pub fn resolution(&self) -> (f64, f64) {
        (self.pixel_width.abs(), self.pixel_height.abs())
    }

    /// World coordinate of the top-left corner of pixel (col, row).
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width + row * self.row_rotation,
            self.origin_y + col * self.col_rotation + row * self.pixel_height,
        )
    }

    /// Extent covered by a `width` x `height` grid under this transform.
    pub fn bounds(&self, width: u32, height: u32) -> Bounds {
        let corners = [
            self.pixel_to_world(0.0, 0.0),
            self.pixel_to_world(width as f64, 0.0),
            self.pixel_to_world(0.0, height as f64),
            self.pixel_to_world(width as f64, height as f64),
        ];

        let mut bounds = Bounds {
            west: f64::INFINITY,
            south: f64::INFINITY,
            east: f64::NEG_INFINITY,
            north: f64::NEG_INFINITY,
        };
        for (x, y) in corners {
            bounds.west = bounds.west.min(x);
            bounds.east = bounds.east.max(x);
            bounds.south = bounds.south.min(y);
            bounds.north = bounds.north.max(y);
        }
        bounds
    }
}

/// Axis-aligned extent in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum x.
    pub west: f64,
    /// Minimum y.
    pub south: f64,
    /// Maximum x.
    pub east: f64,
    /// Maximum y.
    pub north: f64,
}

impl Bounds {
    /// Smallest extent covering both `self` and `other`.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            west: self.west.min(other.west),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            north: self.north.max(other.north),
        }
    }

    /// Extent along x.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Extent along y.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Check if a world coordinate falls within the extent.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.west && x <= self.east && y >= self.south && y <= self.north
    }
}

/// Coordinate reference system of a raster.
///
/// The kind comes from the GeoKey directory entry the code was stored under,
/// not from the numeric range of the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Crs {
    /// Geographic (lat/lon) CRS, from `GeographicTypeGeoKey`.
    Geographic(u16),
    /// Projected CRS, from `ProjectedCSTypeGeoKey`.
    Projected(u16),
    /// No CRS information in the file.
    #[default]
    Unknown,
}

impl Crs {
    /// EPSG code, if known.
    pub fn epsg(&self) -> Option<u16> {
        match self {
            Crs::Geographic(code) | Crs::Projected(code) => Some(*code),
            Crs::Unknown => None,
        }
    }

    /// True for a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, Crs::Geographic(_))
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.epsg() {
            Some(code) => write!(f, "EPSG:{}", code),
            None => write!(f, "unknown CRS"),
        }
    }
}
