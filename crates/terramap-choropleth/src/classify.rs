//! Quantile classification and colour ramps.

use crate::{ChoroplethError, Result};
use std::fmt;
use std::str::FromStr;

/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

/// Fill used for regions with no value for the mapped attribute.
pub const DEFAULT_MISSING_COLOR: Rgb = Rgb::new(0xbd, 0xbd, 0xbd);

impl Rgb {
    /// Create a colour from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear blend between `self` (t = 0) and `other` (t = 1).
    pub fn lerp(&self, other: &Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ChoroplethError;

    /// Parse `#rrggbb` or `#rgb`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ChoroplethError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
        match hex.len() {
            6 => Ok(Rgb::new(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
            3 => {
                let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Rgb::new(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => Err(invalid()),
        }
    }
}

/// Sequential ColorBrewer ramps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    /// Yellow to green.
    YlGn,
    /// Light to dark blue.
    Blues,
    /// Yellow through orange to red.
    YlOrRd,
    /// Light to dark green.
    Greens,
    /// Light to dark red.
    Reds,
    /// Light to dark purple.
    Purples,
}

impl Palette {
    /// The nine-class stops of this ramp, light to dark.
    fn stops(&self) -> [Rgb; 9] {
        const fn c(hex: u32) -> Rgb {
            Rgb::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
        }
        match self {
            Palette::YlGn => [
                c(0xffffe5), c(0xf7fcb9), c(0xd9f0a3), c(0xaddd8e), c(0x78c679),
                c(0x41ab5d), c(0x238443), c(0x006837), c(0x004529),
            ],
            Palette::Blues => [
                c(0xf7fbff), c(0xdeebf7), c(0xc6dbef), c(0x9ecae1), c(0x6baed6),
                c(0x4292c6), c(0x2171b5), c(0x08519c), c(0x08306b),
            ],
            Palette::YlOrRd => [
                c(0xffffcc), c(0xffeda0), c(0xfed976), c(0xfeb24c), c(0xfd8d3c),
                c(0xfc4e2a), c(0xe31a1c), c(0xbd0026), c(0x800026),
            ],
            Palette::Greens => [
                c(0xf7fcf5), c(0xe5f5e0), c(0xc7e9c0), c(0xa1d99b), c(0x74c476),
                c(0x41ab5d), c(0x238b45), c(0x006d2c), c(0x00441b),
            ],
            Palette::Reds => [
                c(0xfff5f0), c(0xfee0d2), c(0xfcbba1), c(0xfc9272), c(0xfb6a4a),
                c(0xef3b2c), c(0xcb181d), c(0xa50f15), c(0x67000d),
            ],
            Palette::Purples => [
                c(0xfcfbfd), c(0xefedf5), c(0xdadaeb), c(0xbcbddc), c(0x9e9ac8),
                c(0x807dba), c(0x6a51a3), c(0x54278f), c(0x3f007d),
            ],
        }
    }

    /// `count` colours spread evenly along the ramp.
    pub fn colors(&self, count: usize) -> Vec<Rgb> {
        let stops = self.stops();
        let last = (stops.len() - 1) as f64;
        (0..count)
            .map(|i| {
                let t = if count == 1 { 0.5 } else { i as f64 / (count - 1) as f64 };
                let pos = t * last;
                let lo = pos.floor() as usize;
                let hi = (lo + 1).min(stops.len() - 1);
                stops[lo].lerp(&stops[hi], pos - lo as f64)
            })
            .collect()
    }
}

impl FromStr for Palette {
    type Err = ChoroplethError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ylgn" => Ok(Palette::YlGn),
            "blues" => Ok(Palette::Blues),
            "ylorrd" => Ok(Palette::YlOrRd),
            "greens" => Ok(Palette::Greens),
            "reds" => Ok(Palette::Reds),
            "purples" => Ok(Palette::Purples),
            _ => Err(ChoroplethError::UnknownPalette(s.to_string())),
        }
    }
}

/// Quantile classification of a numeric column.
///
/// `K` classes are delimited by `K + 1` non-decreasing breaks; the first
/// break is the minimum and the last the maximum of the classified values.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileScale {
    breaks: Vec<f64>,
    colors: Vec<Rgb>,
}

impl QuantileScale {
    /// Classify `values` into `classes` quantile classes coloured from `palette`.
    ///
    /// Non-finite values are ignored. Breaks use linear interpolation between
    /// order statistics.
    pub fn new(values: &[f64], classes: usize, palette: &Palette) -> Result<Self> {
        if classes == 0 {
            return Err(ChoroplethError::InvalidClassCount(classes));
        }

        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return Err(ChoroplethError::EmptyClassification);
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let breaks = (0..=classes)
            .map(|i| quantile(&sorted, i as f64 / classes as f64))
            .collect();

        Ok(Self {
            breaks,
            colors: palette.colors(classes),
        })
    }

    /// Class boundaries, `class_count() + 1` values.
    pub fn breaks(&self) -> &[f64] {
        &self.breaks
    }

    /// One colour per class.
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Number of classes.
    pub fn class_count(&self) -> usize {
        self.colors.len()
    }

    /// Lower and upper break of a class.
    pub fn class_range(&self, class: usize) -> Option<(f64, f64)> {
        Some((*self.breaks.get(class)?, *self.breaks.get(class + 1)?))
    }

    /// The class a value falls in.
    ///
    /// Each class includes its upper break; the lowest class also includes
    /// its lower break. Values outside the classified range clamp to the
    /// end classes. NaN has no class.
    pub fn class_of(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        let last = self.class_count() - 1;
        Some(
            self.breaks[1..]
                .iter()
                .position(|&upper| value <= upper)
                .unwrap_or(last),
        )
    }

    /// Colour of the class a value falls in.
    pub fn color_for(&self, value: f64) -> Option<Rgb> {
        self.class_of(value).map(|class| self.colors[class])
    }
}

/// Linearly interpolated quantile of sorted data, `p` in [0, 1].
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Fill colour for a region given its attribute value.
///
/// Regions without a value (or with NaN) get `missing`.
pub fn fill_color(value: Option<f64>, scale: &QuantileScale, missing: Rgb) -> Rgb {
    value
        .and_then(|v| scale.color_for(v))
        .unwrap_or(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rgb_parse_and_display() {
        let c: Rgb = "#41ab5d".parse().unwrap();
        assert_eq!(c, Rgb::new(0x41, 0xab, 0x5d));
        assert_eq!(c.to_string(), "#41ab5d");

        let short: Rgb = "#fa0".parse().unwrap();
        assert_eq!(short, Rgb::new(0xff, 0xaa, 0x00));

        assert!("#black".parse::<Rgb>().is_err());
        assert!("41ab5d".parse::<Rgb>().is_err());
        assert!("#41ab5".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_palette_colors() {
        let colors = Palette::YlGn.colors(9);
        assert_eq!(colors[0].to_string(), "#ffffe5");
        assert_eq!(colors[8].to_string(), "#004529");

        let five = Palette::Blues.colors(5);
        assert_eq!(five.len(), 5);
        assert_eq!(five[0].to_string(), "#f7fbff");
        assert_eq!(five[2].to_string(), "#6baed6");
        assert_eq!(five[4].to_string(), "#08306b");

        assert_eq!(Palette::Reds.colors(1).len(), 1);
    }

    #[test]
    fn test_palette_names() {
        assert_eq!("YlGn".parse::<Palette>().unwrap(), Palette::YlGn);
        assert_eq!("ylorrd".parse::<Palette>().unwrap(), Palette::YlOrRd);
        assert!("viridis".parse::<Palette>().is_err());
    }

    #[test]
    fn test_quantile_breaks() {
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let scale = QuantileScale::new(&values, 5, &Palette::YlGn).unwrap();

        let expected = [1.0, 2.8, 4.6, 6.4, 8.2, 10.0];
        for (b, e) in scale.breaks().iter().zip(expected) {
            assert_relative_eq!(*b, e, epsilon = 1e-12);
        }

        // Two values per class
        let mut counts = [0usize; 5];
        for v in &values {
            counts[scale.class_of(*v).unwrap()] += 1;
        }
        assert_eq!(counts, [2, 2, 2, 2, 2]);
    }

    #[test]
    fn test_breaks_non_decreasing_and_every_value_classified() {
        let values = [
            3.0, 3.0, 3.0, 7.5, 0.1, 42.0, 42.0, 18.2, 9.9, 3.0, 11.0, -4.0, 0.0,
        ];
        for classes in 1..=8 {
            let scale = QuantileScale::new(&values, classes, &Palette::Reds).unwrap();
            assert_eq!(scale.breaks().len(), classes + 1);
            assert!(scale.breaks().windows(2).all(|w| w[0] <= w[1]));

            for v in values {
                let class = scale.class_of(v).unwrap();
                let (lo, hi) = scale.class_range(class).unwrap();
                assert!(v >= lo && v <= hi, "{} not in class {} [{}, {}]", v, class, lo, hi);
            }
        }
    }

    #[test]
    fn test_out_of_range_clamps() {
        let scale = QuantileScale::new(&[1.0, 2.0, 3.0, 4.0], 2, &Palette::Blues).unwrap();
        assert_eq!(scale.class_of(-100.0), Some(0));
        assert_eq!(scale.class_of(100.0), Some(1));
        assert_eq!(scale.class_of(f64::NAN), None);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            QuantileScale::new(&[1.0], 0, &Palette::YlGn),
            Err(ChoroplethError::InvalidClassCount(0))
        ));
        assert!(matches!(
            QuantileScale::new(&[f64::NAN], 3, &Palette::YlGn),
            Err(ChoroplethError::EmptyClassification)
        ));
    }

    #[test]
    fn test_fill_color_missing_value() {
        let scale = QuantileScale::new(&[1.0, 2.0, 3.0], 3, &Palette::YlGn).unwrap();
        assert_eq!(fill_color(None, &scale, DEFAULT_MISSING_COLOR), DEFAULT_MISSING_COLOR);
        assert_eq!(fill_color(Some(f64::NAN), &scale, DEFAULT_MISSING_COLOR), DEFAULT_MISSING_COLOR);
        assert_eq!(fill_color(Some(3.0), &scale, DEFAULT_MISSING_COLOR), scale.colors()[2]);
        assert_eq!(DEFAULT_MISSING_COLOR.to_string(), "#bdbdbd");
    }
}
