//! Static choropleth rendering to SVG.

use crate::classify::{fill_color, QuantileScale, Rgb, DEFAULT_MISSING_COLOR};
use crate::{JoinedRegion, Result};
use geo::{BoundingRect, Coord, LineString, Rect};
use std::fmt::Write;
use std::path::Path;
use tracing::info;

/// Width reserved to the right of the map for the legend.
const LEGEND_WIDTH: f64 = 220.0;
/// Height of the title band.
const TITLE_HEIGHT: f64 = 40.0;

/// Layout and styling for [`render_svg`].
#[derive(Debug, Clone)]
pub struct SvgOptions {
    /// Width of the map area in pixels (the legend is added to the right).
    pub map_width: f64,
    /// Height of the map area in pixels.
    pub map_height: f64,
    /// Padding around the map.
    pub margin: f64,
    /// Figure title.
    pub title: String,
    /// Legend heading.
    pub legend_title: String,
    /// Fill for regions without a value.
    pub missing_color: Rgb,
    /// Outline colour.
    pub stroke: Rgb,
    /// Outline width.
    pub stroke_width: f64,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            map_width: 800.0,
            map_height: 600.0,
            margin: 20.0,
            title: String::new(),
            legend_title: String::new(),
            missing_color: DEFAULT_MISSING_COLOR,
            stroke: Rgb::new(0x44, 0x44, 0x44),
            stroke_width: 0.5,
        }
    }
}

/// Maps world coordinates into the map area.
struct Projection {
    bounds: Rect<f64>,
    x_factor: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Projection {
    fn fit(bounds: Rect<f64>, options: &SvgOptions) -> Self {
        let min = bounds.min();
        let max = bounds.max();
        let geographic = min.x >= -180.0 && max.x <= 180.0 && min.y >= -90.0 && max.y <= 90.0;

        // Longitude degrees shrink with latitude
        let x_factor = if geographic {
            ((min.y + max.y) / 2.0).to_radians().cos().max(1e-6)
        } else {
            1.0
        };

        let dx = (bounds.width() * x_factor).max(f64::EPSILON);
        let dy = bounds.height().max(f64::EPSILON);
        let scale = (options.map_width / dx).min(options.map_height / dy);

        // Centre the drawing in the map area
        let offset_x = options.margin + (options.map_width - dx * scale) / 2.0;
        let offset_y = options.margin + TITLE_HEIGHT + (options.map_height - dy * scale) / 2.0;

        Self {
            bounds,
            x_factor,
            scale,
            offset_x,
            offset_y,
        }
    }

    fn project(&self, c: Coord<f64>) -> (f64, f64) {
        (
            self.offset_x + (c.x - self.bounds.min().x) * self.x_factor * self.scale,
            self.offset_y + (self.bounds.max().y - c.y) * self.scale,
        )
    }
}

fn ring_path(out: &mut String, ring: &LineString<f64>, projection: &Projection) {
    for (i, coord) in ring.coords().enumerate() {
        let (x, y) = projection.project(*coord);
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(out, "{}{:.2} {:.2} ", cmd, x, y);
    }
    out.push_str("Z ");
}

fn combined_bounds(regions: &[JoinedRegion]) -> Option<Rect<f64>> {
    regions
        .iter()
        .filter_map(|r| r.geometry.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                },
            )
        })
}

/// Escape text for inclusion in XML or HTML.
pub(crate) fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render regions as filled polygons coloured by `scale`, with a legend.
pub fn render_svg(
    regions: &[JoinedRegion],
    column: &str,
    scale: &QuantileScale,
    options: &SvgOptions,
) -> String {
    let total_width = options.map_width + 2.0 * options.margin + LEGEND_WIDTH;
    let total_height = options.map_height + 2.0 * options.margin + TITLE_HEIGHT;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}" font-family="sans-serif">"#,
        w = total_width,
        h = total_height
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{:.0}" y="28" font-size="18" font-weight="bold">{}</text>"#,
        options.margin,
        escape_markup(&options.title)
    );

    if let Some(bounds) = combined_bounds(regions) {
        let projection = Projection::fit(bounds, options);
        let _ = writeln!(
            svg,
            r#"<g stroke="{}" stroke-width="{}" fill-rule="evenodd">"#,
            options.stroke, options.stroke_width
        );
        for region in regions {
            let fill = fill_color(region.number(column), scale, options.missing_color);
            let mut d = String::new();
            for polygon in region.geometry.0.iter() {
                ring_path(&mut d, polygon.exterior(), &projection);
                for interior in polygon.interiors() {
                    ring_path(&mut d, interior, &projection);
                }
            }
            let _ = writeln!(
                svg,
                r#"<path d="{}" fill="{}"><title>{}</title></path>"#,
                d.trim_end(),
                fill,
                escape_markup(region.key())
            );
        }
        svg.push_str("</g>\n");
    }

    // Legend
    let legend_x = options.map_width + 2.0 * options.margin;
    let mut y = options.margin + TITLE_HEIGHT;
    let _ = writeln!(
        svg,
        r#"<text x="{:.0}" y="{:.0}" font-size="13" font-weight="bold">{}</text>"#,
        legend_x,
        y,
        escape_markup(&options.legend_title)
    );
    y += 12.0;
    let rows = (0..scale.class_count())
        .filter_map(|class| {
            let (lo, hi) = scale.class_range(class)?;
            Some((scale.colors()[class], format!("{:.1} - {:.1}", lo, hi)))
        })
        .chain(std::iter::once((options.missing_color, "No data".to_string())));
    for (color, label) in rows {
        let _ = writeln!(
            svg,
            r#"<rect x="{:.0}" y="{:.0}" width="18" height="14" fill="{}" stroke="{}" stroke-width="0.5"/>"#,
            legend_x, y, color, options.stroke
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.0}" y="{:.0}" font-size="12">{}</text>"#,
            legend_x + 26.0,
            y + 11.0,
            escape_markup(&label)
        );
        y += 20.0;
    }

    svg.push_str("</svg>\n");
    svg
}

/// Render to SVG and write the result to `path`, creating parent directories.
pub fn save_svg<P: AsRef<Path>>(
    path: P,
    regions: &[JoinedRegion],
    column: &str,
    scale: &QuantileScale,
    options: &SvgOptions,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_svg(regions, column, scale, options))?;
    info!("Wrote static map to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Palette;
    use crate::RegionRecord;
    use geo::{polygon, MultiPolygon};
    use geojson::JsonObject;
    use std::collections::BTreeMap;

    fn region(row_id: usize, key: &str, x: f64, rate: Option<&str>) -> JoinedRegion {
        let mut attributes = BTreeMap::new();
        if let Some(rate) = rate {
            attributes.insert("rate".to_string(), rate.to_string());
        }
        JoinedRegion {
            row_id,
            geometry: MultiPolygon::new(vec![polygon![
                (x: x, y: 48.0),
                (x: x + 1.0, y: 48.0),
                (x: x + 1.0, y: 49.0),
                (x: x, y: 49.0),
            ]]),
            properties: JsonObject::new(),
            record: RegionRecord {
                key: key.to_string(),
                attributes,
            },
        }
    }

    #[test]
    fn test_escape_markup() {
        assert_eq!(escape_markup(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_svg_colours_and_legend() {
        let regions = vec![
            region(0, "001", 17.0, Some("60")),
            region(1, "002", 18.0, Some("80")),
            region(2, "003", 19.0, None),
        ];
        let scale = QuantileScale::new(&[60.0, 80.0], 2, &Palette::YlGn).unwrap();
        let options = SvgOptions {
            title: "Employment <2023>".to_string(),
            ..Default::default()
        };

        let svg = render_svg(&regions, "rate", &scale, &options);

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<path").count(), 3);
        assert!(svg.contains(&format!(r#"fill="{}""#, scale.colors()[0])));
        assert!(svg.contains(&format!(r#"fill="{}""#, scale.colors()[1])));
        assert!(svg.contains(r##"fill="#bdbdbd""##));
        assert!(svg.contains("Employment &lt;2023&gt;"));
        assert!(svg.contains("60.0 - 70.0"));
        assert!(svg.contains("No data"));
        assert!(!svg.contains("#black"));
    }

    #[test]
    fn test_projection_stays_in_map_area() {
        let regions = vec![region(0, "001", 17.0, Some("1")), region(1, "002", 22.0, Some("2"))];
        let options = SvgOptions::default();
        let projection = Projection::fit(combined_bounds(&regions).unwrap(), &options);

        for (x, y) in [(17.0, 48.0), (23.0, 49.0), (20.0, 48.5)] {
            let (px, py) = projection.project(Coord { x, y });
            assert!(px >= options.margin - 1e-9 && px <= options.margin + options.map_width + 1e-9);
            assert!(py >= options.margin + TITLE_HEIGHT - 1e-9);
            assert!(py <= options.margin + TITLE_HEIGHT + options.map_height + 1e-9);
        }
    }

    #[test]
    fn test_empty_regions_still_render_legend() {
        let scale = QuantileScale::new(&[1.0], 1, &Palette::Blues).unwrap();
        let svg = render_svg(&[], "rate", &scale, &SvgOptions::default());
        assert_eq!(svg.matches("<path").count(), 0);
        assert!(svg.contains("No data"));
    }
}
