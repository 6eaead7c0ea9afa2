//! Interactive choropleth maps as standalone HTML.
//!
//! A [`WebMap`] is assembled with an explicit builder:
//!
//! ```no_run
//! # use terramap_choropleth::*;
//! # fn demo(regions: &[JoinedRegion], scale: &QuantileScale) -> Result<()> {
//! let map = WebMap::builder((48.7, 19.7), 7)
//!     .title("Employment rate")
//!     .add_layer(Layer::Choropleth(ChoroplethLayer::new(
//!         "Employment rate",
//!         regions,
//!         "employment_rate",
//!         scale,
//!         DEFAULT_MISSING_COLOR,
//!     )))
//!     .add_layer(Layer::Tooltip(TooltipLayer::new(
//!         "Details",
//!         regions,
//!         &[("name".to_string(), "District".to_string())],
//!     )))
//!     .legend(Legend::from_scale("Employment rate (%)", scale, DEFAULT_MISSING_COLOR))
//!     .layer_control(true)
//!     .build();
//! map.save("output/choropleth.html")?;
//! # Ok(())
//! # }
//! ```
//!
//! Per-feature styles and tooltip text are computed here and embedded in
//! the GeoJSON, so the generated script only reads feature properties.

use crate::classify::{fill_color, QuantileScale, Rgb};
use crate::render::escape_markup;
use crate::{JoinedRegion, Result};
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};
use serde_json::json;
use std::fmt::Write;
use std::path::Path;
use tracing::info;

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";

/// A base map tile source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileProvider {
    /// Name shown in the layer control.
    pub name: String,
    /// URL template with `{z}`, `{x}`, `{y}` (and optionally `{s}`) placeholders.
    pub url_template: String,
    /// Attribution HTML.
    pub attribution: String,
}

impl TileProvider {
    /// Standard OpenStreetMap tiles.
    pub fn openstreetmap() -> Self {
        Self {
            name: "OpenStreetMap".to_string(),
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors".to_string(),
        }
    }

    /// CARTO light basemap.
    pub fn carto_positron() -> Self {
        Self {
            name: "CartoDB positron".to_string(),
            url_template: "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; OpenStreetMap contributors &copy; <a href=\"https://carto.com/attributions\">CARTO</a>".to_string(),
        }
    }

    /// Look up a built-in provider by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "openstreetmap" | "osm" => Some(Self::openstreetmap()),
            "cartodb positron" | "cartodbpositron" | "positron" => Some(Self::carto_positron()),
            _ => None,
        }
    }
}

/// Filled polygons coloured by a quantile scale.
#[derive(Debug, Clone)]
pub struct ChoroplethLayer {
    /// Name shown in the layer control.
    pub name: String,
    /// Features with a `style` property each.
    pub features: FeatureCollection,
}

impl ChoroplethLayer {
    /// Build the layer, styling each region with [`fill_color`].
    ///
    /// Features are keyed by the region's synthetic `row_id`.
    pub fn new(
        name: impl Into<String>,
        regions: &[JoinedRegion],
        column: &str,
        scale: &QuantileScale,
        missing: Rgb,
    ) -> Self {
        let features = regions
            .iter()
            .map(|region| {
                let value = region.number(column);
                let fill = fill_color(value, scale, missing);
                let mut properties = JsonObject::new();
                properties.insert("row_id".to_string(), json!(region.row_id));
                properties.insert("key".to_string(), json!(region.key()));
                properties.insert("value".to_string(), json!(value));
                properties.insert(
                    "style".to_string(),
                    json!({
                        "fillColor": fill.to_string(),
                        "color": "#444444",
                        "weight": 1,
                        "opacity": 1.0,
                        "fillOpacity": 0.7,
                    }),
                );
                region_feature(region, properties)
            })
            .collect();

        Self {
            name: name.into(),
            features: collection(features),
        }
    }
}

/// Transparent overlay that only carries hover tooltips.
#[derive(Debug, Clone)]
pub struct TooltipLayer {
    /// Name shown in the layer control.
    pub name: String,
    /// Features with a `tooltip` HTML property each.
    pub features: FeatureCollection,
}

impl TooltipLayer {
    /// Build the overlay from `(field, alias)` pairs.
    ///
    /// Fields are looked up in the attribute row first, then in the feature
    /// properties. Missing fields are shown as `n/a`.
    pub fn new(name: impl Into<String>, regions: &[JoinedRegion], fields: &[(String, String)]) -> Self {
        let features = regions
            .iter()
            .map(|region| {
                let mut html = String::new();
                for (field, alias) in fields {
                    let value = region.field_text(field).unwrap_or_else(|| "n/a".to_string());
                    let _ = write!(
                        html,
                        "<b>{}</b>: {}<br>",
                        escape_markup(alias),
                        escape_markup(&value)
                    );
                }
                let mut properties = JsonObject::new();
                properties.insert("row_id".to_string(), json!(region.row_id));
                properties.insert("tooltip".to_string(), JsonValue::String(html));
                region_feature(region, properties)
            })
            .collect();

        Self {
            name: name.into(),
            features: collection(features),
        }
    }
}

fn region_feature(region: &JoinedRegion, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::from(&region.geometry))),
        id: Some(Id::Number(region.row_id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// A map layer.
#[derive(Debug, Clone)]
pub enum Layer {
    /// Coloured region fill.
    Choropleth(ChoroplethLayer),
    /// Invisible hover tooltips.
    Tooltip(TooltipLayer),
}

impl Layer {
    /// Name shown in the layer control.
    pub fn name(&self) -> &str {
        match self {
            Layer::Choropleth(layer) => &layer.name,
            Layer::Tooltip(layer) => &layer.name,
        }
    }
}

/// Colour key shown in a corner of the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    /// Heading.
    pub caption: String,
    /// Swatch colour and label per row.
    pub entries: Vec<(Rgb, String)>,
}

impl Legend {
    /// One row per class of `scale` plus a row for missing data.
    pub fn from_scale(caption: impl Into<String>, scale: &QuantileScale, missing: Rgb) -> Self {
        let mut entries: Vec<(Rgb, String)> = (0..scale.class_count())
            .filter_map(|class| {
                let (lo, hi) = scale.class_range(class)?;
                Some((scale.colors()[class], format!("{:.1} - {:.1}", lo, hi)))
            })
            .collect();
        entries.push((missing, "No data".to_string()));
        Self {
            caption: caption.into(),
            entries,
        }
    }

    fn to_html(&self) -> String {
        let mut html = format!("<b>{}</b><br>", escape_markup(&self.caption));
        for (color, label) in &self.entries {
            let _ = write!(
                html,
                "<i style=\"background:{}\"></i>{}<br>",
                color,
                escape_markup(label)
            );
        }
        html
    }
}

/// Builder for [`WebMap`].
#[derive(Debug, Clone)]
pub struct WebMapBuilder {
    title: String,
    center: (f64, f64),
    zoom: u8,
    tiles: TileProvider,
    layers: Vec<Layer>,
    legend: Option<Legend>,
    layer_control: bool,
}

impl WebMapBuilder {
    /// Page title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Base map tiles (OpenStreetMap by default).
    pub fn tiles(mut self, tiles: TileProvider) -> Self {
        self.tiles = tiles;
        self
    }

    /// Add a layer; layers are drawn in the order added.
    pub fn add_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Show a legend.
    pub fn legend(mut self, legend: Legend) -> Self {
        self.legend = Some(legend);
        self
    }

    /// Show a control for toggling layers.
    pub fn layer_control(mut self, enabled: bool) -> Self {
        self.layer_control = enabled;
        self
    }

    /// Finish the map.
    pub fn build(self) -> WebMap {
        WebMap {
            title: self.title,
            center: self.center,
            zoom: self.zoom,
            tiles: self.tiles,
            layers: self.layers,
            legend: self.legend,
            layer_control: self.layer_control,
        }
    }
}

/// A finished interactive map.
#[derive(Debug, Clone)]
pub struct WebMap {
    title: String,
    center: (f64, f64),
    zoom: u8,
    tiles: TileProvider,
    layers: Vec<Layer>,
    legend: Option<Legend>,
    layer_control: bool,
}

/// Encode a value as a JavaScript literal safe to embed in a `<script>` block.
fn js_literal<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

impl WebMap {
    /// Start a map centred on `(lat, lon)` at `zoom`.
    pub fn builder(center: (f64, f64), zoom: u8) -> WebMapBuilder {
        WebMapBuilder {
            title: "Map".to_string(),
            center,
            zoom,
            tiles: TileProvider::openstreetmap(),
            layers: Vec::new(),
            legend: None,
            layer_control: false,
        }
    }

    /// Layers in drawing order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Serialize to a standalone HTML document.
    pub fn to_html(&self) -> Result<String> {
        let mut script = String::new();
        let _ = writeln!(
            script,
            "var map = L.map(\"map\", {{center: [{}, {}], zoom: {}}});",
            self.center.0, self.center.1, self.zoom
        );
        let _ = writeln!(
            script,
            "var base = L.tileLayer({}, {{attribution: {}, maxZoom: 19}}).addTo(map);",
            js_literal(&self.tiles.url_template)?,
            js_literal(&self.tiles.attribution)?
        );
        script.push_str("var overlays = {};\n");

        for (i, layer) in self.layers.iter().enumerate() {
            match layer {
                Layer::Choropleth(layer) => {
                    let _ = writeln!(
                        script,
                        "var layer_{} = L.geoJSON({}, {{style: function (feature) {{ return feature.properties.style; }}}}).addTo(map);",
                        i,
                        js_literal(&layer.features)?
                    );
                }
                Layer::Tooltip(layer) => {
                    let _ = writeln!(
                        script,
                        "var layer_{} = L.geoJSON({}, {{style: {{fillOpacity: 0, opacity: 0}}, onEachFeature: function (feature, layer) {{ layer.bindTooltip(feature.properties.tooltip, {{sticky: true}}); }}}}).addTo(map);",
                        i,
                        js_literal(&layer.features)?
                    );
                }
            }
            let _ = writeln!(script, "overlays[{}] = layer_{};", js_literal(layer.name())?, i);
        }

        if let Some(legend) = &self.legend {
            let _ = writeln!(
                script,
                "var legend = L.control({{position: \"bottomright\"}});\nlegend.onAdd = function () {{ var div = L.DomUtil.create(\"div\", \"legend\"); div.innerHTML = {}; return div; }};\nlegend.addTo(map);",
                js_literal(&legend.to_html())?
            );
        }

        if self.layer_control {
            let _ = writeln!(
                script,
                "L.control.layers({{{}: base}}, overlays, {{collapsed: false}}).addTo(map);",
                js_literal(&self.tiles.name)?
            );
        }

        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1.0"/>
<title>{title}</title>
<link rel="stylesheet" href="{css}"/>
<script src="{js}"></script>
<style>
html, body, #map {{ height: 100%; width: 100%; margin: 0; padding: 0; }}
.legend {{ background: white; padding: 6px 10px; line-height: 18px; color: #333; font: 12px sans-serif; box-shadow: 0 0 6px rgba(0,0,0,0.3); border-radius: 4px; }}
.legend i {{ width: 18px; height: 14px; float: left; margin-right: 8px; opacity: 0.8; border: 1px solid #999; }}
</style>
</head>
<body>
<div id="map"></div>
<script>
{script}</script>
</body>
</html>
"#,
            title = escape_markup(&self.title),
            css = LEAFLET_CSS,
            js = LEAFLET_JS,
            script = script
        );
        Ok(html)
    }

    /// Write the HTML document to `path`, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_html()?)?;
        info!("Wrote interactive map to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Palette, DEFAULT_MISSING_COLOR};
    use crate::RegionRecord;
    use geo::{polygon, MultiPolygon};
    use std::collections::BTreeMap;

    fn region(row_id: usize, key: &str, name: &str, rate: Option<&str>) -> JoinedRegion {
        let mut attributes = BTreeMap::new();
        attributes.insert("name".to_string(), name.to_string());
        if let Some(rate) = rate {
            attributes.insert("rate".to_string(), rate.to_string());
        }
        JoinedRegion {
            row_id,
            geometry: MultiPolygon::new(vec![polygon![
                (x: 17.0, y: 48.0),
                (x: 18.0, y: 48.0),
                (x: 18.0, y: 49.0),
            ]]),
            properties: JsonObject::new(),
            record: RegionRecord {
                key: key.to_string(),
                attributes,
            },
        }
    }

    fn regions() -> Vec<JoinedRegion> {
        vec![
            region(0, "001", "North", Some("55.0")),
            region(1, "002", "South </script>", Some("75.0")),
            region(2, "003", "East", None),
        ]
    }

    #[test]
    fn test_choropleth_styles_use_fallback_for_missing() {
        let regions = regions();
        let scale = QuantileScale::new(&[55.0, 75.0], 2, &Palette::YlGn).unwrap();
        let layer = ChoroplethLayer::new("Rate", &regions, "rate", &scale, DEFAULT_MISSING_COLOR);

        let fills: Vec<String> = layer
            .features
            .features
            .iter()
            .map(|f| f.property("style").unwrap()["fillColor"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            fills,
            vec![
                scale.colors()[0].to_string(),
                scale.colors()[1].to_string(),
                "#bdbdbd".to_string()
            ]
        );
        assert_eq!(layer.features.features[2].id, Some(Id::Number(2.into())));
    }

    #[test]
    fn test_tooltip_escapes_values() {
        let regions = regions();
        let layer = TooltipLayer::new(
            "Details",
            &regions,
            &[
                ("name".to_string(), "District".to_string()),
                ("rate".to_string(), "Rate".to_string()),
            ],
        );
        let tooltip = layer.features.features[1].property("tooltip").unwrap().as_str().unwrap();
        assert_eq!(tooltip, "<b>District</b>: South &lt;/script&gt;<br><b>Rate</b>: 75.0<br>");

        let missing = layer.features.features[2].property("tooltip").unwrap().as_str().unwrap();
        assert!(missing.contains("n/a"));
    }

    #[test]
    fn test_html_document() {
        let regions = regions();
        let scale = QuantileScale::new(&[55.0, 75.0], 2, &Palette::Blues).unwrap();
        let map = WebMap::builder((48.7, 19.7), 7)
            .title("Employment & jobs")
            .tiles(TileProvider::carto_positron())
            .add_layer(Layer::Choropleth(ChoroplethLayer::new(
                "Rate",
                &regions,
                "rate",
                &scale,
                DEFAULT_MISSING_COLOR,
            )))
            .add_layer(Layer::Tooltip(TooltipLayer::new(
                "Details",
                &regions,
                &[("name".to_string(), "District".to_string())],
            )))
            .legend(Legend::from_scale("Rate (%)", &scale, DEFAULT_MISSING_COLOR))
            .layer_control(true)
            .build();

        assert_eq!(map.layers().len(), 2);
        assert_eq!(map.layers()[1].name(), "Details");

        let html = map.to_html().unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Employment &amp; jobs</title>"));
        assert!(html.contains("center: [48.7, 19.7], zoom: 7"));
        assert!(html.contains("basemaps.cartocdn.com"));
        assert!(html.contains("var layer_0 = L.geoJSON("));
        assert!(html.contains("bindTooltip"));
        assert!(html.contains("L.control.layers"));
        assert!(html.contains("No data"));
        assert!(!html.contains("#black"));
        // Only the document's own script tags close
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn test_minimal_map_has_no_controls() {
        let html = WebMap::builder((0.0, 0.0), 2).build().to_html().unwrap();
        assert!(!html.contains("L.control.layers"));
        assert!(!html.contains("legend.addTo"));
        assert!(html.contains("tile.openstreetmap.org"));
    }

    #[test]
    fn test_tile_provider_names() {
        assert_eq!(TileProvider::from_name("OpenStreetMap"), Some(TileProvider::openstreetmap()));
        assert_eq!(TileProvider::from_name("CartoDB Positron"), Some(TileProvider::carto_positron()));
        assert_eq!(TileProvider::from_name("stamen"), None);
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maps/out.html");
        WebMap::builder((1.0, 2.0), 3).build().save(&path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("<div id=\"map\"></div>"));
    }
}
