//! Region polygons decoded from GeoJSON.

use crate::{ChoroplethError, Result};
use geo::{MultiPolygon, Polygon};
use geojson::feature::Id;
use geojson::{Feature, GeoJson, JsonObject, JsonValue, Value};
use std::path::Path;
use tracing::{debug, info};

/// A region outline with the identifier used to join attributes onto it.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionGeometry {
    /// Join key taken from the feature's id property.
    pub key: String,
    /// Region outline.
    pub geometry: MultiPolygon<f64>,
    /// Remaining feature properties (used for tooltips).
    pub properties: JsonObject,
}

/// Decode a GeoJSON FeatureCollection of polygon features.
///
/// The join key is read from the `id_property` property (string or number),
/// falling back to the feature's top-level `id`.
pub fn parse_feature_collection(text: &str, id_property: &str) -> Result<Vec<RegionGeometry>> {
    let collection = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(ChoroplethError::NotFeatureCollection),
    };

    let mut regions = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        let key = feature_key(&feature, id_property).ok_or_else(|| {
            ChoroplethError::MissingIdProperty {
                index,
                property: id_property.to_string(),
            }
        })?;

        let value = feature
            .geometry
            .ok_or(ChoroplethError::MissingGeometry { index })?
            .value;
        let geometry = match value {
            v @ Value::Polygon(_) => MultiPolygon::new(vec![Polygon::try_from(v)?]),
            v @ Value::MultiPolygon(_) => MultiPolygon::try_from(v)?,
            other => {
                return Err(ChoroplethError::UnsupportedGeometry {
                    index,
                    kind: geometry_kind(&other).to_string(),
                })
            }
        };

        regions.push(RegionGeometry {
            key,
            geometry,
            properties: feature.properties.unwrap_or_default(),
        });
    }

    debug!("Decoded {} region geometries", regions.len());
    Ok(regions)
}

/// Read region geometries from a GeoJSON file on disk.
pub fn load_geometries_from_file<P: AsRef<Path>>(
    path: P,
    id_property: &str,
) -> Result<Vec<RegionGeometry>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let regions = parse_feature_collection(&text, id_property)?;
    info!("Loaded {} region geometries from {}", regions.len(), path.display());
    Ok(regions)
}

fn feature_key(feature: &Feature, id_property: &str) -> Option<String> {
    match feature.property(id_property) {
        Some(JsonValue::String(s)) => return Some(s.trim().to_string()),
        Some(JsonValue::Number(n)) => return Some(n.to_string()),
        _ => {}
    }
    match &feature.id {
        Some(Id::String(s)) => Some(s.clone()),
        Some(Id::Number(n)) => Some(n.to_string()),
        None => None,
    }
}

fn geometry_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"id": "001", "name": "North"},
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}
            },
            {
                "type": "Feature",
                "id": 2,
                "properties": {"name": "South"},
                "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[0,-1],[1,-1],[1,0],[0,0],[0,-1]]],
                    [[[2,-1],[3,-1],[3,0],[2,0],[2,-1]]]
                ]}
            }
        ]
    }"#;

    #[test]
    fn test_parse_polygons_and_multipolygons() {
        let regions = parse_feature_collection(COLLECTION, "id").unwrap();
        assert_eq!(regions.len(), 2);

        assert_eq!(regions[0].key, "001");
        assert_eq!(regions[0].geometry.0.len(), 1);
        assert_eq!(regions[0].properties.get("name"), Some(&JsonValue::from("North")));

        // Falls back to the feature id
        assert_eq!(regions[1].key, "2");
        assert_eq!(regions[1].geometry.0.len(), 2);
    }

    #[test]
    fn test_numeric_id_property() {
        let text = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"code":17},
             "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}}
        ]}"#;
        let regions = parse_feature_collection(text, "code").unwrap();
        assert_eq!(regions[0].key, "17");
    }

    #[test]
    fn test_rejects_points() {
        let text = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"id":"a"},
             "geometry":{"type":"Point","coordinates":[0,0]}}
        ]}"#;
        let err = parse_feature_collection(text, "id").unwrap_err();
        assert!(matches!(err, ChoroplethError::UnsupportedGeometry { index: 0, ref kind } if kind == "Point"));
    }

    #[test]
    fn test_missing_id() {
        let text = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},
             "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}}
        ]}"#;
        assert!(matches!(
            parse_feature_collection(text, "id"),
            Err(ChoroplethError::MissingIdProperty { index: 0, .. })
        ));
    }

    #[test]
    fn test_not_a_collection() {
        let text = r#"{"type":"Point","coordinates":[0,0]}"#;
        assert!(matches!(
            parse_feature_collection(text, "id"),
            Err(ChoroplethError::NotFeatureCollection)
        ));
    }
}
