//! Inner join of attribute rows onto region geometries.

use crate::{AttributeTable, ChoroplethError, RegionGeometry, RegionRecord, Result};
use geo::MultiPolygon;
use geojson::{JsonObject, JsonValue};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// How unmatched keys are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinPolicy {
    /// Drop unmatched rows and log a warning listing them.
    #[default]
    Warn,
    /// Fail if any geometry has no attribute row.
    Strict,
}

/// A region with both geometry and attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRegion {
    /// Synthetic per-row identifier, `0..n` in geometry order.
    pub row_id: usize,
    /// Region outline.
    pub geometry: MultiPolygon<f64>,
    /// Feature properties from the geometry source.
    pub properties: JsonObject,
    /// Matching attribute row.
    pub record: RegionRecord,
}

impl JoinedRegion {
    /// Join key.
    pub fn key(&self) -> &str {
        &self.record.key
    }

    /// Numeric attribute value.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.record.number(column)
    }

    /// Display text for a field, looked up in attributes then feature properties.
    pub fn field_text(&self, field: &str) -> Option<String> {
        if let Some(value) = self.record.value(field) {
            return Some(value.to_string());
        }
        match self.properties.get(field)? {
            JsonValue::Null => None,
            JsonValue::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Row counts and unmatched keys from a join.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinReport {
    /// Geometries before the join.
    pub geometry_count: usize,
    /// Attribute rows before the join.
    pub record_count: usize,
    /// Rows after the join.
    pub joined_count: usize,
    /// Geometry keys with no attribute row.
    pub unmatched_geometry_keys: Vec<String>,
    /// Attribute keys with no geometry.
    pub unmatched_record_keys: Vec<String>,
}

impl JoinReport {
    /// True when every geometry found an attribute row.
    pub fn is_complete(&self) -> bool {
        self.joined_count == self.geometry_count
    }
}

/// Result of a join.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// Joined rows, in geometry order.
    pub regions: Vec<JoinedRegion>,
    /// Counts and unmatched keys.
    pub report: JoinReport,
}

impl JoinOutcome {
    /// All finite values of a numeric column.
    pub fn numeric_values(&self, column: &str) -> Vec<f64> {
        self.regions.iter().filter_map(|r| r.number(column)).collect()
    }
}

/// Inner-join attribute rows onto geometries by key.
///
/// Keys present on only one side are dropped from the result and listed in
/// the report. Under [`JoinPolicy::Warn`] they are logged; under
/// [`JoinPolicy::Strict`] a geometry without attributes is an error.
pub fn join(
    table: &AttributeTable,
    geometries: Vec<RegionGeometry>,
    policy: JoinPolicy,
) -> Result<JoinOutcome> {
    let by_key: HashMap<&str, &RegionRecord> = table
        .records()
        .iter()
        .map(|r| (r.key.as_str(), r))
        .collect();

    let mut report = JoinReport {
        geometry_count: geometries.len(),
        record_count: table.len(),
        ..Default::default()
    };

    let mut matched: HashSet<&str> = HashSet::new();
    let mut regions = Vec::with_capacity(geometries.len());
    for geometry in geometries {
        match by_key.get(geometry.key.as_str()) {
            Some(record) => {
                matched.insert(record.key.as_str());
                regions.push(JoinedRegion {
                    row_id: regions.len(),
                    geometry: geometry.geometry,
                    properties: geometry.properties,
                    record: (*record).clone(),
                });
            }
            None => report.unmatched_geometry_keys.push(geometry.key),
        }
    }

    report.joined_count = regions.len();
    report.unmatched_record_keys = table
        .records()
        .iter()
        .filter(|r| !matched.contains(r.key.as_str()))
        .map(|r| r.key.clone())
        .collect();

    info!(
        "Joined {} of {} geometries to {} attribute rows",
        report.joined_count, report.geometry_count, report.record_count
    );

    if !report.unmatched_geometry_keys.is_empty() {
        if policy == JoinPolicy::Strict {
            return Err(ChoroplethError::UnmatchedKeys {
                keys: report.unmatched_geometry_keys,
            });
        }
        warn!(
            "{} geometries have no attribute row and were dropped: {}",
            report.unmatched_geometry_keys.len(),
            report.unmatched_geometry_keys.join(", ")
        );
    }
    if !report.unmatched_record_keys.is_empty() {
        warn!(
            "{} attribute rows have no geometry: {}",
            report.unmatched_record_keys.len(),
            report.unmatched_record_keys.join(", ")
        );
    }

    Ok(JoinOutcome { regions, report })
}
