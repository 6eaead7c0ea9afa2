//! Attribute tables loaded from delimited text.

use crate::{ChoroplethError, Result};
use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// One row of an attribute table.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRecord {
    /// Join key (possibly normalized; see [`AttributeTable::strip_key_prefix`]).
    pub key: String,
    /// All columns of the row, including the original key column.
    pub attributes: BTreeMap<String, String>,
}

impl RegionRecord {
    /// Raw text of a column.
    pub fn value(&self, column: &str) -> Option<&str> {
        self.attributes.get(column).map(String::as_str)
    }

    /// Numeric value of a column. Empty or non-numeric cells are `None`.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.value(column)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }
}

/// Rows of region statistics keyed by a region identifier column.
#[derive(Debug, Clone)]
pub struct AttributeTable {
    key_column: String,
    headers: Vec<String>,
    records: Vec<RegionRecord>,
}

impl AttributeTable {
    /// Read a delimited file with a header row.
    pub fn from_path<P: AsRef<Path>>(path: P, key_column: &str, delimiter: u8) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file, key_column, delimiter)?;
        info!(
            "Loaded {} attribute rows from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Read delimited text with a header row from any reader.
    pub fn from_reader<R: Read>(reader: R, key_column: &str, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let key_index = headers
            .iter()
            .position(|h| h == key_column)
            .ok_or_else(|| ChoroplethError::MissingColumn(key_column.to_string()))?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let attributes: BTreeMap<String, String> = headers
                .iter()
                .cloned()
                .zip(row.iter().map(str::to_string))
                .collect();
            let key = row.get(key_index).unwrap_or_default().to_string();
            records.push(RegionRecord { key, attributes });
        }

        let table = Self {
            key_column: key_column.to_string(),
            headers,
            records,
        };
        table.check_unique_keys()?;
        Ok(table)
    }

    /// Remove a fixed-length prefix from every key, e.g. `SK001` → `001`.
    ///
    /// Fails if a key is not longer than the prefix, or if stripping makes
    /// two keys collide.
    pub fn strip_key_prefix(&mut self, prefix_len: usize) -> Result<()> {
        if prefix_len == 0 {
            return Ok(());
        }
        for record in &mut self.records {
            if record.key.chars().count() <= prefix_len {
                return Err(ChoroplethError::KeyTooShort {
                    key: record.key.clone(),
                    prefix_len,
                });
            }
            record.key = record.key.chars().skip(prefix_len).collect();
        }
        debug!("Stripped {}-character prefix from {} keys", prefix_len, self.records.len());
        self.check_unique_keys()
    }

    fn check_unique_keys(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.records.len());
        for record in &self.records {
            if !seen.insert(record.key.as_str()) {
                return Err(ChoroplethError::DuplicateKey(record.key.clone()));
            }
        }
        Ok(())
    }

    /// Require that a column exists.
    pub fn require_column(&self, column: &str) -> Result<()> {
        if self.headers.iter().any(|h| h == column) {
            Ok(())
        } else {
            Err(ChoroplethError::MissingColumn(column.to_string()))
        }
    }

    /// Name of the key column.
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Column names in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// All rows.
    pub fn records(&self) -> &[RegionRecord] {
        &self.records
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
