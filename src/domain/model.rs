use crate::utils::error::{HarvestError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One vehicle as returned by the upstream API. The record is carried
/// through unchanged; fields are only resolved at export time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleRecord(pub Value);

impl From<Value> for VehicleRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl VehicleRecord {
    /// Walk a nested path, erroring with the full path on the first absent key.
    pub fn field(&self, path: &[&str]) -> Result<&Value> {
        let mut current = &self.0;
        for key in path {
            current = current.get(key).ok_or_else(|| HarvestError::MalformedRecord {
                path: path.join("."),
            })?;
        }
        Ok(current)
    }

    /// Resolve a path to a scalar rendered as text. A JSON null renders as
    /// an empty cell; objects and arrays are not usable values.
    pub fn text(&self, path: &[&str]) -> Result<String> {
        scalar_text(self.field(path)?).ok_or_else(|| HarvestError::MalformedRecord {
            path: path.join("."),
        })
    }

    /// Resolve a path to an array of objects and comma-join one key of each.
    pub fn joined(&self, path: &[&str], key: &str) -> Result<String> {
        let element_path = || format!("{}.{}", path.join("."), key);
        let items = self
            .field(path)?
            .as_array()
            .ok_or_else(|| HarvestError::MalformedRecord {
                path: path.join("."),
            })?;

        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            let value = item
                .get(key)
                .ok_or_else(|| HarvestError::MalformedRecord { path: element_path() })?;
            parts.push(scalar_text(value).ok_or_else(|| HarvestError::MalformedRecord {
                path: element_path(),
            })?);
        }
        Ok(parts.join(","))
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Ordered, append-only collection of harvested records. Arrival order is
/// preserved and duplicates are kept; the run's single strategy is the only
/// writer.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct Inventory {
    records: Vec<VehicleRecord>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, vehicles: Vec<VehicleRecord>) {
        self.records.extend(vehicles);
    }

    pub fn records(&self) -> &[VehicleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Named search values substituted into the page URL (listener mode) or the
/// query template (paging mode). Built once from the CLI config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameters {
    pub model: String,
    pub zipcode: String,
    pub distance: u32,
    pub sale_pending: bool,
    pub in_transit: bool,
}

impl QueryParameters {
    /// Template keys with their rendered values, in substitution order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("model", self.model.clone()),
            ("zipcode", self.zipcode.clone()),
            ("distance", self.distance.to_string()),
            ("salePending", self.sale_pending.to_string()),
            ("inTransit", self.in_transit.to_string()),
        ]
    }
}

/// Position in a paged result set. Starts at (1, 1); the total is corrected
/// from every page's response, so a changed upstream total is picked up
/// mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page_no: u32,
    pub total_pages: u32,
}

impl PageCursor {
    pub fn new() -> Self {
        Self {
            page_no: 1,
            total_pages: 1,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page_no <= self.total_pages
    }

    pub fn observe_total(&mut self, total_pages: u32) {
        self.total_pages = total_pages;
    }

    pub fn advance(&mut self) {
        self.page_no += 1;
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new()
    }
}
