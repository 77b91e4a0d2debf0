//! Records and record batches.
//!
//! A `Record` is an ordered, open mapping from field name to JSON value. Known
//! fields are read through the typed views in [`crate::rows`]; unknown columns
//! simply ride along so they survive conversion untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::fields::{is_array_field, ARRAY_SEPARATOR};

/// Display row of the first data record: a 1-indexed header row sits above it.
pub const FIRST_DATA_ROW: usize = 2;

/// Where a batch came from. Only JSON sources expose an array index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Json,
    Table,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Single trimmed text value of a scalar field; `None` when absent or blank.
    pub fn text(&self, field: &str) -> Option<String> {
        let value = self.0.get(field)?;
        let text = scalar_text(value)?;
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Every non-blank value carried by `field`, trimmed, in source order.
    ///
    /// Sequences yield their elements. A string in a registered array field is
    /// split on the array separator (tabular cells that were never
    /// un-flattened); any other scalar yields itself.
    pub fn values(&self, field: &str) -> Vec<String> {
        let Some(value) = self.0.get(field) else {
            return Vec::new();
        };
        let raw: Vec<String> = match value {
            Value::Array(items) => items.iter().map(element_text).collect(),
            Value::String(s) if is_array_field(field) => {
                s.split(ARRAY_SEPARATOR).map(str::to_string).collect()
            }
            Value::Object(_) => Vec::new(),
            other => scalar_text(other).into_iter().collect(),
        };
        raw.into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Text of a scalar value. Null is the empty string; containers have no text.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn element_text(value: &Value) -> String {
    scalar_text(value).unwrap_or_else(|| value.to_string())
}

/// One dataset's records, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch {
    pub dataset: String,
    pub source: SourceKind,
    pub records: Vec<Record>,
}

impl RecordBatch {
    pub fn new(dataset: impl Into<String>, source: SourceKind, records: Vec<Record>) -> Self {
        Self {
            dataset: dataset.into(),
            source,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Display row number for the record at `index` (same for every source).
    pub fn row_number(&self, index: usize) -> usize {
        index + FIRST_DATA_ROW
    }

    /// Position in the source JSON array, for debugging JSON inputs.
    pub fn array_index(&self, index: usize) -> Option<usize> {
        match self.source {
            SourceKind::Json => Some(index),
            SourceKind::Table => None,
        }
    }
}
