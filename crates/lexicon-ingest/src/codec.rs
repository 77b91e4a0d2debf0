//! Structural codec: nested records ⇄ flat rows.
//!
//! Flattening rules, per field:
//! - null → empty string
//! - sequence of scalars → elements joined with `", "` (empty → empty string)
//! - sequence containing nested values → compact JSON text
//! - nested record → recurse with `parent.child` keys
//! - scalar → copied as-is
//!
//! Un-flattening only decodes registered array fields back into sequences;
//! cells that already hold a sequence are kept as they are.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use lexicon_model::fields::{is_array_field, ARRAY_SEPARATOR, PATH_SEPARATOR};
use lexicon_model::record::scalar_text;
use lexicon_model::{Record, RecordBatch};

/// A single-level row: dotted-path keys to scalar values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRow(Map<String, Value>);

impl FlatRow {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Cell text for tabular output (missing keys are blank).
    pub fn cell(&self, key: &str) -> String {
        self.0.get(key).and_then(scalar_text).unwrap_or_default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
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
}

impl FromIterator<(String, Value)> for FlatRow {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

pub fn flatten(record: &Record) -> FlatRow {
    let mut row = FlatRow::new();
    for (key, value) in record.iter() {
        flatten_into(&mut row, key, value);
    }
    row
}

fn flatten_into(row: &mut FlatRow, key: &str, value: &Value) {
    match value {
        Value::Null => row.insert(key, Value::String(String::new())),
        Value::Array(items) => {
            let cell = if items.iter().all(is_scalar) {
                items
                    .iter()
                    .map(|item| scalar_text(item).unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join(ARRAY_SEPARATOR)
            } else {
                // Heterogeneous nested arrays have no sensible column layout.
                value.to_string()
            };
            row.insert(key, Value::String(cell));
        }
        Value::Object(children) => {
            for (child_key, child) in children {
                let path = format!("{key}{PATH_SEPARATOR}{child_key}");
                flatten_into(row, &path, child);
            }
        }
        scalar => row.insert(key, scalar.clone()),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

pub fn unflatten(row: &FlatRow) -> Record {
    row.iter()
        .map(|(key, value)| {
            let value = if is_array_field(key) {
                split_array_cell(key, value)
            } else {
                value.clone()
            };
            (key.clone(), value)
        })
        .collect()
}

/// Decode a joined cell. Sequences are already decoded and pass through.
fn split_array_cell(key: &str, value: &Value) -> Value {
    if let Value::Array(_) = value {
        return value.clone();
    }
    let Some(text) = scalar_text(value) else {
        tracing::warn!(field = key, "array field holds a nested record; decoding as empty");
        return Value::Array(Vec::new());
    };
    Value::Array(
        text.split(ARRAY_SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string()))
            .collect(),
    )
}

pub fn flatten_batch(batch: &RecordBatch) -> Vec<FlatRow> {
    batch.records.iter().map(flatten).collect()
}

/// Flat rows laid out as a rectangular table for a spreadsheet writer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatTable {
    /// Union of all row keys, in first-seen order.
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn flat_table(rows: &[FlatRow]) -> FlatTable {
    let mut headers: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    let rows = rows
        .iter()
        .map(|row| headers.iter().map(|h| row.cell(h)).collect())
        .collect();
    FlatTable { headers, rows }
}
