//! Record batches from external payloads.
//!
//! Inputs arrive either as JSON (an array of objects, or one object) or as a
//! header/row table (what a spreadsheet reader hands over; `.tsv` files on
//! disk). Table cells go through `unflatten`, so both shapes reach the
//! validator as the same `Record` model.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use lexicon_model::{Record, RecordBatch, SourceKind};

use crate::codec::{unflatten, FlatRow};

/// Soft, per-dataset failures: the pipeline records them and moves on.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{dataset}: cannot read {}: {message}", .path.display())]
    Unreadable {
        dataset: String,
        path: PathBuf,
        message: String,
    },
    #[error("{dataset}: parse error: {message}")]
    Parse { dataset: String, message: String },
    #[error("{dataset}: structural error: {message}")]
    Structural { dataset: String, message: String },
}

impl SourceError {
    pub fn dataset(&self) -> &str {
        match self {
            SourceError::Unreadable { dataset, .. }
            | SourceError::Parse { dataset, .. }
            | SourceError::Structural { dataset, .. } => dataset,
        }
    }

    fn structural(dataset: &str, message: impl Into<String>) -> Self {
        SourceError::Structural {
            dataset: dataset.to_string(),
            message: message.into(),
        }
    }
}

pub fn parse_json_batch(dataset: &str, text: &str) -> Result<RecordBatch, SourceError> {
    let value: Value = serde_json::from_str(text).map_err(|e| SourceError::Parse {
        dataset: dataset.to_string(),
        message: e.to_string(),
    })?;

    let records = match value {
        Value::Array(items) => {
            if items.is_empty() {
                return Err(SourceError::structural(dataset, "empty batch"));
            }
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Object(map) => Ok(Record::from(map)),
                    other => Err(SourceError::structural(
                        dataset,
                        format!("element {i} is {}, expected an object", kind_name(&other)),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?
        }
        Value::Object(map) => vec![Record::from(map)],
        other => {
            return Err(SourceError::structural(
                dataset,
                format!(
                    "expected an array of objects or an object, found {}",
                    kind_name(&other)
                ),
            ))
        }
    };

    Ok(RecordBatch::new(dataset, SourceKind::Json, records))
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Build a batch from header/row pairs. Short rows are padded with blanks.
pub fn records_from_table(
    dataset: &str,
    headers: &[String],
    rows: &[Vec<String>],
) -> Result<RecordBatch, SourceError> {
    if headers.is_empty() {
        return Err(SourceError::structural(dataset, "table has no header row"));
    }
    if let Some(col) = headers.iter().position(|h| h.trim().is_empty()) {
        return Err(SourceError::structural(
            dataset,
            format!("header column {} is blank", col + 1),
        ));
    }
    if rows.is_empty() {
        return Err(SourceError::structural(dataset, "empty batch"));
    }

    let mut records = Vec::with_capacity(rows.len());
    for (i, cells) in rows.iter().enumerate() {
        if cells.len() > headers.len() {
            return Err(SourceError::structural(
                dataset,
                format!(
                    "row {} has {} cells but only {} headers",
                    i + lexicon_model::record::FIRST_DATA_ROW,
                    cells.len(),
                    headers.len()
                ),
            ));
        }
        let flat: FlatRow = headers
            .iter()
            .enumerate()
            .map(|(col, header)| {
                let cell = cells.get(col).cloned().unwrap_or_default();
                (header.trim().to_string(), Value::String(cell))
            })
            .collect();
        records.push(unflatten(&flat));
    }

    Ok(RecordBatch::new(dataset, SourceKind::Table, records))
}

/// Tab-separated text: first non-blank line is the header row.
pub fn parse_tsv_batch(dataset: &str, text: &str) -> Result<RecordBatch, SourceError> {
    let mut lines = text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty());

    let headers: Vec<String> = match lines.next() {
        Some(line) => line.split('\t').map(str::to_string).collect(),
        None => return Err(SourceError::structural(dataset, "table has no header row")),
    };
    let rows: Vec<Vec<String>> = lines
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect();

    records_from_table(dataset, &headers, &rows)
}

/// Read a dataset file; `.tsv` is tabular, anything else is JSON.
pub fn read_batch(dataset: &str, path: &Path) -> Result<RecordBatch, SourceError> {
    let text = fs::read_to_string(path).map_err(|e| SourceError::Unreadable {
        dataset: dataset.to_string(),
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let is_table = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tsv"));
    let batch = if is_table {
        parse_tsv_batch(dataset, &text)?
    } else {
        parse_json_batch(dataset, &text)?
    };

    tracing::debug!(
        dataset,
        path = %path.display(),
        records = batch.len(),
        "loaded record batch"
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn json_array_of_objects_is_a_batch() {
        let batch = parse_json_batch("tasks", r#"[{"task":"Blurring"},{"task":"Staging"}]"#)
            .unwrap();
        assert_eq!(batch.source, SourceKind::Json);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.records[1].text("task").as_deref(), Some("Staging"));
    }

    #[test]
    fn single_object_is_a_one_record_batch() {
        let batch = parse_json_batch("services", r#"{"Service":"Retouch"}"#).unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = parse_json_batch("tasks", "[{").unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));
        assert_eq!(err.dataset(), "tasks");
    }

    #[test]
    fn empty_and_non_object_payloads_are_structural_errors() {
        for text in ["[]", "42", r#"[{"task":"a"}, 3]"#, r#""tasks""#] {
            let err = parse_json_batch("tasks", text).unwrap_err();
            assert!(matches!(err, SourceError::Structural { .. }), "{text}: {err}");
        }
    }

    #[test]
    fn table_rows_are_unflattened() {
        let batch = records_from_table(
            "tasks",
            &strings(&["task", "inputs", "outputs"]),
            &[strings(&["Blurring", "a, b", ""]), strings(&["Staging"])],
        )
        .unwrap();
        assert_eq!(batch.source, SourceKind::Table);
        assert_eq!(batch.records[0].get("inputs"), Some(&json!(["a", "b"])));
        assert_eq!(batch.records[0].get("outputs"), Some(&json!([])));
        // Missing trailing cells are blank.
        assert_eq!(batch.records[1].get("inputs"), Some(&json!([])));
    }

    #[test]
    fn ragged_or_headless_tables_are_structural_errors() {
        let too_wide = records_from_table("tasks", &strings(&["task"]), &[strings(&["a", "b"])]);
        assert!(matches!(too_wide, Err(SourceError::Structural { .. })));
        let header_only = records_from_table("tasks", &strings(&["task"]), &[]);
        assert!(matches!(header_only, Err(SourceError::Structural { .. })));
        let blank_header = records_from_table("tasks", &strings(&["task", " "]), &[]);
        assert!(matches!(blank_header, Err(SourceError::Structural { .. })));
    }

    #[test]
    fn tsv_text_parses_through_the_table_path() {
        let batch = parse_tsv_batch(
            "task-products",
            "taskProduct\tenhancement-order\r\nHdr-images\tBlur, Sharpen\r\n\r\n",
        )
        .unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(
            batch.records[0].get("enhancement-order"),
            Some(&json!(["Blur", "Sharpen"]))
        );
    }

    #[test]
    fn read_batch_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let tsv = dir.path().join("tasks.tsv");
        fs::write(&tsv, "task\nBlurring\n").unwrap();
        assert_eq!(read_batch("tasks", &tsv).unwrap().source, SourceKind::Table);

        let missing = read_batch("tasks", &dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, SourceError::Unreadable { .. }));
    }
}
