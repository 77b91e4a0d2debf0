//! Pipeline edges: where batches come from and where flat rows go.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use lexicon_ingest::{parse_json_batch, read_batch, FlatRow, SourceError};
use lexicon_model::{Phase, RecordBatch};

/// Supplies one record batch per phase.
pub trait DatasetSource {
    fn load(&mut self, phase: &Phase) -> Result<RecordBatch, SourceError>;
}

/// Receives each successfully converted dataset.
pub trait RowSink {
    fn write(&mut self, dataset: &str, rows: &[FlatRow]) -> Result<()>;
}

/// Reads `phase.source` (or `<dataset>.json`) from disk.
#[derive(Debug, Clone, Default)]
pub struct FileSource;

impl DatasetSource for FileSource {
    fn load(&mut self, phase: &Phase) -> Result<RecordBatch, SourceError> {
        read_batch(&phase.dataset, &phase.source_path())
    }
}

/// JSON payloads held in memory, keyed by dataset id.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    payloads: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dataset: &str, json: impl Into<String>) -> Self {
        self.payloads.insert(dataset.to_string(), json.into());
        self
    }
}

impl DatasetSource for MemorySource {
    fn load(&mut self, phase: &Phase) -> Result<RecordBatch, SourceError> {
        let text = self
            .payloads
            .get(&phase.dataset)
            .ok_or_else(|| SourceError::Unreadable {
                dataset: phase.dataset.clone(),
                path: phase.source_path(),
                message: "no payload registered".to_string(),
            })?;
        parse_json_batch(&phase.dataset, text)
    }
}

/// Collects converted rows in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub outputs: BTreeMap<String, Vec<FlatRow>>,
}

impl RowSink for MemorySink {
    fn write(&mut self, dataset: &str, rows: &[FlatRow]) -> Result<()> {
        self.outputs.insert(dataset.to_string(), rows.to_vec());
        Ok(())
    }
}

/// Writes `<dir>/<dataset>.json`, an array of flat objects.
#[derive(Debug, Clone)]
pub struct JsonDirSink {
    dir: PathBuf,
}

impl JsonDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, dataset: &str) -> PathBuf {
        self.dir.join(format!("{dataset}.json"))
    }
}

impl RowSink for JsonDirSink {
    fn write(&mut self, dataset: &str, rows: &[FlatRow]) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let path = self.path_for(dataset);
        fs::write(&path, serde_json::to_string_pretty(rows)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!(dataset, path = %path.display(), rows = rows.len(), "wrote flat rows");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexicon_ingest::flatten_batch;
    use lexicon_model::PipelineConfig;

    #[test]
    fn memory_source_reports_missing_payloads_as_unreadable() {
        let mut source = MemorySource::new();
        let phase = Phase::new("tasks", &[], true);
        assert!(matches!(
            source.load(&phase),
            Err(SourceError::Unreadable { .. })
        ));
    }

    #[test]
    fn json_dir_sink_writes_one_file_per_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonDirSink::new(dir.path().join("out"));
        let batch = parse_json_batch("tasks", r#"[{"task":"Blurring","inputs":["a","b"]}]"#)
            .unwrap();
        sink.write("tasks", &flatten_batch(&batch)).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(sink.path_for("tasks")).unwrap()).unwrap();
        assert_eq!(written, serde_json::json!([{ "task": "Blurring", "inputs": "a, b" }]));
    }

    #[test]
    fn file_source_reads_the_phase_source() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("custom.tsv"), "task\nBlurring\nStaging\n").unwrap();
        let mut phase = Phase::new("tasks", &[], true);
        phase.source = Some(dir.path().join("custom.tsv"));
        let batch = FileSource.load(&phase).unwrap();
        assert_eq!(batch.dataset, "tasks");
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn file_source_defaults_to_dataset_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tasks.json"), r#"[{"task":"Blurring"}]"#).unwrap();

        let phase = Phase::new("tasks", &[], true);
        assert!(phase.source.is_none());
        assert_eq!(phase.source_path(), PathBuf::from("tasks.json"));

        let config = PipelineConfig::default().resolve_paths(dir.path());
        let resolved = config.phase("tasks").unwrap();
        assert_eq!(resolved.source_path(), dir.path().join("tasks.json"));
        assert_eq!(FileSource.load(resolved).unwrap().len(), 1);
    }
}
