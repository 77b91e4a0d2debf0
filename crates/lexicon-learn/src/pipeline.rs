//! The phase-ordered learning pipeline.
//!
//! For each phase, in order:
//! 1. load the batch (soft failure: report and continue)
//! 2. retain it in memory by dataset id
//! 3. validate against the store as it stands (soft failure: nothing learned)
//! 4. learn the phase's fields
//! 5. flatten and hand the rows to the sink
//! 6. derive: relationship maps after `tasks` (when `task-products` is in
//!    memory), service specifications after `services`
//!
//! The store is reset first, so each run is one coherent ingestion session.

use std::collections::{BTreeSet, HashMap};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use lexicon_ingest::{flatten_batch, SourceError};
use lexicon_model::fields::{DATASET_SERVICES, DATASET_TASKS, DATASET_TASK_PRODUCTS};
use lexicon_model::{Phase, RecordBatch};
use lexicon_storage::{KnowledgeDocument, KnowledgeStore};
use lexicon_validate::{ValidationReport, Validator};

use crate::io::{DatasetSource, RowSink};
use crate::relations::{build_relationships, service_specifications};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DatasetOutcome {
    Converted { rows: usize },
    Unreadable { message: String },
    ParseFailed { message: String },
    StructuralFailed { message: String },
    ValidationFailed { report: ValidationReport },
}

impl DatasetOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DatasetOutcome::Converted { .. })
    }
}

impl From<SourceError> for DatasetOutcome {
    fn from(err: SourceError) -> Self {
        let message = err.to_string();
        match err {
            SourceError::Unreadable { .. } => DatasetOutcome::Unreadable { message },
            SourceError::Parse { .. } => DatasetOutcome::ParseFailed { message },
            SourceError::Structural { .. } => DatasetOutcome::StructuralFailed { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetReport {
    pub dataset: String,
    pub records: usize,
    pub outcome: DatasetOutcome,
    /// Derived store entries written after this dataset (relationship maps,
    /// service specifications).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub derived: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub datasets: Vec<DatasetReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.datasets
            .iter()
            .filter(|d| d.outcome.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.datasets.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn dataset(&self, dataset: &str) -> Option<&DatasetReport> {
        self.datasets.iter().find(|d| d.dataset == dataset)
    }
}

pub struct Pipeline {
    phases: Vec<Phase>,
    store: KnowledgeStore,
}

impl Pipeline {
    pub fn new(phases: Vec<Phase>, store: KnowledgeStore) -> Self {
        Self { phases, store }
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    /// Run every phase. `Err` only for store or sink I/O failures.
    pub fn run(
        &self,
        source: &mut dyn DatasetSource,
        sink: &mut dyn RowSink,
    ) -> Result<RunReport> {
        self.store.reset().context("failed to reset knowledge store")?;

        let mut retained: HashMap<String, RecordBatch> = HashMap::new();
        let mut report = RunReport::default();

        for phase in &self.phases {
            tracing::info!(dataset = %phase.dataset, validate = phase.validate, "phase started");
            let dataset_report = self.run_phase(phase, source, sink, &mut retained)?;
            if dataset_report.outcome.is_success() {
                tracing::info!(
                    dataset = %phase.dataset,
                    records = dataset_report.records,
                    "phase converted"
                );
            } else {
                tracing::warn!(dataset = %phase.dataset, "phase failed; continuing with next dataset");
            }
            report.datasets.push(dataset_report);
        }

        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "pipeline finished"
        );
        Ok(report)
    }

    fn run_phase(
        &self,
        phase: &Phase,
        source: &mut dyn DatasetSource,
        sink: &mut dyn RowSink,
        retained: &mut HashMap<String, RecordBatch>,
    ) -> Result<DatasetReport> {
        let mut dataset_report = DatasetReport {
            dataset: phase.dataset.clone(),
            records: 0,
            outcome: DatasetOutcome::Converted { rows: 0 },
            derived: Vec::new(),
        };

        let batch = match source.load(phase) {
            Ok(batch) => batch,
            Err(err) => {
                tracing::warn!(error = %err, "dataset could not be loaded");
                dataset_report.outcome = err.into();
                return Ok(dataset_report);
            }
        };
        dataset_report.records = batch.len();
        retained.insert(phase.dataset.clone(), batch);
        let batch = &retained[&phase.dataset];

        if phase.validate {
            let knowledge = self.store.load()?;
            if let Some(report) = validate_stage(&knowledge, batch, retained) {
                tracing::warn!(
                    dataset = %phase.dataset,
                    errors = report.len(),
                    "dataset rejected by validation"
                );
                dataset_report.outcome = DatasetOutcome::ValidationFailed { report };
                return Ok(dataset_report);
            }
        }

        learn_stage(&self.store, phase, batch)?;

        let rows = flatten_batch(batch);
        sink.write(&phase.dataset, &rows)
            .with_context(|| format!("failed to emit converted rows for {}", phase.dataset))?;
        dataset_report.outcome = DatasetOutcome::Converted { rows: rows.len() };

        dataset_report.derived = derive_stage(&self.store, &phase.dataset, retained)?;
        Ok(dataset_report)
    }
}

/// `None` when the batch is clean.
fn validate_stage(
    knowledge: &KnowledgeDocument,
    batch: &RecordBatch,
    retained: &HashMap<String, RecordBatch>,
) -> Option<ValidationReport> {
    let mut validator = Validator::new(knowledge);
    if let Some(tasks) = retained.get(DATASET_TASKS) {
        validator = validator.with_tasks(tasks);
    }
    let errors = validator.validate(batch);
    (!errors.is_empty()).then(|| ValidationReport::new(batch.dataset.clone(), errors))
}

/// Unique non-blank values of `field` across the batch.
pub fn unique_values(batch: &RecordBatch, field: &str) -> BTreeSet<String> {
    batch
        .records
        .iter()
        .flat_map(|record| record.values(field))
        .collect()
}

fn learn_stage(store: &KnowledgeStore, phase: &Phase, batch: &RecordBatch) -> Result<()> {
    for field in &phase.learn {
        let values = unique_values(batch, field);
        store
            .learn(field, values)
            .with_context(|| format!("failed to learn `{field}` from {}", phase.dataset))?;
    }
    Ok(())
}

fn derive_stage(
    store: &KnowledgeStore,
    dataset: &str,
    retained: &HashMap<String, RecordBatch>,
) -> Result<Vec<String>> {
    let mut derived = Vec::new();
    match dataset {
        DATASET_TASKS => {
            let (Some(task_products), Some(tasks)) = (
                retained.get(DATASET_TASK_PRODUCTS),
                retained.get(DATASET_TASKS),
            ) else {
                tracing::warn!(
                    "task-products not ingested before tasks; relationship maps not built"
                );
                return Ok(derived);
            };
            store
                .set_relationships(build_relationships(task_products, tasks))
                .context("failed to store relationship maps")?;
            derived.push("relationships".to_string());
        }
        DATASET_SERVICES => {
            if let Some(services) = retained.get(DATASET_SERVICES) {
                store
                    .set_service_specifications(service_specifications(services))
                    .context("failed to store service specifications")?;
                derived.push("service_specifications".to_string());
            }
        }
        _ => {}
    }
    Ok(derived)
}
