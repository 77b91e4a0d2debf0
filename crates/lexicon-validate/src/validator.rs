//! Batch validation.
//!
//! Two passes over a batch, both appending to one error list:
//! 1. simple fields: every value must be a learned option of its field
//! 2. compound fields: both sides of `"left: right"` must be known, and must
//!    agree with the relationship maps (and, for `enhancement:taskProduct`,
//!    with the raw tasks batch; no tasks batch means no task transforms
//!    anything)
//!
//! Rows are visited in input order, fields in their declared order. A field
//! with no learned options is unconstrained.

use serde::{Deserialize, Serialize};

use lexicon_model::fields::{
    normalized_alias, option_source, ENHANCEMENT, SIMPLE_VALIDATED_FIELDS, TASK, TASK_PRODUCT,
};
use lexicon_model::rows::compound_specs;
use lexicon_model::{CompoundKind, CompoundSpec, Record, RecordBatch, TaskRow};
use lexicon_storage::{KnowledgeDocument, RelationshipMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A simple field value that is not a learned option.
    UnknownValue,
    /// Left side of a compound specification is not a learned option.
    UnknownCompoundLeft,
    /// Right side of a compound specification is not a learned option.
    UnknownCompoundRight,
    /// Both sides are known but the relationship map does not link them.
    NotInRelationship,
    /// No task carries the enhancement while consuming and producing the product.
    NoMatchingTask,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Display row (first data row is 2).
    pub row: usize,
    /// Position in the source JSON array; absent for tabular sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_index: Option<usize>,
    pub field: String,
    pub invalid_value: String,
    pub valid_options: Vec<String>,
    pub kind: ErrorKind,
    /// Full compound text, for compound-field errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compound: Option<String>,
}

/// Where in the batch an error was found.
#[derive(Debug, Clone, Copy)]
struct Location {
    row: usize,
    array_index: Option<usize>,
}

pub struct Validator<'a> {
    knowledge: &'a KnowledgeDocument,
    tasks: Vec<TaskRow>,
}

impl<'a> Validator<'a> {
    pub fn new(knowledge: &'a KnowledgeDocument) -> Self {
        Self {
            knowledge,
            tasks: Vec::new(),
        }
    }

    /// Raw tasks batch used by the `enhancement:taskProduct` cross-reference.
    /// Without it every enhancement-medium specification is unmatched.
    pub fn with_tasks(mut self, tasks: &RecordBatch) -> Self {
        self.tasks = tasks.records.iter().map(TaskRow::from_record).collect();
        self
    }

    pub fn validate(&self, batch: &RecordBatch) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        self.validate_simple_fields(batch, &mut errors);
        self.validate_compound_fields(batch, &mut errors);
        errors
    }

    fn validate_simple_fields(&self, batch: &RecordBatch, errors: &mut Vec<ValidationError>) {
        for (index, record) in batch.records.iter().enumerate() {
            let at = locate(batch, index);
            for field in SIMPLE_VALIDATED_FIELDS {
                let Some(options) = self.knowledge.options(option_source(field)) else {
                    continue;
                };
                for value in field_values(record, field) {
                    if !options.contains(&value) {
                        errors.push(ValidationError {
                            row: at.row,
                            array_index: at.array_index,
                            field: field.to_string(),
                            invalid_value: value,
                            valid_options: options.to_vec(),
                            kind: ErrorKind::UnknownValue,
                            compound: None,
                        });
                    }
                }
            }
        }
    }

    fn validate_compound_fields(&self, batch: &RecordBatch, errors: &mut Vec<ValidationError>) {
        for (index, record) in batch.records.iter().enumerate() {
            let at = locate(batch, index);
            for spec in compound_specs(record) {
                let mut check = CompoundCheck {
                    at,
                    spec: &spec,
                    errors: &mut *errors,
                };
                match spec.kind {
                    CompoundKind::Responsibility => {
                        check.side_known(self.knowledge, Side::Left, TASK);
                        check.linked(
                            self.knowledge.task_responsibilities.as_ref(),
                            Side::Left,
                            Side::Right,
                        );
                    }
                    CompoundKind::Transformation => {
                        check.side_known(self.knowledge, Side::Left, TASK_PRODUCT);
                        check.linked(
                            self.knowledge.task_product_producers.as_ref(),
                            Side::Left,
                            Side::Right,
                        );
                    }
                    CompoundKind::EnhancementMedium => {
                        check.side_known(self.knowledge, Side::Left, ENHANCEMENT);
                        check.side_known(self.knowledge, Side::Right, TASK_PRODUCT);
                        check.linked(
                            self.knowledge.task_product_enhancements.as_ref(),
                            Side::Right,
                            Side::Left,
                        );
                        check.task_transforms_with(&self.tasks);
                    }
                }
            }
        }
    }
}

fn locate(batch: &RecordBatch, index: usize) -> Location {
    Location {
        row: batch.row_number(index),
        array_index: batch.array_index(index),
    }
}

/// A record's values for `field`, read under its underscore alias when the
/// literal column is absent.
fn field_values(record: &Record, field: &str) -> Vec<String> {
    if record.contains(field) {
        return record.values(field);
    }
    normalized_alias(field)
        .map(|alias| record.values(&alias))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
}

struct CompoundCheck<'s, 'e> {
    at: Location,
    spec: &'s CompoundSpec,
    errors: &'e mut Vec<ValidationError>,
}

impl CompoundCheck<'_, '_> {
    fn side(&self, side: Side) -> &str {
        match side {
            Side::Left => &self.spec.left,
            Side::Right => &self.spec.right,
        }
    }

    fn push(&mut self, value: &str, options: Vec<String>, kind: ErrorKind) {
        self.errors.push(ValidationError {
            row: self.at.row,
            array_index: self.at.array_index,
            field: self.spec.kind.field_name().to_string(),
            invalid_value: value.to_string(),
            valid_options: options,
            kind,
            compound: Some(self.spec.raw.clone()),
        });
    }

    /// `side` must be a learned option of `field` (once `field` has options).
    fn side_known(&mut self, knowledge: &KnowledgeDocument, side: Side, field: &str) {
        let Some(options) = knowledge.options(field) else {
            return;
        };
        let value = self.side(side).to_string();
        if !options.contains(&value) {
            let kind = match side {
                Side::Left => ErrorKind::UnknownCompoundLeft,
                Side::Right => ErrorKind::UnknownCompoundRight,
            };
            self.push(&value, options.to_vec(), kind);
        }
    }

    /// If `map` has an entry for the `key` side, the `member` side must be in it.
    fn linked(&mut self, map: Option<&RelationshipMap>, key: Side, member: Side) {
        let Some(related) = map.and_then(|m| m.get(self.side(key))) else {
            return;
        };
        let value = self.side(member).to_string();
        if !related.contains(&value) {
            let related = related.clone();
            self.push(&value, related, ErrorKind::NotInRelationship);
        }
    }

    /// Some task must carry the enhancement (left) while listing the product
    /// (right) in both its inputs and outputs.
    fn task_transforms_with(&mut self, tasks: &[TaskRow]) {
        let spec = self.spec;
        let enhancement = spec.left.as_str();
        let product = spec.right.as_str();
        let carriers: Vec<&TaskRow> = tasks
            .iter()
            .filter(|t| t.enhancement == enhancement)
            .collect();
        if carriers.iter().any(|t| t.transforms(product)) {
            return;
        }

        let mut names: Vec<String> = Vec::new();
        for task in carriers {
            if !task.task.is_empty() && !names.contains(&task.task) {
                names.push(task.task.clone());
            }
        }
        self.push(spec.raw.trim(), names, ErrorKind::NoMatchingTask);
    }
}
