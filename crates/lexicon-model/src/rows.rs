//! Typed per-dataset row views.
//!
//! Built from a `Record` where external data enters the system. Missing or
//! blank fields become empty strings / empty sequences; these views never fail.

use serde::{Deserialize, Serialize};

use crate::compound::{CompoundKind, CompoundSpec};
use crate::fields::{
    ENHANCEMENT, ENHANCEMENT_ORDER, INPUTS, OUTPUTS, RESPONSIBILITY_OPTIONS, SERVICE, TASK,
    TASK_PRODUCT,
};
use crate::record::Record;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRow {
    pub task: String,
    pub enhancement: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub responsibility_options: Vec<String>,
}

impl TaskRow {
    pub fn from_record(record: &Record) -> Self {
        Self {
            task: record.text(TASK).unwrap_or_default(),
            enhancement: record.text(ENHANCEMENT).unwrap_or_default(),
            inputs: record.values(INPUTS),
            outputs: record.values(OUTPUTS),
            responsibility_options: record.values(RESPONSIBILITY_OPTIONS),
        }
    }

    /// True when the task both consumes and produces `task_product`.
    pub fn transforms(&self, task_product: &str) -> bool {
        self.inputs.iter().any(|p| p == task_product)
            && self.outputs.iter().any(|p| p == task_product)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProductRow {
    pub task_product: String,
    pub enhancement_order: Vec<String>,
}

impl TaskProductRow {
    pub fn from_record(record: &Record) -> Self {
        Self {
            task_product: record.text(TASK_PRODUCT).unwrap_or_default(),
            enhancement_order: record.values(ENHANCEMENT_ORDER),
        }
    }
}

/// A service row with its compound specifications parsed.
///
/// A compound field that is absent, blank or malformed is `None`; the raw
/// text (when present) stays on the record for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceRow {
    pub service: String,
    pub task_product: Option<String>,
    pub enhancement: Option<String>,
    pub responsibility: Option<CompoundSpec>,
    pub transformation: Option<CompoundSpec>,
    pub enhancement_medium: Option<CompoundSpec>,
}

impl ServiceRow {
    pub fn from_record(record: &Record) -> Self {
        let spec = |kind: CompoundKind| {
            record
                .text(kind.field_name())
                .and_then(|raw| CompoundSpec::parse(kind, &raw).ok())
        };
        Self {
            service: record.text(SERVICE).unwrap_or_default(),
            task_product: record.text(TASK_PRODUCT),
            enhancement: record.text(ENHANCEMENT),
            responsibility: spec(CompoundKind::Responsibility),
            transformation: spec(CompoundKind::Transformation),
            enhancement_medium: spec(CompoundKind::EnhancementMedium),
        }
    }
}

/// Every well-formed compound specification on a record, in declared field order.
pub fn compound_specs(record: &Record) -> Vec<CompoundSpec> {
    CompoundKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let raw = record.text(kind.field_name())?;
            CompoundSpec::parse(kind, &raw).ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => Record::from(map),
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn task_row_reads_sequences_in_either_shape() {
        let row = TaskRow::from_record(&record(json!({
            "task": "Blurring",
            "enhancement": "Blur",
            "inputs": ["Hdr-images"],
            "outputs": "Hdr-images, Previews",
        })));
        assert_eq!(row.task, "Blurring");
        assert_eq!(row.inputs, vec!["Hdr-images"]);
        assert_eq!(row.outputs, vec!["Hdr-images", "Previews"]);
        assert!(row.responsibility_options.is_empty());
        assert!(row.transforms("Hdr-images"));
        assert!(!row.transforms("Previews"));
    }

    #[test]
    fn service_row_parses_compounds_eagerly() {
        let row = ServiceRow::from_record(&record(json!({
            "Service": "Retouch",
            "taskProduct": "",
            "enhancement medium specification (enhancement:taskProduct)": "Blur: Hdr-images",
            "responsibility specification (Task:Responsibility)": "no colon here",
        })));
        assert_eq!(row.service, "Retouch");
        assert_eq!(row.task_product, None);
        let medium = row.enhancement_medium.unwrap();
        assert_eq!(medium.kind, CompoundKind::EnhancementMedium);
        assert_eq!((medium.left.as_str(), medium.right.as_str()), ("Blur", "Hdr-images"));
        assert_eq!(row.responsibility, None);
        assert_eq!(row.transformation, None);
    }

    #[test]
    fn compound_specs_follow_declared_order() {
        let specs = compound_specs(&record(json!({
            "enhancement medium specification (enhancement:taskProduct)": "Blur: Hdr-images",
            "responsibility specification (Task:Responsibility)": "Blurring: Operator",
        })));
        let kinds: Vec<CompoundKind> = specs.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![CompoundKind::Responsibility, CompoundKind::EnhancementMedium]
        );
    }
}
