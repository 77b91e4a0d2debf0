//! Relationship builder.
//!
//! Pure functions over in-memory batches (never over the knowledge store).
//! Per-name maps are last-write-wins: a later row for the same name replaces
//! the earlier row's list outright.

use std::collections::BTreeMap;

use lexicon_model::fields::{
    ENHANCEMENT, ENHANCEMENT_MEDIUM_SPECIFICATION, RESPONSIBILITY_SPECIFICATION, SERVICE,
    TASK_PRODUCT, TRANSFORMATION_SPECIFICATION,
};
use lexicon_model::{RecordBatch, TaskProductRow, TaskRow};
use lexicon_storage::{RelationshipMap, Relationships, ServiceSpecification};

/// task → its responsibility options.
pub fn task_responsibilities(tasks: &RecordBatch) -> RelationshipMap {
    let mut map = RelationshipMap::new();
    for row in tasks.records.iter().map(TaskRow::from_record) {
        if row.task.is_empty() {
            continue;
        }
        map.insert(row.task, row.responsibility_options);
    }
    map
}

/// taskProduct → tasks that list it as an output (first-seen order, deduplicated).
pub fn task_product_producers(tasks: &RecordBatch) -> RelationshipMap {
    let mut map = RelationshipMap::new();
    for row in tasks.records.iter().map(TaskRow::from_record) {
        if row.task.is_empty() {
            continue;
        }
        for output in &row.outputs {
            let producers = map.entry(output.clone()).or_default();
            if !producers.contains(&row.task) {
                producers.push(row.task.clone());
            }
        }
    }
    map
}

/// taskProduct → its enhancement order.
pub fn task_product_enhancements(task_products: &RecordBatch) -> RelationshipMap {
    let mut map = RelationshipMap::new();
    for row in task_products.records.iter().map(TaskProductRow::from_record) {
        if row.task_product.is_empty() {
            continue;
        }
        map.insert(row.task_product, row.enhancement_order);
    }
    map
}

pub fn build_relationships(task_products: &RecordBatch, tasks: &RecordBatch) -> Relationships {
    Relationships {
        task_responsibilities: task_responsibilities(tasks),
        task_product_producers: task_product_producers(tasks),
        task_product_enhancements: task_product_enhancements(task_products),
    }
}

/// Service name → what the row specifies (raw compound text, blanks as `None`).
pub fn service_specifications(services: &RecordBatch) -> BTreeMap<String, ServiceSpecification> {
    let mut specs = BTreeMap::new();
    for record in &services.records {
        let Some(service) = record.text(SERVICE) else {
            continue;
        };
        specs.insert(
            service,
            ServiceSpecification {
                task_product: record.text(TASK_PRODUCT),
                enhancement: record.text(ENHANCEMENT),
                responsibility: record.text(RESPONSIBILITY_SPECIFICATION),
                transformation: record.text(TRANSFORMATION_SPECIFICATION),
                enhancement_medium: record.text(ENHANCEMENT_MEDIUM_SPECIFICATION),
            },
        );
    }
    specs
}
