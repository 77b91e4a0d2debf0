//! Lexicon knowledge store
//!
//! A single JSON document on disk:
//!
//! ```text
//! {
//!   "<field>": ["sorted", "unique", "values"],      // learned option sets
//!   "task_responsibilities":    { task -> [responsibility] },
//!   "taskProduct_producers":    { taskProduct -> [task] },
//!   "taskProduct_enhancements": { taskProduct -> [enhancement] },
//!   "service_specifications":   { service -> ServiceSpecification }
//! }
//! ```
//!
//! ## Guarantees
//!
//! - **Monotonic**: `learn` only ever unions into a field's set until `reset`.
//! - **Wholesale derived state**: relationship maps and service specifications
//!   are replaced, never merged.
//! - **Crash-consistent**: every mutation rewrites the full document through a
//!   temp file + rename, so a crash leaves the previous or the next document.
//! - **Forgiving reads**: a missing or unparseable document loads as empty.
//!
//! Single process, single writer. There is no locking protocol.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use lexicon_model::fields::{
    normalized_alias, ENHANCEMENT_MEDIUM_SPECIFICATION, RESPONSIBILITY_SPECIFICATION,
    TRANSFORMATION_SPECIFICATION,
};


// ============================================================================
// Document
// ============================================================================

/// name -> related names
pub type RelationshipMap = BTreeMap<String, Vec<String>>;

/// What one service row specifies. Blank cells are `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpecification {
    #[serde(rename = "taskProduct")]
    pub task_product: Option<String>,
    pub enhancement: Option<String>,
    #[serde(rename = "responsibility specification (Task:Responsibility)")]
    pub responsibility: Option<String>,
    #[serde(rename = "transformation specification (taskProduct:task)")]
    pub transformation: Option<String>,
    #[serde(rename = "enhancement medium specification (enhancement:taskProduct)")]
    pub enhancement_medium: Option<String>,
}

impl ServiceSpecification {
    /// Raw compound text by its record field name.
    pub fn compound(&self, field: &str) -> Option<&str> {
        match field {
            RESPONSIBILITY_SPECIFICATION => self.responsibility.as_deref(),
            TRANSFORMATION_SPECIFICATION => self.transformation.as_deref(),
            ENHANCEMENT_MEDIUM_SPECIFICATION => self.enhancement_medium.as_deref(),
            _ => None,
        }
    }
}

/// The three derived graphs, always written together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationships {
    pub task_responsibilities: RelationshipMap,
    pub task_product_producers: RelationshipMap,
    pub task_product_enhancements: RelationshipMap,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_responsibilities: Option<RelationshipMap>,
    #[serde(
        rename = "taskProduct_producers",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub task_product_producers: Option<RelationshipMap>,
    #[serde(
        rename = "taskProduct_enhancements",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub task_product_enhancements: Option<RelationshipMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_specifications: Option<BTreeMap<String, ServiceSpecification>>,
    /// Learned option sets, keyed by field name.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Vec<String>>,
}

impl KnowledgeDocument {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
            && self.task_responsibilities.is_none()
            && self.task_product_producers.is_none()
            && self.task_product_enhancements.is_none()
            && self.service_specifications.is_none()
    }

    /// Learned options for `field`, falling back to its hyphen-to-underscore
    /// alias. An empty set counts as "nothing learned yet".
    pub fn options(&self, field: &str) -> Option<&[String]> {
        let learned = |name: &str| {
            self.fields
                .get(name)
                .filter(|values| !values.is_empty())
                .map(Vec::as_slice)
        };
        learned(field).or_else(|| normalized_alias(field).and_then(|alias| learned(&alias)))
    }

    pub fn knows(&self, field: &str, value: &str) -> bool {
        self.options(field)
            .is_some_and(|options| options.iter().any(|o| o == value))
    }

    /// Union `values` into `field`'s set. Returns how many were new.
    pub fn merge_values<I, S>(&mut self, field: &str, values: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut merged: BTreeSet<String> = self
            .fields
            .remove(field)
            .unwrap_or_default()
            .into_iter()
            .collect();
        let before = merged.len();
        merged.extend(values.into_iter().map(Into::into));
        let added = merged.len() - before;
        self.fields
            .insert(field.to_string(), merged.into_iter().collect());
        added
    }

    /// Sort and deduplicate every option set. Documents written by hand or by
    /// other tools are not guaranteed to be in canonical form.
    pub fn normalize(&mut self) {
        for values in self.fields.values_mut() {
            values.sort();
            values.dedup();
        }
    }

    pub fn set_relationships(&mut self, relationships: Relationships) {
        self.task_responsibilities = Some(relationships.task_responsibilities);
        self.task_product_producers = Some(relationships.task_product_producers);
        self.task_product_enhancements = Some(relationships.task_product_enhancements);
    }
}

// ============================================================================
// Store
// ============================================================================

/// Handle on the on-disk document. Every call re-reads and rewrites it.
#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    path: PathBuf,
}

impl KnowledgeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncate to an empty document. Used once at the start of a run.
    pub fn reset(&self) -> Result<()> {
        self.save(&KnowledgeDocument::default())?;
        tracing::info!(path = %self.path.display(), "knowledge store reset");
        Ok(())
    }

    /// Current document. Missing or corrupt content loads as empty; only real
    /// I/O failures are errors.
    pub fn load(&self) -> Result<KnowledgeDocument> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(KnowledgeDocument::default()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read knowledge store {}", self.path.display())
                })
            }
        };

        match serde_json::from_str::<KnowledgeDocument>(&text) {
            Ok(mut doc) => {
                doc.normalize();
                Ok(doc)
            }
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "knowledge store is not a valid document; treating as empty"
                );
                Ok(KnowledgeDocument::default())
            }
        }
    }

    /// Union `values` into `field`'s learned set and persist.
    pub fn learn<I, S>(&self, field: &str, values: I) -> Result<KnowledgeDocument>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut doc = self.load()?;
        let added = doc.merge_values(field, values);
        self.save(&doc)?;
        tracing::debug!(
            field,
            added,
            total = doc.fields.get(field).map_or(0, Vec::len),
            "learned field values"
        );
        Ok(doc)
    }

    /// Replace all three relationship maps.
    pub fn set_relationships(&self, relationships: Relationships) -> Result<KnowledgeDocument> {
        let mut doc = self.load()?;
        tracing::debug!(
            tasks = relationships.task_responsibilities.len(),
            producers = relationships.task_product_producers.len(),
            enhancements = relationships.task_product_enhancements.len(),
            "storing relationship maps"
        );
        doc.set_relationships(relationships);
        self.save(&doc)?;
        Ok(doc)
    }

    /// Replace the service-specification map.
    pub fn set_service_specifications(
        &self,
        specs: BTreeMap<String, ServiceSpecification>,
    ) -> Result<KnowledgeDocument> {
        let mut doc = self.load()?;
        tracing::debug!(services = specs.len(), "storing service specifications");
        doc.service_specifications = Some(specs);
        self.save(&doc)?;
        Ok(doc)
    }

    fn save(&self, doc: &KnowledgeDocument) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}
