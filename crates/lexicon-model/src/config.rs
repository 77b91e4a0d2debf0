//! Pipeline configuration.
//!
//! The phase table is ordered: validation and relationship building for a
//! phase only see what earlier phases learned.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::fields::{
    DATASET_SERVICES, DATASET_TASKS, DATASET_TASK_PRODUCTS, ENHANCEMENT, ENHANCEMENT_ORDER,
    RESPONSIBILITY_OPTIONS, SERVICE, TASK, TASK_PRODUCT,
};

/// One dataset's processing step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub dataset: String,
    /// Input file for the dataset. Defaults to `<dataset>.json`.
    #[serde(default)]
    pub source: Option<PathBuf>,
    /// Fields whose unique values are learned after the dataset passes.
    #[serde(default)]
    pub learn: Vec<String>,
    #[serde(default)]
    pub validate: bool,
}

impl Phase {
    pub fn new(dataset: &str, learn: &[&str], validate: bool) -> Self {
        Self {
            dataset: dataset.to_string(),
            source: None,
            learn: learn.iter().map(|f| f.to_string()).collect(),
            validate,
        }
    }

    pub fn source_path(&self) -> PathBuf {
        self.source
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.json", self.dataset)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Knowledge-store document.
    pub store: PathBuf,
    /// Directory that receives one flat-row file per converted dataset.
    pub output_dir: PathBuf,
    pub phases: Vec<Phase>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            store: PathBuf::from("knowledge.json"),
            output_dir: PathBuf::from("out"),
            phases: default_phases(),
        }
    }
}

impl PipelineConfig {
    pub fn phase(&self, dataset: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.dataset == dataset)
    }

    /// Resolve relative paths against `base` (usually the config file's directory).
    pub fn resolve_paths(mut self, base: &std::path::Path) -> Self {
        let join = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        self.store = join(self.store);
        self.output_dir = join(self.output_dir);
        for phase in &mut self.phases {
            phase.source = Some(join(phase.source_path()));
        }
        self
    }
}

/// task-products, then tasks, then services.
pub fn default_phases() -> Vec<Phase> {
    vec![
        Phase::new(DATASET_TASK_PRODUCTS, &[TASK_PRODUCT, ENHANCEMENT_ORDER], false),
        Phase::new(DATASET_TASKS, &[ENHANCEMENT, RESPONSIBILITY_OPTIONS, TASK], true),
        Phase::new(DATASET_SERVICES, &[SERVICE], true),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn default_phase_table_is_ordered() {
        let config = PipelineConfig::default();
        let order: Vec<&str> = config.phases.iter().map(|p| p.dataset.as_str()).collect();
        assert_eq!(order, vec!["task-products", "tasks", "services"]);
        assert!(!config.phase("task-products").unwrap().validate);
        assert_eq!(
            config.phase("tasks").unwrap().learn,
            vec!["enhancement", "responsibility_options", "task"]
        );
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let mut config = PipelineConfig::default();
        config.phases[2].source = Some(PathBuf::from("/abs/services.json"));
        let config = config.resolve_paths(Path::new("/data"));
        assert_eq!(config.store, PathBuf::from("/data/knowledge.json"));
        assert_eq!(
            config.phases[0].source.as_deref(),
            Some(Path::new("/data/task-products.json"))
        );
        assert_eq!(
            config.phases[2].source.as_deref(),
            Some(Path::new("/abs/services.json"))
        );
    }
}
