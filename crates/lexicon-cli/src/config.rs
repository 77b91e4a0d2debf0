//! Loading `PipelineConfig` for `lexicon run`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use lexicon_model::PipelineConfig;

/// Config from `--config` (TOML) or the built-in phase table.
///
/// Relative paths resolve against `--dir` when given, otherwise against the
/// config file's directory. Without either they stay relative to the cwd.
pub fn load_config(config: Option<&Path>, dir: Option<&Path>) -> Result<PipelineConfig> {
    let (parsed, config_dir) = match config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            let parsed: PipelineConfig = toml::from_str(&text)
                .with_context(|| format!("invalid config {}", path.display()))?;
            let parent = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf);
            (parsed, parent)
        }
        None => (PipelineConfig::default(), None),
    };

    let base: Option<PathBuf> = dir.map(Path::to_path_buf).or(config_dir);
    let config = match base {
        Some(base) => parsed.resolve_paths(&base),
        None => parsed,
    };
    tracing::debug!(
        store = %config.store.display(),
        output_dir = %config.output_dir.display(),
        phases = config.phases.len(),
        "pipeline config loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_config_file() {
        let config = load_config(None, None).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn dir_resolves_default_sources() {
        let config = load_config(None, Some(Path::new("/data"))).unwrap();
        assert_eq!(config.store, PathBuf::from("/data/knowledge.json"));
        assert_eq!(
            config.phase("tasks").unwrap().source,
            Some(PathBuf::from("/data/tasks.json"))
        );
    }

    #[test]
    fn toml_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.toml");
        fs::write(
            &path,
            r#"
store = "state/knowledge.json"

[[phases]]
dataset = "task-products"
source = "sheets/task-products.tsv"
learn = ["taskProduct"]

[[phases]]
dataset = "tasks"
learn = ["task"]
validate = true
"#,
        )
        .unwrap();

        let config = load_config(Some(&path), None).unwrap();
        assert_eq!(config.store, dir.path().join("state/knowledge.json"));
        assert_eq!(config.output_dir, dir.path().join("out"));
        assert_eq!(config.phases.len(), 2);
        assert_eq!(
            config.phases[0].source,
            Some(dir.path().join("sheets/task-products.tsv"))
        );
        assert_eq!(config.phases[1].source, Some(dir.path().join("tasks.json")));
        assert!(config.phases[1].validate);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.toml");
        fs::write(&path, "phases = 3").unwrap();
        let err = load_config(Some(&path), None).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }
}
