//! Lexicon CLI
//!
//! Command-line interface for:
//! - Running the phase-ordered learning pipeline over a dataset directory
//! - Flattening / un-flattening record batches
//! - Validating one batch against an existing knowledge store
//! - Inspecting the knowledge store and the suggestion engine

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use lexicon_ingest::{flat_table, flatten_batch, read_batch, unflatten, FlatRow};
use lexicon_learn::{DatasetOutcome, FileSource, JsonDirSink, Pipeline, RunReport};
use lexicon_model::Record;
use lexicon_storage::KnowledgeStore;
use lexicon_validate::{suggest, Emphasis, ValidationReport, Validator};

mod config;

#[derive(Parser)]
#[command(name = "lexicon")]
#[command(
    author,
    version,
    about = "Lexicon: learn valid field values from ordered datasets and validate against them"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every phase: parse, validate, learn, convert, relate.
    ///
    /// The knowledge store is reset at the start of each run.
    Run {
        /// Pipeline config (TOML). Defaults to the built-in phase table.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory that relative dataset/store/output paths resolve against
        #[arg(short, long)]
        dir: Option<PathBuf>,
        /// Print the run report as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Flatten a JSON batch into single-level rows
    Flatten {
        /// Input JSON (array of objects, or one object)
        input: PathBuf,
        /// Emit a tab-separated table instead of JSON
        #[arg(long)]
        tsv: bool,
    },

    /// Decode registered array fields of flat rows back into sequences
    Unflatten {
        /// Input JSON (array of flat objects)
        input: PathBuf,
    },

    /// Validate one batch against an existing knowledge store (nothing is learned)
    Validate {
        /// Dataset id the batch belongs to (e.g. `services`)
        dataset: String,
        /// Input file (`.json`, or `.tsv` for tabular data)
        input: PathBuf,
        /// Knowledge store document
        #[arg(short, long, default_value = "knowledge.json")]
        store: PathBuf,
        /// Raw tasks batch for the enhancement:taskProduct cross-check. Without it,
        /// every enhancement medium specification is reported as unmatched.
        #[arg(long)]
        tasks: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rank candidates by edit distance to a value
    Suggest {
        value: String,
        #[arg(required = true)]
        candidates: Vec<String>,
        /// Maximum number of suggestions
        #[arg(short = 'k', long, default_value_t = lexicon_validate::DEFAULT_LIMIT)]
        limit: usize,
    },

    /// Knowledge store commands
    Store {
        #[command(subcommand)]
        command: StoreCommands,
    },
}

#[derive(Subcommand)]
enum StoreCommands {
    /// Print the store document, or one field's learned options
    Show {
        #[arg(short, long, default_value = "knowledge.json")]
        store: PathBuf,
        #[arg(short, long)]
        field: Option<String>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ok = match cli.command {
        Commands::Run { config, dir, json } => cmd_run(config.as_deref(), dir.as_deref(), json)?,
        Commands::Flatten { input, tsv } => cmd_flatten(&input, tsv)?,
        Commands::Unflatten { input } => cmd_unflatten(&input)?,
        Commands::Validate {
            dataset,
            input,
            store,
            tasks,
            json,
        } => cmd_validate(&dataset, &input, &store, tasks.as_deref(), json)?,
        Commands::Suggest {
            value,
            candidates,
            limit,
        } => cmd_suggest(&value, &candidates, limit),
        Commands::Store { command } => match command {
            StoreCommands::Show { store, field } => cmd_store_show(&store, field.as_deref())?,
        },
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ============================================================================
// run
// ============================================================================

fn cmd_run(config: Option<&Path>, dir: Option<&Path>, json: bool) -> Result<bool> {
    let config = config::load_config(config, dir)?;
    let store = KnowledgeStore::new(&config.store);
    let mut sink = JsonDirSink::new(&config.output_dir);
    let pipeline = Pipeline::new(config.phases.clone(), store);

    let report = pipeline.run(&mut FileSource, &mut sink)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_run_report(&report, &sink)?;
        eprintln!(
            "{} {}",
            "store".cyan().bold(),
            config.store.display().to_string().bold()
        );
    }
    Ok(report.is_success())
}

fn print_run_report(report: &RunReport, sink: &JsonDirSink) -> Result<()> {
    for dataset in &report.datasets {
        match &dataset.outcome {
            DatasetOutcome::Converted { rows } => {
                println!(
                    "{} {} ({} rows) {} {}",
                    "ok".green().bold(),
                    dataset.dataset.bold(),
                    rows,
                    "→".cyan(),
                    sink.path_for(&dataset.dataset).display()
                );
                for derived in &dataset.derived {
                    println!("  {} {}", "→".yellow(), derived);
                }
            }
            DatasetOutcome::Unreadable { message }
            | DatasetOutcome::ParseFailed { message }
            | DatasetOutcome::StructuralFailed { message } => {
                println!("{} {}: {}", "fail".red().bold(), dataset.dataset.bold(), message);
            }
            DatasetOutcome::ValidationFailed { report } => {
                println!(
                    "{} {} ({} records)",
                    "fail".red().bold(),
                    dataset.dataset.bold(),
                    dataset.records
                );
                print_validation_report(report)?;
            }
        }
    }

    let summary = format!(
        "{} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
    if report.is_success() {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.red());
    }
    Ok(())
}

fn print_validation_report(report: &ValidationReport) -> Result<()> {
    let mut text = String::new();
    report.render_with(&mut text, |emphasis, part| match emphasis {
        Emphasis::Heading => part.red().bold().to_string(),
        Emphasis::Field => part.bold().to_string(),
        Emphasis::Value => part.red().to_string(),
        Emphasis::Hint => part.yellow().to_string(),
    })?;
    print!("{text}");
    Ok(())
}

// ============================================================================
// codec
// ============================================================================

fn cmd_flatten(input: &Path, tsv: bool) -> Result<bool> {
    let batch = read_batch(&dataset_name(input), input)?;
    let rows = flatten_batch(&batch);

    if tsv {
        let table = flat_table(&rows);
        println!("{}", table.headers.join("\t"));
        for row in &table.rows {
            println!("{}", row.join("\t"));
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    }
    eprintln!("{} {} rows", "flattened".green().bold(), rows.len());
    Ok(true)
}

fn cmd_unflatten(input: &Path) -> Result<bool> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let rows: Vec<FlatRow> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not an array of flat objects", input.display()))?;
    let records: Vec<Record> = rows.iter().map(unflatten).collect();
    println!("{}", serde_json::to_string_pretty(&records)?);
    eprintln!("{} {} rows", "unflattened".green().bold(), records.len());
    Ok(true)
}

/// File stem, used as the dataset id in error messages.
fn dataset_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string())
}

// ============================================================================
// validate / suggest
// ============================================================================

fn cmd_validate(
    dataset: &str,
    input: &Path,
    store: &Path,
    tasks: Option<&Path>,
    json: bool,
) -> Result<bool> {
    let batch = read_batch(dataset, input)?;
    let knowledge = KnowledgeStore::new(store).load()?;
    if knowledge.is_empty() {
        eprintln!(
            "{} knowledge store {} is empty; nothing is constrained",
            "info:".yellow().bold(),
            store.display()
        );
    }

    let tasks_batch = tasks
        .map(|path| read_batch(lexicon_model::fields::DATASET_TASKS, path))
        .transpose()?;
    let mut validator = Validator::new(&knowledge);
    if let Some(tasks_batch) = &tasks_batch {
        validator = validator.with_tasks(tasks_batch);
    }
    let report = ValidationReport::new(dataset, validator.validate(&batch));

    if json {
        println!("{}", report.to_json_pretty()?);
    } else if report.is_ok() {
        println!(
            "{} {} ({} records)",
            "ok".green().bold(),
            dataset.bold(),
            batch.len()
        );
    } else {
        print_validation_report(&report)?;
    }
    Ok(report.is_ok())
}

fn cmd_suggest(value: &str, candidates: &[String], limit: usize) -> bool {
    let suggestions = suggest(value, candidates, limit);
    if suggestions.is_empty() {
        println!(
            "{} no candidate within distance {}",
            "info:".yellow().bold(),
            lexicon_validate::MAX_DISTANCE
        );
        return false;
    }
    for s in suggestions {
        println!("{} ({})", s.candidate.bold(), s.distance);
    }
    true
}

// ============================================================================
// store
// ============================================================================

fn cmd_store_show(store: &Path, field: Option<&str>) -> Result<bool> {
    let doc = KnowledgeStore::new(store).load()?;
    match field {
        Some(field) => {
            let options = doc
                .options(field)
                .ok_or_else(|| anyhow!("no options learned for `{field}` in {}", store.display()))?;
            for option in options {
                println!("{option}");
            }
        }
        None => println!("{}", serde_json::to_string_pretty(&doc)?),
    }
    Ok(true)
}
