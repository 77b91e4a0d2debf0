//! Lexicon data model
//!
//! Shared vocabulary for every other crate in the workspace:
//! - `fields`: the fixed field-name registry (array fields, validated fields,
//!   compound fields, reserved store keys, dataset identifiers)
//! - `record`: the open, ordered `Record` mapping plus the batch it travels in
//! - `compound`: eager parsing of `"left: right"` compound specifications
//! - `rows`: typed per-dataset views built from a `Record` at the boundary
//! - `config`: phase table and pipeline configuration
//!
//! Field semantics are fixed here; configuration only decides which dataset is
//! read from where, and in which order.

pub mod compound;
pub mod config;
pub mod fields;
pub mod record;
pub mod rows;

pub use compound::{CompoundKind, CompoundParseError, CompoundSpec};
pub use config::{Phase, PipelineConfig};
pub use record::{Record, RecordBatch, SourceKind};
pub use rows::{ServiceRow, TaskProductRow, TaskRow};
