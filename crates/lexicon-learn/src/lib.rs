//! Learning pipeline for Lexicon
//!
//! ```text
//!   source ──► parse ──► validate ──► learn ──► convert ──► relate
//!                           │           │          │          │
//!                    KnowledgeDocument  │      RowSink        │
//!                       (snapshot)      └── KnowledgeStore ◄──┘
//! ```
//!
//! Phases run strictly in configured order. A dataset that fails to load or
//! validate is reported and skipped; the store is left exactly as it was.
//! Only store/sink I/O failures abort a run.

pub mod io;
pub mod pipeline;
pub mod relations;

pub use io::{DatasetSource, FileSource, JsonDirSink, MemorySink, MemorySource, RowSink};
pub use pipeline::{DatasetOutcome, DatasetReport, Pipeline, RunReport};
pub use relations::{
    build_relationships, service_specifications, task_product_enhancements,
    task_product_producers, task_responsibilities,
};
