//! Lexicon workspace facade.
//!
//! Re-exports the member crates so the workspace-level integration tests (and
//! embedders that want everything) can depend on a single package.

pub use lexicon_ingest as ingest;
pub use lexicon_learn as learn;
pub use lexicon_model as model;
pub use lexicon_storage as storage;
pub use lexicon_validate as validate;
