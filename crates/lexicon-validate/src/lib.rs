//! Validation against learned knowledge
//!
//! - `suggest`: case-insensitive edit-distance ranking of candidate corrections
//! - `validator`: simple-field and compound-specification checks of a batch
//!   against a `KnowledgeDocument` snapshot (plus the raw tasks batch for the
//!   enhancement/task cross-reference)
//! - `report`: errors paired with ranked suggestions, renderable as text or JSON
//!
//! Validation never mutates its inputs.

pub mod report;
pub mod suggest;
pub mod validator;

pub use report::{Emphasis, ReportedError, ValidationReport};
pub use suggest::{edit_distance, suggest, Suggestion, DEFAULT_LIMIT, MAX_DISTANCE};
pub use validator::{ErrorKind, ValidationError, Validator};
