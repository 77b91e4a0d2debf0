//! Record ingestion for Lexicon
//!
//! Two halves:
//! - `codec`: the structural codec between nested records and flat,
//!   spreadsheet-compatible rows (`flatten` / `unflatten`)
//! - `source`: turning raw JSON payloads and header/row tables into
//!   `RecordBatch`es, with parse vs structural failures kept apart
//!
//! The codec is deliberately asymmetric: `flatten` introduces dotted paths for
//! nested records, `unflatten` only restores registered array fields. Dotted
//! keys stay flat on the way back.

pub mod codec;
pub mod source;

pub use codec::{flat_table, flatten, flatten_batch, unflatten, FlatRow, FlatTable};
pub use source::{parse_json_batch, parse_tsv_batch, read_batch, records_from_table, SourceError};
