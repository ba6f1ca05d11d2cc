//! I/O module
//!
//! Handles CSV parsing and report output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (header layout, row decoding, policies, output)
//! - `source` - File and in-memory upload sources
//! - `sync_reader` - Blocking parser
//! - `async_reader` - Cancellable async parser

pub mod async_reader;
pub mod csv_format;
pub mod source;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{
    write_unmatched_csv, DateFormats, ErrorPolicy, FieldPolicy, ParseOutcome, ParserConfig,
};
pub use source::Source;
pub use sync_reader::SyncReader;
