//! Synchronous CSV transaction parser
//!
//! Reads a header line followed by data lines and produces the ordered
//! sequence of transactions. Delegates all format concerns (header layout,
//! cell decoding, error policy) to the csv_format module.
//!
//! # Design
//!
//! The csv reader is configured as a plain comma splitter: no header
//! handling, no quoting, flexible field counts. The first record is the
//! header; every following record is handed to a
//! [`TransactionCollector`] together with its physical line number.
//!
//! ```no_run
//! use transaction_reconciler::io::{Source, SyncReader};
//!
//! let reader = SyncReader::default();
//! let transactions = reader.parse(&Source::path("file1.csv")).unwrap();
//! println!("Parsed {} transactions", transactions.len());
//! ```
//!
//! # Error Handling
//!
//! - Missing file, oversize or empty source fail before any row is read
//! - Row failures carry the 1-based line number (header is line 1)
//! - Whether a row failure aborts the source depends on the
//!   [`ErrorPolicy`](crate::io::csv_format::ErrorPolicy)

use crate::io::csv_format::{ParseOutcome, ParserConfig, TransactionCollector};
use crate::io::source::Source;
use crate::types::{ParseError, Transaction};
use csv::{ByteRecord, ReaderBuilder};
use std::fs::File;
use std::io::Read;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Blocking parser for transaction CSV sources
#[derive(Debug, Clone, Default)]
pub struct SyncReader {
    config: ParserConfig,
}

impl SyncReader {
    /// Create a SyncReader with the given parser configuration
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a source into its ordered transactions
    ///
    /// Rows rejected under the collect policy are dropped from the result;
    /// use [`parse_outcome`](Self::parse_outcome) to see them.
    pub fn parse(&self, source: &Source) -> Result<Vec<Transaction>, ParseError> {
        self.parse_outcome(source).map(|outcome| outcome.transactions)
    }

    /// Parse a source, returning accepted transactions and rejected rows
    ///
    /// # Returns
    ///
    /// * `Ok(ParseOutcome)` - transactions in input order, duplicates kept
    /// * `Err(ParseError)` - the source could not be opened, was empty or
    ///   oversize, had a bad header, or (abort policy) a row failed
    pub fn parse_outcome(&self, source: &Source) -> Result<ParseOutcome, ParseError> {
        let source_name = source.name();
        match source {
            Source::Path(path) => {
                let file = File::open(path).map_err(|e| ParseError::Io {
                    message: format!("Failed to open file '{}': {}", path.display(), e),
                })?;
                let len = file.metadata()?.len();
                self.config.check_source_size(&source_name, len)?;
                self.parse_reader(file, &source_name)
            }
            Source::Bytes { data, .. } => {
                self.config
                    .check_source_size(&source_name, data.len() as u64)?;
                self.parse_reader(&data[..], &source_name)
            }
        }
    }

    /// Parse CSV content from any reader
    ///
    /// No size guard is applied here; callers handing in raw readers are
    /// responsible for bounding them.
    pub fn parse_reader<R: Read>(
        &self,
        reader: R,
        source_name: &str,
    ) -> Result<ParseOutcome, ParseError> {
        let started = Instant::now();
        info!("Starting CSV parsing for '{}'", source_name);

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(reader);
        let mut record = ByteRecord::new();

        if !reader.read_byte_record(&mut record)? {
            warn!("Source '{}' has no header line", source_name);
            return Err(ParseError::empty_file(source_name));
        }
        let header: Vec<&[u8]> = record.iter().collect();
        let mut collector = TransactionCollector::from_header(source_name, &self.config, &header)?;
        drop(header);

        let mut line = record.position().map(|p| p.line()).unwrap_or(1);
        while reader.read_byte_record(&mut record)? {
            line = record.position().map(|p| p.line()).unwrap_or(line + 1);
            let cells: Vec<&[u8]> = record.iter().collect();
            collector.push_row(&cells, line)?;
        }

        let outcome = collector.finish();
        debug!(
            "Parsed '{}' in {:?} ({} lines read)",
            source_name,
            started.elapsed(),
            line
        );
        Ok(outcome)
    }
}
