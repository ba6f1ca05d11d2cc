//! Asynchronous CSV transaction parser
//!
//! Same contract as the sync reader, driven by csv-async over any
//! `futures::io::AsyncRead`. Used by the ingestion orchestrator so both
//! sources can be parsed concurrently on a tokio runtime.
//!
//! # Design
//!
//! The AsyncReader uses:
//! - csv-async as a plain comma splitter (no quoting, flexible field counts)
//! - tokio-util's compat layer to read tokio files through futures' AsyncRead
//! - a CancellationToken checked before each record, so a parse the caller
//!   no longer waits for stops at the next row boundary
//!
//! # Architecture
//!
//! ```text
//! Source → AsyncReader → ParseOutcome
//!              ↓
//!       csv_format module
//!       (HeaderLayout, TransactionCollector)
//! ```

use crate::io::csv_format::{ParseOutcome, ParserConfig, TransactionCollector};
use crate::io::source::Source;
use crate::types::{ParseError, Transaction};
use csv_async::{AsyncReaderBuilder, ByteRecord};
use futures::io::{AsyncRead, Cursor};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::compat::TokioAsyncReadCompatExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Cancellable async parser for transaction CSV sources
#[derive(Debug, Clone, Default)]
pub struct AsyncReader {
    config: ParserConfig,
    cancel: CancellationToken,
}

impl AsyncReader {
    /// Create an AsyncReader with the given parser configuration
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop parsing once `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Parse a source into its ordered transactions
    pub async fn parse(&self, source: &Source) -> Result<Vec<Transaction>, ParseError> {
        self.parse_outcome(source)
            .await
            .map(|outcome| outcome.transactions)
    }

    /// Parse a source, returning accepted transactions and rejected rows
    pub async fn parse_outcome(&self, source: &Source) -> Result<ParseOutcome, ParseError> {
        let source_name = source.name();
        match source {
            Source::Path(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .map_err(|e| ParseError::Io {
                        message: format!("Failed to open file '{}': {}", path.display(), e),
                    })?;
                let len = file.metadata().await?.len();
                self.config.check_source_size(&source_name, len)?;
                // Wrap tokio file in a compatibility layer for csv-async
                self.parse_reader(file.compat(), &source_name).await
            }
            Source::Bytes { data, .. } => {
                self.config
                    .check_source_size(&source_name, data.len() as u64)?;
                self.parse_reader(Cursor::new(Arc::clone(data)), &source_name)
                    .await
            }
        }
    }

    /// Parse CSV content from any async reader
    ///
    /// Returns [`ParseError::Cancelled`] if the token fires before the last
    /// record has been read.
    pub async fn parse_reader<R>(
        &self,
        reader: R,
        source_name: &str,
    ) -> Result<ParseOutcome, ParseError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let started = Instant::now();
        info!("Starting async CSV parsing for '{}'", source_name);

        let mut reader = AsyncReaderBuilder::new()
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .create_reader(reader);
        let mut record = ByteRecord::new();

        if !self.next_record(&mut reader, &mut record).await? {
            warn!("Source '{}' has no header line", source_name);
            return Err(ParseError::empty_file(source_name));
        }
        let header: Vec<&[u8]> = record.iter().collect();
        let mut collector = TransactionCollector::from_header(source_name, &self.config, &header)?;
        drop(header);

        let mut line = record.position().map(|p| p.line()).unwrap_or(1);
        while self.next_record(&mut reader, &mut record).await? {
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

    async fn next_record<R>(
        &self,
        reader: &mut csv_async::AsyncReader<R>,
        record: &mut ByteRecord,
    ) -> Result<bool, ParseError>
    where
        R: AsyncRead + Unpin + Send,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!("Parsing cancelled");
                Err(ParseError::Cancelled)
            }
            read = reader.read_byte_record(record) => Ok(read?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::csv_format::{ErrorPolicy, FieldPolicy};
    use crate::types::TransactionId;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    const HEADER: &str = "ProfileName,TransactionDate,TransactionAmount,TransactionNarrative,\
                          TransactionDescription,TransactionID,TransactionType,WalletReference";

    /// Reader that never produces data
    struct StalledReader;

    impl AsyncRead for StalledReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut [u8],
        ) -> Poll<std::io::Result<usize>> {
            Poll::Pending
        }
    }

    #[tokio::test]
    async fn test_async_reader_parses_upload() {
        let content = format!(
            "{}\n\
             Card Campaign,2014-01-11 22:27:44,-20000,*MOLEPS ATM25,DEDUCT,T1,1,W1\n\
             Card Campaign,2014-01-11 22:39:11,-10000,*MOGODITSHANE2,DEDUCT,T2,0,W2\n",
            HEADER
        );
        let source = Source::bytes("upload.csv", content.into_bytes());

        let transactions = AsyncReader::default().parse(&source).await.unwrap();

        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].transaction_id, Some(TransactionId::new("T1")));
        assert_eq!(transactions[1].transaction_amount, Some(-10000.0));
    }

    #[tokio::test]
    async fn test_async_reader_matches_sync_reader_on_file() {
        use crate::io::sync_reader::SyncReader;
        use std::io::Write;

        let content = format!(
            "{}\n\
             a,2014-01-11 22:27:44,1.5,n,d,T1,0,w\n\
             \n\
             b,not a date,abc,n,d,T2,9,w\n\
             c,2014-01-12 00:00:00\n",
            HEADER
        );
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        let source = Source::path(file.path());

        let expected = SyncReader::default().parse(&source).unwrap();
        let actual = AsyncReader::default().parse(&source).await.unwrap();

        assert_eq!(actual.len(), 3);
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_async_reader_reports_row_failure_line() {
        let content = format!("{}\na,,1,,,T1,0,w\nb,,1,,,T2,X,w\n", HEADER);
        let config = ParserConfig::default().with_field_policy(FieldPolicy::Strict);

        let error = AsyncReader::new(config)
            .parse(&Source::bytes("upload.csv", content.into_bytes()))
            .await
            .unwrap_err();

        assert_eq!(error.line(), Some(3));
    }

    #[tokio::test]
    async fn test_async_reader_collects_rejected_rows() {
        let content = format!("{}\na,,x,,,T1,0,w\nb,,1,,,T2,0,w\n", HEADER);
        let config = ParserConfig::default()
            .with_field_policy(FieldPolicy::Strict)
            .with_error_policy(ErrorPolicy::CollectAndContinue);

        let outcome = AsyncReader::new(config)
            .parse_outcome(&Source::bytes("upload.csv", content.into_bytes()))
            .await
            .unwrap();

        assert_eq!(outcome.transactions.len(), 1);
        assert_eq!(outcome.rejected.len(), 1);
    }

    #[tokio::test]
    async fn test_async_reader_empty_and_missing_sources() {
        let reader = AsyncReader::default();

        assert_eq!(
            reader.parse(&Source::bytes("empty.csv", Vec::<u8>::new())).await,
            Err(ParseError::empty_file("empty.csv"))
        );
        assert!(matches!(
            reader.parse(&Source::path("nonexistent.csv")).await,
            Err(ParseError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_async_reader_stops_when_cancelled() {
        let cancel = CancellationToken::new();
        let reader = AsyncReader::default().with_cancellation(cancel.clone());
        cancel.cancel();

        let result = reader.parse_reader(StalledReader, "stalled.csv").await;

        assert_eq!(result, Err(ParseError::Cancelled));
    }
}
