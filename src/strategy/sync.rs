//! Sequential reconciliation strategy
//!
//! Parses the first source, then the second, on the caller's thread, and
//! reconciles them. There is no deadline; a parse runs until it finishes or
//! fails.
//!
//! # Design
//!
//! The SyncStrategy focuses on orchestration, delegating:
//! - CSV parsing to `SyncReader`
//! - Matching and aggregation to `ReconciliationEngine`

use crate::core::ReconciliationEngine;
use crate::io::csv_format::ParserConfig;
use crate::io::source::Source;
use crate::io::sync_reader::SyncReader;
use crate::strategy::ReconcileStrategy;
use crate::types::{ProcessingError, ReconciliationReport, Transaction};
use tracing::{info, warn};

/// Sequential reconciliation strategy
///
/// # Examples
///
/// ```no_run
/// use transaction_reconciler::io::Source;
/// use transaction_reconciler::strategy::{ReconcileStrategy, SyncStrategy};
///
/// let report = SyncStrategy::default()
///     .reconcile(&Source::path("file1.csv"), &Source::path("file2.csv"))
///     .expect("Reconciliation failed");
/// println!("{}", report.summary());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SyncStrategy {
    reader: SyncReader,
}

impl SyncStrategy {
    /// Create a new SyncStrategy with the given parser configuration
    pub fn new(parser: ParserConfig) -> Self {
        Self {
            reader: SyncReader::new(parser),
        }
    }

    fn parse(&self, source: &Source) -> Result<Vec<Transaction>, ProcessingError> {
        let outcome = self
            .reader
            .parse_outcome(source)
            .map_err(|cause| ProcessingError::parse_failure(&source.name(), cause))?;
        if !outcome.rejected.is_empty() {
            warn!(
                "{} rows of '{}' were rejected and left out of reconciliation",
                outcome.rejected.len(),
                source
            );
        }
        Ok(outcome.transactions)
    }
}

impl ReconcileStrategy for SyncStrategy {
    fn reconcile(
        &self,
        first: &Source,
        second: &Source,
    ) -> Result<ReconciliationReport, ProcessingError> {
        info!("Starting sequential reconciliation of '{}' and '{}'", first, second);

        let first_transactions = self.parse(first)?;
        let second_transactions = self.parse(second)?;

        Ok(ReconciliationEngine::new().reconcile(&first_transactions, &second_transactions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::csv_format::{ErrorPolicy, FieldPolicy};
    use crate::types::{ParseError, ProcessingErrorKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "ProfileName,TransactionDate,TransactionAmount,TransactionNarrative,\
                          TransactionDescription,TransactionID,TransactionType,WalletReference";

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_sync_strategy_reconciles_files() {
        let file1 = create_temp_csv(&format!(
            "{}\n\
             Card Campaign,2014-01-11 22:27:44,100.0,n,d,TXN001,1,W1\n\
             Card Campaign,2014-01-12 10:00:00,55.0,n,d,TXN002,1,W1\n",
            HEADER
        ));
        let file2 = create_temp_csv(&format!(
            "{}\nCard Campaign,2014-01-11 08:00:00,100.0,n,d,TXN001,1,W1\n",
            HEADER
        ));

        let report = SyncStrategy::default()
            .reconcile(&Source::path(file1.path()), &Source::path(file2.path()))
            .unwrap();

        assert_eq!(report.total_records_in_file1, 2);
        assert_eq!(report.total_records_in_file2, 1);
        assert_eq!(report.matched_records, 1);
        assert_eq!(report.unmatched_records_in_file1, 1);
        assert_eq!(report.match_percentage, 50.0);
    }

    #[test]
    fn test_sync_strategy_handles_missing_file() {
        let present = Source::bytes("a.csv", format!("{}\n", HEADER).into_bytes());

        let error = SyncStrategy::default()
            .reconcile(&present, &Source::path("nonexistent.csv"))
            .unwrap_err();

        assert_eq!(error.kind(), ProcessingErrorKind::ParseFailure);
        assert!(error.to_string().contains("nonexistent.csv"));
    }

    #[test]
    fn test_sync_strategy_collect_policy_drops_rejected_rows() {
        let content = format!("{}\np,,1,,,T1,0,w\np,,1,,,T2,5,w\n", HEADER);
        let source = Source::bytes("a.csv", content.into_bytes());
        let parser = ParserConfig::default()
            .with_field_policy(FieldPolicy::Strict)
            .with_error_policy(ErrorPolicy::CollectAndContinue);

        let report = SyncStrategy::new(parser).reconcile(&source, &source).unwrap();

        assert_eq!(report.total_records_in_file1, 1);
        assert_eq!(report.total_records_in_file2, 1);
    }

    #[test]
    fn test_sync_strategy_abort_policy_fails_whole_source() {
        let content = format!("{}\np,,1,,,T1,0,w\np,,1,,,T2,5,w\n", HEADER);
        let source = Source::bytes("a.csv", content.into_bytes());
        let parser = ParserConfig::default().with_field_policy(FieldPolicy::Strict);

        let error = SyncStrategy::new(parser).reconcile(&source, &source).unwrap_err();

        match error {
            ProcessingError::ParseFailure { source_name, cause } => {
                assert_eq!(source_name, "a.csv");
                assert_eq!(cause.line(), Some(3));
                assert!(matches!(cause, ParseError::LineParsing { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
