//! Reconciliation outcome types

use super::transaction::Transaction;
use serde::Serialize;

/// A candidate pairing that did not produce a confident match
///
/// Either a record with no counterpart in the other source, or a
/// same-identifier pairing whose score fell below the HIGH tier. At least one
/// side is always present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedPair {
    #[serde(rename = "transaction1")]
    left: Option<Transaction>,
    #[serde(rename = "transaction2")]
    right: Option<Transaction>,
}

impl UnmatchedPair {
    /// Record from the first source with no counterpart
    pub fn left_only(left: Transaction) -> Self {
        UnmatchedPair {
            left: Some(left),
            right: None,
        }
    }

    /// Record from the second source with no counterpart
    pub fn right_only(right: Transaction) -> Self {
        UnmatchedPair {
            left: None,
            right: Some(right),
        }
    }

    /// Same-identifier pairing rejected by the scorer
    pub fn rejected(left: Transaction, right: Transaction) -> Self {
        UnmatchedPair {
            left: Some(left),
            right: Some(right),
        }
    }

    pub fn left(&self) -> Option<&Transaction> {
        self.left.as_ref()
    }

    pub fn right(&self) -> Option<&Transaction> {
        self.right.as_ref()
    }
}

/// Aggregated result of reconciling two sources
///
/// `unmatched_pairs` holds pairs driven by the first source's identifier
/// groups first, then one pair per record whose identifier only exists in
/// the second source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub total_records_in_file1: usize,
    pub total_records_in_file2: usize,
    pub matched_records: usize,
    pub unmatched_records_in_file1: usize,
    pub unmatched_records_in_file2: usize,
    pub match_percentage: f64,
    #[serde(rename = "unmatchedTransactionPairs")]
    pub unmatched_pairs: Vec<UnmatchedPair>,
}

impl ReconciliationReport {
    /// One-line summary of the counters, used in logs and fixture checks
    pub fn summary(&self) -> String {
        format!(
            "file1={} file2={} matched={} unmatched1={} unmatched2={} pairs={} match={:.2}%",
            self.total_records_in_file1,
            self.total_records_in_file2,
            self.matched_records,
            self.unmatched_records_in_file1,
            self.unmatched_records_in_file2,
            self.unmatched_pairs.len(),
            self.match_percentage,
        )
    }
}
