//! Reconciliation engine
//!
//! Groups both transaction sequences by identifier, pairs same-identifier
//! candidates positionally, scores each pair and aggregates the report.
//!
//! The engine enforces these rules:
//! - Groups keep insertion order; identifiers are visited in first-seen order
//! - Groups with different sizes on the two sides are never scored; only the
//!   first side's members are reported as unmatched
//! - Only HIGH confidence counts as a match
//! - Identifiers unique to the second side are reported after everything else

use crate::core::scorer::WeightedScorer;
use crate::core::traits::MatchScorer;
use crate::types::{
    MatchConfidence, ReconciliationReport, Transaction, TransactionId, UnmatchedPair,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Match rate below which the summary is logged as a warning
const LOW_MATCH_RATE: f64 = 50.0;

/// Transactions grouped by identifier in first-seen order
struct IdGroups<'a> {
    groups: Vec<(Option<&'a TransactionId>, Vec<&'a Transaction>)>,
    index: HashMap<Option<&'a TransactionId>, usize>,
}

impl<'a> IdGroups<'a> {
    fn new(transactions: &'a [Transaction]) -> Self {
        let mut groups: Vec<(Option<&TransactionId>, Vec<&Transaction>)> = Vec::new();
        let mut index = HashMap::new();

        for tx in transactions {
            let key = tx.transaction_id.as_ref();
            let position = *index.entry(key).or_insert_with(|| {
                groups.push((key, Vec::new()));
                groups.len() - 1
            });
            groups[position].1.push(tx);
        }

        Self { groups, index }
    }

    fn get(&self, key: Option<&TransactionId>) -> Option<&[&'a Transaction]> {
        self.index
            .get(&key)
            .and_then(|&position| self.groups.get(position))
            .map(|(_, members)| members.as_slice())
    }

    fn contains(&self, key: Option<&TransactionId>) -> bool {
        self.index.contains_key(&key)
    }
}

/// Reconciliation engine
///
/// Generic over the scorer so tests can substitute an instrumented one.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine<S = WeightedScorer> {
    scorer: S,
}

impl ReconciliationEngine<WeightedScorer> {
    /// Create an engine using the weighted multi-field scorer
    pub fn new() -> Self {
        Self::with_scorer(WeightedScorer)
    }
}

impl<S: MatchScorer> ReconciliationEngine<S> {
    /// Create an engine using a custom scorer
    pub fn with_scorer(scorer: S) -> Self {
        ReconciliationEngine { scorer }
    }

    /// Reconcile the transactions of two sources
    ///
    /// # Arguments
    ///
    /// * `first` - Transactions of the first source, in input order
    /// * `second` - Transactions of the second source, in input order
    ///
    /// # Returns
    ///
    /// The aggregated report. Unmatched pairs driven by the first source come
    /// first, followed by one pair per record whose identifier exists only in
    /// the second source.
    pub fn reconcile(&self, first: &[Transaction], second: &[Transaction]) -> ReconciliationReport {
        info!(
            "Starting reconciliation - File1: {} records, File2: {} records",
            first.len(),
            second.len()
        );

        let left = IdGroups::new(first);
        let right = IdGroups::new(second);
        debug!(
            "Grouped into {} identifiers in file1 and {} in file2",
            left.groups.len(),
            right.groups.len()
        );

        let mut matched_records = 0;
        let mut unmatched_pairs = Vec::new();

        for (key, members) in &left.groups {
            match right.get(*key) {
                None => {
                    debug!("Transaction {:?} only in file1 ({} records)", key, members.len());
                    unmatched_pairs.extend(
                        members.iter().map(|tx| UnmatchedPair::left_only((*tx).clone())),
                    );
                }
                Some(others) if others.len() != members.len() => {
                    debug!(
                        "Transaction {:?} has {} records in file1 but {} in file2",
                        key,
                        members.len(),
                        others.len()
                    );
                    unmatched_pairs.extend(
                        members.iter().map(|tx| UnmatchedPair::left_only((*tx).clone())),
                    );
                }
                Some(others) => {
                    for (a, b) in members.iter().zip(others.iter()) {
                        let score = self.scorer.score(a, b);
                        if score.confidence == MatchConfidence::High {
                            debug!("Matched {:?}: {}", key, score);
                            matched_records += 1;
                        } else {
                            debug!("Rejected pairing for {:?}: {}", key, score);
                            unmatched_pairs.push(UnmatchedPair::rejected((*a).clone(), (*b).clone()));
                        }
                    }
                }
            }
        }

        for (key, members) in &right.groups {
            if !left.contains(*key) {
                debug!("Transaction {:?} only in file2 ({} records)", key, members.len());
                unmatched_pairs.extend(
                    members.iter().map(|tx| UnmatchedPair::right_only((*tx).clone())),
                );
            }
        }

        let unmatched_records_in_file1 = unmatched_pairs
            .iter()
            .filter(|pair| pair.left().is_some())
            .count();
        let unmatched_records_in_file2 = unmatched_pairs
            .iter()
            .filter(|pair| pair.left().is_none())
            .count();
        let match_percentage = if first.is_empty() {
            0.0
        } else {
            matched_records as f64 / first.len() as f64 * 100.0
        };

        let report = ReconciliationReport {
            total_records_in_file1: first.len(),
            total_records_in_file2: second.len(),
            matched_records,
            unmatched_records_in_file1,
            unmatched_records_in_file2,
            match_percentage,
            unmatched_pairs,
        };
        log_summary(&report);
        report
    }
}

fn log_summary(report: &ReconciliationReport) {
    info!("Reconciliation completed - {}", report.summary());
    if report.total_records_in_file1 > 0 && report.match_percentage < LOW_MATCH_RATE {
        warn!(
            "Low match rate detected: {:.2}% - review the unmatched transactions",
            report.match_percentage
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchScore;
    use chrono::{Local, TimeZone};
    use rstest::rstest;
    use std::cell::RefCell;

    /// Scorer that records every pair it is asked about
    struct RecordingScorer {
        calls: RefCell<Vec<(Option<TransactionId>, Option<TransactionId>)>>,
    }

    impl RecordingScorer {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl MatchScorer for RecordingScorer {
        fn score(&self, first: &Transaction, second: &Transaction) -> MatchScore {
            self.calls
                .borrow_mut()
                .push((first.transaction_id.clone(), second.transaction_id.clone()));
            WeightedScorer.score(first, second)
        }
    }

    fn tx(id: &str, amount: f64) -> Transaction {
        Transaction::builder(id)
            .profile_name("Card Campaign")
            .amount(amount)
            .date(Local.with_ymd_and_hms(2014, 1, 11, 22, 27, 44).unwrap())
            .build()
    }

    #[test]
    fn test_single_matching_pair() {
        let report = ReconciliationEngine::new().reconcile(&[tx("TXN001", 100.0)], &[tx("TXN001", 100.0)]);

        assert_eq!(report.matched_records, 1);
        assert_eq!(report.match_percentage, 100.0);
        assert!(report.unmatched_pairs.is_empty());
        assert_eq!(report.unmatched_records_in_file1, 0);
        assert_eq!(report.unmatched_records_in_file2, 0);
    }

    #[test]
    fn test_identifier_only_in_first_is_never_scored() {
        let scorer = RecordingScorer::new();
        let engine = ReconciliationEngine::with_scorer(&scorer);

        let report = engine.reconcile(&[tx("A", 1.0)], &[tx("B", 1.0)]);

        assert_eq!(scorer.call_count(), 0);
        assert_eq!(
            report.unmatched_pairs,
            vec![
                UnmatchedPair::left_only(tx("A", 1.0)),
                UnmatchedPair::right_only(tx("B", 1.0)),
            ]
        );
        assert_eq!(report.unmatched_records_in_file1, 1);
        assert_eq!(report.unmatched_records_in_file2, 1);
        assert_eq!(report.match_percentage, 0.0);
    }

    #[test]
    fn test_size_mismatch_reports_only_first_side() {
        let scorer = RecordingScorer::new();
        let engine = ReconciliationEngine::with_scorer(&scorer);
        let first = vec![tx("D", 1.0), tx("D", 2.0), tx("D", 3.0)];
        let second = vec![tx("D", 1.0)];

        let report = engine.reconcile(&first, &second);

        assert_eq!(scorer.call_count(), 0);
        assert_eq!(report.total_records_in_file1, 3);
        assert_eq!(report.total_records_in_file2, 1);
        assert_eq!(report.matched_records, 0);
        assert_eq!(report.unmatched_records_in_file1, 3);
        assert_eq!(report.unmatched_records_in_file2, 0);
        assert!(report.unmatched_pairs.iter().all(|pair| pair.right().is_none()));
    }

    #[test]
    fn test_equal_groups_pair_positionally() {
        let scorer = RecordingScorer::new();
        let engine = ReconciliationEngine::with_scorer(&scorer);
        let first = vec![tx("D", 10.0), tx("D", 20.0)];
        let second = vec![tx("D", 20.0), tx("D", 20.0)];

        let report = engine.reconcile(&first, &second);

        assert_eq!(scorer.call_count(), 2);
        // D/10 vs D/20: 40 + 15 + 1 = 56 with no amount credit -> LOW
        assert_eq!(report.matched_records, 1);
        assert_eq!(
            report.unmatched_pairs,
            vec![UnmatchedPair::rejected(tx("D", 10.0), tx("D", 20.0))]
        );
        assert_eq!(report.unmatched_records_in_file1, 1);
        assert_eq!(report.unmatched_records_in_file2, 0);
        assert_eq!(report.match_percentage, 50.0);
    }

    #[test]
    fn test_pairs_ordered_first_side_then_second_only() {
        let first = vec![tx("A", 1.0), tx("B", 1.0), tx("A", 1.0)];
        let second = vec![tx("Z", 1.0), tx("B", 5.0), tx("Y", 1.0), tx("Z", 2.0)];

        let report = ReconciliationEngine::new().reconcile(&first, &second);

        let order: Vec<(Option<&str>, Option<&str>)> = report
            .unmatched_pairs
            .iter()
            .map(|pair| {
                (
                    pair.left().and_then(|t| t.transaction_id.as_ref()).map(|id| id.as_str()),
                    pair.right().and_then(|t| t.transaction_id.as_ref()).map(|id| id.as_str()),
                )
            })
            .collect();
        assert_eq!(
            order,
            vec![
                (Some("A"), None),
                (Some("A"), None),
                (Some("B"), Some("B")),
                (None, Some("Z")),
                (None, Some("Z")),
                (None, Some("Y")),
            ]
        );
        assert_eq!(report.unmatched_records_in_file2, 3);
    }

    #[test]
    fn test_absent_identifiers_form_their_own_group() {
        let anonymous = Transaction::builder("x").amount(1.0).build();
        let anonymous = Transaction {
            transaction_id: None,
            ..anonymous
        };

        let report = ReconciliationEngine::new().reconcile(&[anonymous.clone()], &[anonymous]);

        // 25 for the amount alone is LOW
        assert_eq!(report.matched_records, 0);
        assert_eq!(report.unmatched_pairs.len(), 1);
        assert!(report.unmatched_pairs[0].left().is_some());
        assert!(report.unmatched_pairs[0].right().is_some());
    }

    #[rstest]
    #[case::both_empty(vec![], vec![], 0.0)]
    #[case::first_empty(vec![], vec![tx("A", 1.0)], 0.0)]
    #[case::all_matched(vec![tx("A", 1.0), tx("B", 1.0)], vec![tx("B", 1.0), tx("A", 1.0)], 100.0)]
    fn test_match_percentage(
        #[case] first: Vec<Transaction>,
        #[case] second: Vec<Transaction>,
        #[case] expected: f64,
    ) {
        let report = ReconciliationEngine::new().reconcile(&first, &second);
        assert_eq!(report.match_percentage, expected);
    }

    #[test]
    fn test_counts_add_up_for_equal_groups() {
        let first = vec![tx("A", 1.0), tx("B", 2.0), tx("C", 3.0), tx("C", 4.0)];
        let second = vec![tx("A", 1.0), tx("B", 900.0), tx("C", 3.0), tx("C", 4.0)];

        let report = ReconciliationEngine::new().reconcile(&first, &second);

        assert_eq!(
            report.matched_records + report.unmatched_records_in_file1,
            report.total_records_in_file1
        );
        assert_eq!(report.matched_records, 3);
    }
}
