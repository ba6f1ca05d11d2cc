//! Core traits for pluggable matching
//!
//! The reconciliation engine depends on the scorer only through this trait,
//! which lets tests observe how often (and on which pairs) scoring happens.

use crate::types::{MatchScore, Transaction};

/// Trait for scoring one candidate pair
///
/// Implementations must be pure: the same inputs always yield the same score
/// and `score.total` equals the sum of `score.components`.
pub trait MatchScorer {
    /// Compare two transactions and classify the result
    fn score(&self, first: &Transaction, second: &Transaction) -> MatchScore;
}

impl<S: MatchScorer + ?Sized> MatchScorer for &S {
    fn score(&self, first: &Transaction, second: &Transaction) -> MatchScore {
        (**self).score(first, second)
    }
}
