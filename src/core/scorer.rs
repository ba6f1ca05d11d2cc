//! Weighted multi-field match scorer
//!
//! Each field contributes points according to a fixed weight table:
//!
//! | Field            | Exact | Tolerance | Rule                                      |
//! |------------------|-------|-----------|-------------------------------------------|
//! | identifier       | 40    |           | exact string equality                     |
//! | amount           | 25    | 15        | within 1% of the larger magnitude         |
//! | date (day)       | 15    | 8         | within 2 calendar days                    |
//! | wallet reference | 10    |           | case-insensitive trimmed equality         |
//! | narrative        | 5     |           | equality, else Jaro-Winkler >= 0.7        |
//! | description      | 3     |           | same rule as narrative                    |
//! | transaction type | 2     |           | equality                                  |
//! | profile name     | 1     |           | case-insensitive trimmed equality         |
//!
//! Only fields scoring strictly more than zero appear in the component map,
//! and the total is their sum. Every rule is symmetric in its two inputs.

use crate::core::traits::MatchScorer;
use crate::types::{MatchConfidence, MatchScore, ScoreComponent, Transaction};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use tracing::trace;

pub const TRANSACTION_ID_WEIGHT: f64 = 40.0;
pub const AMOUNT_EXACT_WEIGHT: f64 = 25.0;
pub const AMOUNT_TOLERANCE_WEIGHT: f64 = 15.0;
pub const DATE_EXACT_WEIGHT: f64 = 15.0;
pub const DATE_TOLERANCE_WEIGHT: f64 = 8.0;
pub const WALLET_REFERENCE_WEIGHT: f64 = 10.0;
pub const NARRATIVE_WEIGHT: f64 = 5.0;
pub const DESCRIPTION_WEIGHT: f64 = 3.0;
pub const TRANSACTION_TYPE_WEIGHT: f64 = 2.0;
pub const PROFILE_NAME_WEIGHT: f64 = 1.0;

/// Relative amount difference still worth partial credit
pub const AMOUNT_TOLERANCE_RATIO: f64 = 0.01;
/// Largest calendar-day difference still worth partial credit
pub const DATE_TOLERANCE_DAYS: i64 = 2;
/// Minimum Jaro-Winkler similarity for fuzzy text credit
pub const SIMILARITY_THRESHOLD: f64 = 0.7;

pub const HIGH_CONFIDENCE_SCORE: f64 = 80.0;
pub const HIGH_CONFIDENCE_WITH_ID_SCORE: f64 = 70.0;
pub const MEDIUM_CONFIDENCE_SCORE: f64 = 50.0;
pub const LOW_CONFIDENCE_SCORE: f64 = 20.0;

const AMOUNT_EPSILON: f64 = 1e-9;

/// Default [`MatchScorer`] implementing the weight table above
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedScorer;

impl WeightedScorer {
    pub fn new() -> Self {
        WeightedScorer
    }
}

impl MatchScorer for WeightedScorer {
    fn score(&self, first: &Transaction, second: &Transaction) -> MatchScore {
        let mut components = BTreeMap::new();
        let mut add = |component: ScoreComponent, points: f64| {
            if points > 0.0 {
                components.insert(component, points);
            }
        };

        add(
            ScoreComponent::TransactionId,
            match (&first.transaction_id, &second.transaction_id) {
                (Some(a), Some(b)) if a == b => TRANSACTION_ID_WEIGHT,
                _ => 0.0,
            },
        );
        add(
            ScoreComponent::Amount,
            amount_points(first.transaction_amount, second.transaction_amount),
        );
        add(
            ScoreComponent::Date,
            date_points(first.transaction_date.as_ref(), second.transaction_date.as_ref()),
        );
        add(
            ScoreComponent::WalletReference,
            equality_points(
                first.wallet_reference.as_deref(),
                second.wallet_reference.as_deref(),
                WALLET_REFERENCE_WEIGHT,
            ),
        );
        add(
            ScoreComponent::Narrative,
            similarity_points(
                first.transaction_narrative.as_deref(),
                second.transaction_narrative.as_deref(),
                NARRATIVE_WEIGHT,
            ),
        );
        add(
            ScoreComponent::Description,
            similarity_points(
                first.transaction_description.as_deref(),
                second.transaction_description.as_deref(),
                DESCRIPTION_WEIGHT,
            ),
        );
        add(
            ScoreComponent::TransactionType,
            match (first.transaction_type, second.transaction_type) {
                (Some(a), Some(b)) if a == b => TRANSACTION_TYPE_WEIGHT,
                _ => 0.0,
            },
        );
        add(
            ScoreComponent::ProfileName,
            equality_points(
                first.profile_name.as_deref(),
                second.profile_name.as_deref(),
                PROFILE_NAME_WEIGHT,
            ),
        );

        let total = components.values().sum();
        let confidence = classify(total, &components);
        let score = MatchScore {
            total,
            confidence,
            components,
        };
        trace!("Scored {:?} against {:?}: {}", first.transaction_id, second.transaction_id, score);
        score
    }
}

/// Derive the confidence tier from the total and the contributing fields
///
/// Rules are evaluated in order; the first that holds wins.
pub fn classify(total: f64, components: &BTreeMap<ScoreComponent, f64>) -> MatchConfidence {
    let has = |component: ScoreComponent| components.contains_key(&component);

    if total >= HIGH_CONFIDENCE_SCORE {
        MatchConfidence::High
    } else if has(ScoreComponent::TransactionId) && total >= HIGH_CONFIDENCE_WITH_ID_SCORE {
        MatchConfidence::High
    } else if total >= MEDIUM_CONFIDENCE_SCORE
        && has(ScoreComponent::Amount)
        && has(ScoreComponent::Date)
    {
        MatchConfidence::Medium
    } else if total >= LOW_CONFIDENCE_SCORE {
        MatchConfidence::Low
    } else {
        MatchConfidence::VeryLow
    }
}

fn amount_points(first: Option<f64>, second: Option<f64>) -> f64 {
    let (Some(a), Some(b)) = (first, second) else {
        return 0.0;
    };
    if !a.is_finite() || !b.is_finite() {
        return 0.0;
    }

    let diff = (a - b).abs();
    let magnitude = a.abs().max(b.abs());
    if diff <= AMOUNT_EPSILON * magnitude.max(1.0) {
        return AMOUNT_EXACT_WEIGHT;
    }

    let tolerance = magnitude * AMOUNT_TOLERANCE_RATIO;
    if tolerance > 0.0 && diff <= tolerance {
        AMOUNT_TOLERANCE_WEIGHT * (1.0 - diff / tolerance)
    } else {
        0.0
    }
}

fn date_points(first: Option<&DateTime<Local>>, second: Option<&DateTime<Local>>) -> f64 {
    let (Some(a), Some(b)) = (first, second) else {
        return 0.0;
    };

    let day_diff = (a.date_naive() - b.date_naive()).num_days().abs();
    if day_diff == 0 {
        DATE_EXACT_WEIGHT
    } else if day_diff <= DATE_TOLERANCE_DAYS {
        DATE_TOLERANCE_WEIGHT * (1.0 - day_diff as f64 / DATE_TOLERANCE_DAYS as f64)
    } else {
        0.0
    }
}

/// Lower-cased, trimmed text; `None` when absent or blank
fn normalized(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

fn equality_points(first: Option<&str>, second: Option<&str>, weight: f64) -> f64 {
    match (normalized(first), normalized(second)) {
        (Some(a), Some(b)) if a == b => weight,
        _ => 0.0,
    }
}

fn similarity_points(first: Option<&str>, second: Option<&str>, weight: f64) -> f64 {
    let (Some(a), Some(b)) = (normalized(first), normalized(second)) else {
        return 0.0;
    };
    if a == b {
        return weight;
    }

    let similarity = similarity(&a, &b);
    if similarity >= SIMILARITY_THRESHOLD {
        weight * similarity
    } else {
        0.0
    }
}

/// Jaro-Winkler similarity in `[0, 1]`; two empty strings are identical
pub fn similarity(first: &str, second: &str) -> f64 {
    if first.is_empty() && second.is_empty() {
        return 1.0;
    }
    strsim::jaro_winkler(first, second)
}
