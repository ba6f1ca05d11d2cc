//! Match score types
//!
//! A [`MatchScore`] is the explainable result of comparing two transactions:
//! the points each field contributed, their sum, and the confidence tier
//! derived from both.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Field that can contribute points to a match score
///
/// Serialized with the CSV header name of the field it scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ScoreComponent {
    #[serde(rename = "TransactionID")]
    TransactionId,
    #[serde(rename = "TransactionAmount")]
    Amount,
    #[serde(rename = "TransactionDate")]
    Date,
    #[serde(rename = "WalletReference")]
    WalletReference,
    #[serde(rename = "TransactionNarrative")]
    Narrative,
    #[serde(rename = "TransactionDescription")]
    Description,
    #[serde(rename = "TransactionType")]
    TransactionType,
    #[serde(rename = "ProfileName")]
    ProfileName,
}

impl ScoreComponent {
    /// CSV header name of the scored field
    pub fn header(&self) -> &'static str {
        match self {
            ScoreComponent::TransactionId => "TransactionID",
            ScoreComponent::Amount => "TransactionAmount",
            ScoreComponent::Date => "TransactionDate",
            ScoreComponent::WalletReference => "WalletReference",
            ScoreComponent::Narrative => "TransactionNarrative",
            ScoreComponent::Description => "TransactionDescription",
            ScoreComponent::TransactionType => "TransactionType",
            ScoreComponent::ProfileName => "ProfileName",
        }
    }
}

impl fmt::Display for ScoreComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Confidence tier of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchConfidence {
    /// Definitive match
    High,
    /// Strong potential match
    Medium,
    /// Weak potential match
    Low,
    /// Unlikely match
    VeryLow,
}

/// Weighted comparison of two transactions
///
/// `components` only holds fields that contributed more than zero points and
/// `total` is always their sum.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScore {
    #[serde(rename = "totalScore")]
    pub total: f64,
    pub confidence: MatchConfidence,
    #[serde(rename = "componentScores")]
    pub components: BTreeMap<ScoreComponent, f64>,
}

impl MatchScore {
    /// Points contributed by one field, zero when it did not contribute
    pub fn component(&self, component: ScoreComponent) -> f64 {
        self.components.get(&component).copied().unwrap_or(0.0)
    }

    /// Whether a field contributed to the total
    pub fn has_component(&self, component: ScoreComponent) -> bool {
        self.components.contains_key(&component)
    }
}

impl fmt::Display for MatchScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Score: {:.1}, Confidence: {:?}, Components: {{", self.total, self.confidence)?;
        for (i, (component, points)) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={:.2}", component, points)?;
        }
        f.write_str("}")
    }
}
