//! Transaction-related types for the reconciler
//!
//! This module defines the transaction record produced by the CSV parser and
//! the business identifier used to join records across the two sources.

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use std::fmt;

/// Business identifier used as the join key between the two sources
///
/// Equality and hashing are by the underlying string. Serialized as a bare
/// string rather than a wrapper object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(String);

impl TransactionId {
    /// Wrap a raw identifier string
    pub fn new(id: impl Into<String>) -> Self {
        TransactionId(id.into())
    }

    /// The raw identifier string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(id: &str) -> Self {
        TransactionId::new(id)
    }
}

impl From<String> for TransactionId {
    fn from(id: String) -> Self {
        TransactionId(id)
    }
}

impl Serialize for TransactionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Transaction type as encoded in the `TransactionType` column
///
/// The CSV carries `0` and `1`; anything else decodes to an absent type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TransactionType {
    /// Encoded as `0`
    #[serde(rename = "TYPE_1")]
    Type1,
    /// Encoded as `1`
    #[serde(rename = "TYPE_2")]
    Type2,
}

impl TransactionType {
    /// Decode a trimmed `TransactionType` cell
    ///
    /// Returns `None` for any token other than `0` or `1`, including the
    /// empty string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "0" => Some(TransactionType::Type1),
            "1" => Some(TransactionType::Type2),
            _ => None,
        }
    }

    /// Code written back to CSV output
    pub fn code(&self) -> &'static str {
        match self {
            TransactionType::Type1 => "0",
            TransactionType::Type2 => "1",
        }
    }
}

/// A single parsed CSV row cast to typed fields
///
/// Records are immutable once built; equality is field-wise. Every field is
/// optional at the type level because hand-built fixtures may omit any of
/// them, although the parser always fills the string fields and the
/// identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub profile_name: Option<String>,

    /// Timestamp attached to the process's local time zone
    pub transaction_date: Option<DateTime<Local>>,

    pub transaction_amount: Option<f64>,

    pub transaction_narrative: Option<String>,

    pub transaction_description: Option<String>,

    /// Join key; named `transactionID` on the wire
    #[serde(rename = "transactionID")]
    pub transaction_id: Option<TransactionId>,

    pub transaction_type: Option<TransactionType>,

    pub wallet_reference: Option<String>,
}

impl Transaction {
    /// Start building a transaction for the given identifier
    ///
    /// Mostly useful for fixtures; the parser fills the struct directly.
    pub fn builder(id: impl Into<TransactionId>) -> TransactionBuilder {
        TransactionBuilder {
            inner: Transaction {
                transaction_id: Some(id.into()),
                ..Transaction::default()
            },
        }
    }
}

/// Fluent constructor for [`Transaction`]
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    inner: Transaction,
}

impl TransactionBuilder {
    pub fn profile_name(mut self, value: impl Into<String>) -> Self {
        self.inner.profile_name = Some(value.into());
        self
    }

    pub fn date(mut self, value: DateTime<Local>) -> Self {
        self.inner.transaction_date = Some(value);
        self
    }

    pub fn amount(mut self, value: f64) -> Self {
        self.inner.transaction_amount = Some(value);
        self
    }

    pub fn narrative(mut self, value: impl Into<String>) -> Self {
        self.inner.transaction_narrative = Some(value.into());
        self
    }

    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.inner.transaction_description = Some(value.into());
        self
    }

    pub fn transaction_type(mut self, value: TransactionType) -> Self {
        self.inner.transaction_type = Some(value);
        self
    }

    pub fn wallet_reference(mut self, value: impl Into<String>) -> Self {
        self.inner.wallet_reference = Some(value.into());
        self
    }

    pub fn build(self) -> Transaction {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case::type_1("0", Some(TransactionType::Type1))]
    #[case::type_2("1", Some(TransactionType::Type2))]
    #[case::empty("", None)]
    #[case::unknown("2", None)]
    #[case::word("debit", None)]
    fn test_transaction_type_from_code(
        #[case] code: &str,
        #[case] expected: Option<TransactionType>,
    ) {
        assert_eq!(TransactionType::from_code(code), expected);
    }

    #[test]
    fn test_transaction_id_equality_and_hash_by_string() {
        let mut ids = HashSet::new();
        ids.insert(TransactionId::new("TXN001"));
        ids.insert(TransactionId::from("TXN001".to_string()));
        ids.insert(TransactionId::from("TXN002"));

        assert_eq!(ids.len(), 2);
        assert_eq!(TransactionId::new("A").to_string(), "A");
    }

    #[test]
    fn test_transaction_serializes_with_wire_names() {
        let tx = Transaction::builder("TXN9")
            .amount(12.5)
            .transaction_type(TransactionType::Type2)
            .build();

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["transactionID"], "TXN9");
        assert_eq!(json["transactionAmount"], 12.5);
        assert_eq!(json["transactionType"], "TYPE_2");
        assert!(json["profileName"].is_null());
        assert!(json["transactionDate"].is_null());
    }
}
