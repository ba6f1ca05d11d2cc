//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `transaction`: Transaction records and the business identifier
//! - `score`: Match score, component keys and confidence tiers
//! - `report`: Unmatched pairs and the reconciliation report
//! - `error`: Error types for parsing and orchestration

pub mod error;
pub mod report;
pub mod score;
pub mod transaction;

pub use error::{ParseError, ProcessingError, ProcessingErrorKind};
pub use report::{ReconciliationReport, UnmatchedPair};
pub use score::{MatchConfidence, MatchScore, ScoreComponent};
pub use transaction::{Transaction, TransactionBuilder, TransactionId, TransactionType};
