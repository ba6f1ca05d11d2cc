//! Transaction Reconciler Library
//! # Overview
//!
//! This library reconciles two CSV transaction files: it parses both into
//! typed records, pairs records sharing a business identifier, scores each
//! pair with a weighted multi-field fuzzy matcher, and reports which records
//! correspond and which do not.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Transaction, MatchScore, ReconciliationReport, errors)
//! - [`cli`] - CLI arguments parsing
//! - [`io`] - CSV parsing (sync and async readers) and report output
//! - [`core`] - Matching logic:
//!   - [`core::scorer`] - Weighted multi-field match scoring
//!   - [`core::engine`] - Grouping, pairing and report aggregation
//! - [`strategy`] - Sequential and concurrent end-to-end pipelines
//!
//! # Pipeline
//!
//! ```text
//! file1.csv ─ parse ─┐
//!                    ├─ ReconciliationEngine ─ MatchScorer per pair ─ ReconciliationReport
//! file2.csv ─ parse ─┘
//! ```
//!
//! # Confidence Tiers
//!
//! - **HIGH**: total >= 80, or identifier matched and total >= 70; counted as a match
//! - **MEDIUM**: total >= 50 with both amount and date contributing
//! - **LOW**: total >= 20
//! - **VERY_LOW**: everything else
//!
//! The library emits `tracing` events but never installs a subscriber.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{MatchScorer, ReconciliationEngine, WeightedScorer};
pub use io::{write_unmatched_csv, AsyncReader, ParserConfig, Source, SyncReader};
pub use strategy::{reconcile_from_sources, OrchestratorConfig, ReconcileStrategy};
pub use types::{
    MatchConfidence, MatchScore, ParseError, ProcessingError, ReconciliationReport, Transaction,
    TransactionId, TransactionType, UnmatchedPair,
};
