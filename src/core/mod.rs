//! Core business logic module
//!
//! This module contains the matching and reconciliation components:
//! - `traits` - The scorer seam used by the engine
//! - `scorer` - Weighted multi-field match scorer
//! - `engine` - Grouping, pairing and report aggregation

pub mod engine;
pub mod scorer;
pub mod traits;

pub use engine::ReconciliationEngine;
pub use scorer::WeightedScorer;
pub use traits::MatchScorer;
