//! Reconciliation strategy module
//!
//! This module defines the Strategy pattern for the complete pipeline: parse
//! two sources, then reconcile them. Implementations differ in how the two
//! parses are scheduled (sequentially, or concurrently under a deadline) and
//! can be selected at runtime.

use crate::cli::StrategyType;
use crate::io::source::Source;
use crate::types::{ProcessingError, ReconciliationReport};

pub mod r#async;
pub mod sync;

pub use self::r#async::{reconcile_from_sources, AsyncStrategy, OrchestratorConfig};
pub use sync::SyncStrategy;

/// Strategy trait for complete reconciliation pipelines
pub trait ReconcileStrategy: Send + Sync {
    /// Parse both sources and reconcile their transactions
    ///
    /// # Arguments
    ///
    /// * `first` - Source whose identifiers drive the pairing
    /// * `second` - Source compared against the first
    ///
    /// # Returns
    ///
    /// * `Ok(ReconciliationReport)` if both sources parsed
    /// * `Err(ProcessingError)` on a parse failure, deadline expiry or
    ///   runtime failure
    fn reconcile(
        &self,
        first: &Source,
        second: &Source,
    ) -> Result<ReconciliationReport, ProcessingError>;
}

/// Create a reconciliation strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of strategy to create (Sync or Async)
/// * `config` - Orchestrator configuration; the sync strategy only uses its
///   parser settings
///
/// # Returns
///
/// A boxed trait object implementing the ReconcileStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    config: OrchestratorConfig,
) -> Box<dyn ReconcileStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncStrategy::new(config.parser)),
        StrategyType::Async => Box::new(AsyncStrategy::new(config)),
    }
}
