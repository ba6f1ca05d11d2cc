//! Concurrent ingestion strategy
//!
//! This module provides the ingestion orchestrator: both sources are parsed
//! as concurrent tokio tasks under a single deadline, then reconciled on the
//! calling task.
//!
//! # Architecture
//!
//! ```text
//! AsyncStrategy
//!     ├── OrchestratorConfig (timeout, worker_threads, parser)
//!     └── reconcile_from_sources
//!         ├── AsyncReader (source 1) ─┐
//!         ├── AsyncReader (source 2) ─┴─ try_join under timeout
//!         └── ReconciliationEngine (sequential)
//! ```
//!
//! # Cancellation
//!
//! Each parse task gets a child of one CancellationToken. When the deadline
//! expires or either parse fails, the token is cancelled and the other task
//! stops at its next row boundary instead of running on in the background.

use crate::core::ReconciliationEngine;
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::ParserConfig;
use crate::io::source::Source;
use crate::strategy::ReconcileStrategy;
use crate::types::{ParseError, ProcessingError, ReconciliationReport, Transaction};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default overall parse deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for the ingestion orchestrator
#[derive(Clone, Debug, PartialEq)]
pub struct OrchestratorConfig {
    /// Deadline for both parses together, measured once both are submitted
    pub timeout: Duration,
    /// Worker threads of the runtime built by [`AsyncStrategy`]
    pub worker_threads: usize,
    pub parser: ParserConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            worker_threads: num_cpus::get(),
            parser: ParserConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Create a new OrchestratorConfig, falling back to defaults for zero values
    pub fn new(timeout: Duration, worker_threads: usize, parser: ParserConfig) -> Self {
        let default = Self::default();

        let timeout = if timeout.is_zero() {
            warn!(
                "Invalid timeout ({:?}), using default ({:?})",
                timeout, default.timeout
            );
            default.timeout
        } else {
            timeout
        };

        let worker_threads = if worker_threads == 0 {
            warn!(
                "Invalid worker_threads ({}), using default ({})",
                worker_threads, default.worker_threads
            );
            default.worker_threads
        } else {
            worker_threads
        };

        Self {
            timeout,
            worker_threads,
            parser,
        }
    }
}

/// Concurrent ingestion strategy
///
/// Builds a multi-threaded tokio runtime per call and blocks on
/// [`reconcile_from_sources`]. Callers that already run inside a runtime
/// should await that function directly instead.
#[derive(Debug, Clone, Default)]
pub struct AsyncStrategy {
    config: OrchestratorConfig,
}

impl AsyncStrategy {
    /// Create a new AsyncStrategy with the specified configuration
    pub fn new(config: OrchestratorConfig) -> Self {
        Self { config }
    }
}

impl ReconcileStrategy for AsyncStrategy {
    fn reconcile(
        &self,
        first: &Source,
        second: &Source,
    ) -> Result<ReconciliationReport, ProcessingError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.worker_threads)
            .enable_all()
            .build()
            .map_err(|e| ProcessingError::execution(format!("Failed to create tokio runtime: {}", e)))?;

        runtime.block_on(reconcile_from_sources(first, second, &self.config))
    }
}

/// Parse both sources concurrently under one deadline, then reconcile them
///
/// # Errors
///
/// * `Timeout` - both parses did not finish within `config.timeout`
/// * `ParseFailure` - a parse failed; carries the first failure observed
/// * `Execution` - a parse task panicked or was aborted
pub async fn reconcile_from_sources(
    first: &Source,
    second: &Source,
    config: &OrchestratorConfig,
) -> Result<ReconciliationReport, ProcessingError> {
    info!(
        "Starting reconciliation of '{}' and '{}' (timeout {:?})",
        first, second, config.timeout
    );
    let cancel = CancellationToken::new();

    let (first_transactions, second_transactions) = parse_concurrently(
        (first.name(), parse_task(first.clone(), config.parser, cancel.child_token())),
        (second.name(), parse_task(second.clone(), config.parser, cancel.child_token())),
        config.timeout,
        &cancel,
    )
    .await?;

    debug!(
        "Both sources parsed - {} and {} transactions",
        first_transactions.len(),
        second_transactions.len()
    );
    Ok(ReconciliationEngine::new().reconcile(&first_transactions, &second_transactions))
}

async fn parse_task(
    source: Source,
    parser: ParserConfig,
    cancel: CancellationToken,
) -> Result<Vec<Transaction>, ParseError> {
    let outcome = AsyncReader::new(parser)
        .with_cancellation(cancel)
        .parse_outcome(&source)
        .await?;
    if !outcome.rejected.is_empty() {
        warn!(
            "{} rows of '{}' were rejected and left out of reconciliation",
            outcome.rejected.len(),
            source
        );
    }
    Ok(outcome.transactions)
}

/// Run both parses as tasks and wait for them under one deadline
///
/// Cancels `cancel` when the deadline expires or either parse fails.
async fn parse_concurrently<F1, F2>(
    first: (String, F1),
    second: (String, F2),
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<(Vec<Transaction>, Vec<Transaction>), ProcessingError>
where
    F1: Future<Output = Result<Vec<Transaction>, ParseError>> + Send + 'static,
    F2: Future<Output = Result<Vec<Transaction>, ParseError>> + Send + 'static,
{
    let (first_name, first_future) = first;
    let (second_name, second_future) = second;
    let first_task = tokio::spawn(first_future);
    let second_task = tokio::spawn(second_future);

    let both = futures::future::try_join(
        join_parse(&first_name, first_task),
        join_parse(&second_name, second_task),
    );

    match tokio::time::timeout(timeout, both).await {
        Ok(Ok(parsed)) => Ok(parsed),
        Ok(Err(e)) => {
            warn!("Parsing failed, cancelling remaining work: {}", e);
            cancel.cancel();
            Err(e)
        }
        Err(_) => {
            warn!("File parsing timed out after {:?}", timeout);
            cancel.cancel();
            Err(ProcessingError::Timeout {
                seconds: timeout.as_secs(),
            })
        }
    }
}

async fn join_parse(
    source_name: &str,
    task: JoinHandle<Result<Vec<Transaction>, ParseError>>,
) -> Result<Vec<Transaction>, ProcessingError> {
    match task.await {
        Ok(Ok(transactions)) => Ok(transactions),
        Ok(Err(cause)) => Err(ProcessingError::parse_failure(source_name, cause)),
        Err(e) => Err(ProcessingError::execution(format!(
            "parse task for '{}' did not complete: {}",
            source_name, e
        ))),
    }
}
