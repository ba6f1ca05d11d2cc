//! Transaction Reconciler CLI
//!
//! Command-line interface for reconciling two CSV transaction files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- file1.csv file2.csv > report.json
//! cargo run -- --strategy sync file1.csv file2.csv
//! cargo run -- --format csv --error-policy collect file1.csv file2.csv > unmatched.csv
//! RUST_LOG=transaction_reconciler=trace cargo run -- file1.csv file2.csv
//! ```
//!
//! The report goes to stdout: the full report as JSON by default, or the
//! unmatched pairs as CSV. Logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (file not found, bad header, timeout, etc.)

use std::io::Write;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use transaction_reconciler::cli::{self, OutputFormat};
use transaction_reconciler::io::{write_unmatched_csv, Source};
use transaction_reconciler::strategy;

fn main() {
    // Parse command-line arguments using clap
    let args = cli::parse_args();

    // RUST_LOG wins; otherwise the verbosity flag picks the level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.verbose {
            EnvFilter::new("transaction_reconciler=debug,info")
        } else {
            EnvFilter::new("transaction_reconciler=warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let strategy = strategy::create_strategy(args.strategy.clone(), args.to_orchestrator_config());
    let first = Source::path(&args.first_file);
    let second = Source::path(&args.second_file);

    let report = match strategy.reconcile(&first, &second) {
        Ok(report) => report,
        Err(e) => {
            error!("Reconciliation failed: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    info!("{}", report.summary());

    let mut output = std::io::stdout().lock();
    let written = match args.format {
        OutputFormat::Json => serde_json::to_writer_pretty(&mut output, &report)
            .map_err(|e| e.to_string())
            .and_then(|()| writeln!(output).map_err(|e| e.to_string())),
        OutputFormat::Csv => write_unmatched_csv(&report, &mut output).map_err(|e| e.to_string()),
    };
    if let Err(e) = written {
        eprintln!("Error: failed to write report: {}", e);
        process::exit(1);
    }
}
