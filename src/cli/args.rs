use crate::io::csv_format::{DateFormats, ErrorPolicy, FieldPolicy, ParserConfig, MAX_SOURCE_BYTES};
use crate::strategy::OrchestratorConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Reconcile two CSV transaction files
#[derive(Parser, Debug)]
#[command(name = "transaction-reconciler")]
#[command(about = "Reconcile two CSV transaction files and report discrepancies", long_about = None)]
pub struct CliArgs {
    /// First CSV file; its identifiers drive the pairing
    #[arg(value_name = "FILE1", help = "Path to the first CSV file")]
    pub first_file: PathBuf,

    /// Second CSV file
    #[arg(value_name = "FILE2", help = "Path to the second CSV file")]
    pub second_file: PathBuf,

    /// Strategy used to parse the two files
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Parsing strategy: 'sync' for sequential or 'async' for concurrent parsing"
    )]
    pub strategy: StrategyType,

    /// Overall parse deadline in seconds (async mode only)
    #[arg(
        long = "timeout-secs",
        value_name = "SECONDS",
        help = "Deadline for parsing both files (default: 120)"
    )]
    pub timeout_secs: Option<u64>,

    /// Runtime worker threads (async mode only)
    #[arg(
        long = "workers",
        value_name = "COUNT",
        help = "Number of runtime worker threads (default: CPU cores)"
    )]
    pub workers: Option<usize>,

    /// What to do with rows that cannot be parsed
    #[arg(
        long = "error-policy",
        value_name = "POLICY",
        default_value = "abort",
        help = "'abort' fails a file on its first bad row, 'collect' skips bad rows"
    )]
    pub error_policy: ErrorPolicyArg,

    /// Reject unparseable dates, amounts, types and short rows
    #[arg(long = "strict-fields", help = "Fail rows with unparseable fields instead of leaving them empty")]
    pub strict_fields: bool,

    /// Also accept ISO, US and European date layouts
    #[arg(
        long = "extended-date-formats",
        help = "Accept ISO 8601, MM/dd/yyyy and dd/MM/yyyy timestamps besides yyyy-MM-dd HH:mm:ss"
    )]
    pub extended_date_formats: bool,

    /// Report format written to stdout
    #[arg(
        long = "format",
        value_name = "FORMAT",
        default_value = "json",
        help = "Output format: 'json' for the full report or 'csv' for unmatched pairs"
    )]
    pub format: OutputFormat,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", help = "Log debug details to stderr")]
    pub verbose: bool,
}

/// Available parsing strategies
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

/// Row failure handling as accepted on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ErrorPolicyArg {
    Abort,
    Collect,
}

/// Report output formats
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl CliArgs {
    /// Build the parser configuration from CLI arguments
    pub fn to_parser_config(&self) -> ParserConfig {
        let error_policy = match self.error_policy {
            ErrorPolicyArg::Abort => ErrorPolicy::AbortOnFirstError,
            ErrorPolicyArg::Collect => ErrorPolicy::CollectAndContinue,
        };
        let field_policy = if self.strict_fields {
            FieldPolicy::Strict
        } else {
            FieldPolicy::Lenient
        };
        let date_formats = if self.extended_date_formats {
            DateFormats::Extended
        } else {
            DateFormats::Primary
        };

        ParserConfig::new(error_policy, field_policy, date_formats, MAX_SOURCE_BYTES)
    }

    /// Create an OrchestratorConfig from CLI arguments
    ///
    /// Missing values fall back to defaults; zero values are replaced with
    /// defaults and logged as warnings.
    pub fn to_orchestrator_config(&self) -> OrchestratorConfig {
        let default = OrchestratorConfig::default();
        OrchestratorConfig::new(
            self.timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(default.timeout),
            self.workers.unwrap_or(default.worker_threads),
            self.to_parser_config(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::r#async::DEFAULT_TIMEOUT;
    use rstest::rstest;

    #[rstest]
    #[case::default_strategy(&["program", "a.csv", "b.csv"], StrategyType::Async)]
    #[case::explicit_sync(&["program", "--strategy", "sync", "a.csv", "b.csv"], StrategyType::Sync)]
    #[case::explicit_async(&["program", "--strategy", "async", "a.csv", "b.csv"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.strategy, expected);
        assert_eq!(parsed.first_file, PathBuf::from("a.csv"));
        assert_eq!(parsed.second_file, PathBuf::from("b.csv"));
    }

    #[rstest]
    #[case::all_defaults(&["program", "a.csv", "b.csv"], DEFAULT_TIMEOUT, num_cpus::get())]
    #[case::custom_timeout(&["program", "--timeout-secs", "5", "a.csv", "b.csv"], Duration::from_secs(5), num_cpus::get())]
    #[case::custom_workers(&["program", "--workers", "3", "a.csv", "b.csv"], DEFAULT_TIMEOUT, 3)]
    #[case::zero_timeout(&["program", "--timeout-secs", "0", "a.csv", "b.csv"], DEFAULT_TIMEOUT, num_cpus::get())]
    #[case::zero_workers(&["program", "--workers", "0", "a.csv", "b.csv"], DEFAULT_TIMEOUT, num_cpus::get())]
    fn test_orchestrator_config_conversion(
        #[case] args: &[&str],
        #[case] expected_timeout: Duration,
        #[case] expected_workers: usize,
    ) {
        let config = CliArgs::try_parse_from(args)
            .unwrap()
            .to_orchestrator_config();

        assert_eq!(config.timeout, expected_timeout);
        assert_eq!(config.worker_threads, expected_workers);
    }

    #[test]
    fn test_parser_config_defaults() {
        let config = CliArgs::try_parse_from(["program", "a.csv", "b.csv"])
            .unwrap()
            .to_parser_config();

        assert_eq!(config, ParserConfig::default());
    }

    #[test]
    fn test_parser_config_flags() {
        let parsed = CliArgs::try_parse_from([
            "program",
            "--error-policy",
            "collect",
            "--strict-fields",
            "--extended-date-formats",
            "--format",
            "csv",
            "-v",
            "a.csv",
            "b.csv",
        ])
        .unwrap();
        let config = parsed.to_parser_config();

        assert_eq!(config.error_policy, ErrorPolicy::CollectAndContinue);
        assert_eq!(config.field_policy, FieldPolicy::Strict);
        assert_eq!(config.date_formats, DateFormats::Extended);
        assert_eq!(parsed.format, OutputFormat::Csv);
        assert!(parsed.verbose);
    }

    #[rstest]
    #[case::missing_inputs(&["program"])]
    #[case::missing_second_input(&["program", "a.csv"])]
    #[case::invalid_strategy(&["program", "--strategy", "invalid", "a.csv", "b.csv"])]
    #[case::invalid_format(&["program", "--format", "xml", "a.csv", "b.csv"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
