//! Error types for the reconciler
//!
//! Two enums cover the pipeline:
//!
//! - [`ParseError`]: everything that can stop a single source from being
//!   turned into transactions (empty input, header problems, row failures,
//!   I/O, oversize input).
//! - [`ProcessingError`]: orchestration failures when reconciling two sources
//!   (deadline expiry, a failed parse, a task that could not be joined).
//!
//! Soft field problems (an unparseable date, amount or type) are not errors
//! under the default lenient policy; the field is simply left absent.

use thiserror::Error;

/// Failure to parse one CSV source
///
/// Carries I/O failures as messages so the type stays `Clone + PartialEq`,
/// which keeps error assertions in tests simple.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Source has no content or no readable header line
    #[error("CSV file is empty: {source_name}")]
    EmptyFile { source_name: String },

    /// A required header is absent from the header line
    #[error("Required CSV header is missing: {header}")]
    MissingHeader { header: String },

    /// A required header could not be resolved while decoding a row
    ///
    /// Unreachable once header validation has passed.
    #[error("Invalid or missing header in CSV file: {header}")]
    InvalidHeader { header: String },

    /// Row has fewer cells than the header (strict field policy only)
    #[error("Expected {expected} columns but found {actual}")]
    ColumnMismatch { expected: usize, actual: usize },

    /// A row could not be assembled; wraps the underlying cause
    #[error("Error parsing CSV at line {line}: {cause}")]
    LineParsing {
        /// 1-based physical line number, header included
        line: u64,
        /// Raw line text as read
        content: String,
        cause: Box<ParseError>,
    },

    /// Unexpected failure while assembling a row's typed fields
    #[error("Error parsing transaction data: {message}")]
    TransactionDataParsing { message: String },

    /// Date cell matched none of the accepted patterns (strict field policy only)
    #[error("Invalid date format in transaction data: '{value}'")]
    DateParsing { value: String },

    /// Type cell is neither `0` nor `1` (strict field policy only)
    #[error("Invalid transaction type in data: '{value}'")]
    TransactionTypeParsing { value: String },

    /// Source could not be opened or read
    #[error("Error processing file: {message}")]
    Io { message: String },

    /// Caller-side problem with the source itself, e.g. oversize input
    #[error("Invalid request parameters: {message}")]
    InvalidArgument { message: String },

    /// Parsing stopped because the caller asked it to
    #[error("Parsing was cancelled")]
    Cancelled,
}

impl From<std::io::Error> for ParseError {
    fn from(error: std::io::Error) -> Self {
        ParseError::Io {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for ParseError {
    fn from(error: csv::Error) -> Self {
        ParseError::Io {
            message: error.to_string(),
        }
    }
}

impl From<csv_async::Error> for ParseError {
    fn from(error: csv_async::Error) -> Self {
        ParseError::Io {
            message: error.to_string(),
        }
    }
}

impl ParseError {
    /// Create an EmptyFile error
    pub fn empty_file(source_name: &str) -> Self {
        ParseError::EmptyFile {
            source_name: source_name.to_string(),
        }
    }

    /// Create a MissingHeader error
    pub fn missing_header(header: &str) -> Self {
        ParseError::MissingHeader {
            header: header.to_string(),
        }
    }

    /// Create an InvalidHeader error
    pub fn invalid_header(header: &str) -> Self {
        ParseError::InvalidHeader {
            header: header.to_string(),
        }
    }

    /// Wrap a row-assembly failure with its position and raw text
    pub fn line_parsing(line: u64, content: &str, cause: ParseError) -> Self {
        ParseError::LineParsing {
            line,
            content: content.to_string(),
            cause: Box::new(cause),
        }
    }

    /// Create a TransactionDataParsing error
    pub fn transaction_data(message: impl Into<String>) -> Self {
        ParseError::TransactionDataParsing {
            message: message.into(),
        }
    }

    /// Create a DateParsing error
    pub fn date_parsing(value: &str) -> Self {
        ParseError::DateParsing {
            value: value.to_string(),
        }
    }

    /// Create a TransactionTypeParsing error
    pub fn transaction_type_parsing(value: &str) -> Self {
        ParseError::TransactionTypeParsing {
            value: value.to_string(),
        }
    }

    /// Create an InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ParseError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Line number for row-level failures
    pub fn line(&self) -> Option<u64> {
        match self {
            ParseError::LineParsing { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Category of a [`ProcessingError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingErrorKind {
    Timeout,
    ParseFailure,
    Execution,
}

/// Failure to reconcile two sources
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessingError {
    /// Both parses did not finish within the deadline
    #[error("File parsing operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// One of the parses failed; carries the first failure observed
    #[error("File parsing failed for {source_name}: {cause}")]
    ParseFailure {
        source_name: String,
        #[source]
        cause: ParseError,
    },

    /// A parse task could not be run or joined
    #[error("File parsing could not be executed: {message}")]
    Execution { message: String },
}

impl ProcessingError {
    /// Create a ParseFailure error
    pub fn parse_failure(source_name: &str, cause: ParseError) -> Self {
        ProcessingError::ParseFailure {
            source_name: source_name.to_string(),
            cause,
        }
    }

    /// Create an Execution error
    pub fn execution(message: impl Into<String>) -> Self {
        ProcessingError::Execution {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ProcessingErrorKind {
        match self {
            ProcessingError::Timeout { .. } => ProcessingErrorKind::Timeout,
            ProcessingError::ParseFailure { .. } => ProcessingErrorKind::ParseFailure,
            ProcessingError::Execution { .. } => ProcessingErrorKind::Execution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::error::Error as _;

    #[rstest]
    #[case::empty_file(
        ParseError::EmptyFile { source_name: "a.csv".to_string() },
        "CSV file is empty: a.csv"
    )]
    #[case::missing_header(
        ParseError::MissingHeader { header: "TransactionDate".to_string() },
        "Required CSV header is missing: TransactionDate"
    )]
    #[case::column_mismatch(
        ParseError::ColumnMismatch { expected: 8, actual: 3 },
        "Expected 8 columns but found 3"
    )]
    #[case::line_parsing(
        ParseError::line_parsing(4, "x,y", ParseError::date_parsing("yesterday")),
        "Error parsing CSV at line 4: Invalid date format in transaction data: 'yesterday'"
    )]
    #[case::transaction_type(
        ParseError::TransactionTypeParsing { value: "7".to_string() },
        "Invalid transaction type in data: '7'"
    )]
    #[case::io(
        ParseError::Io { message: "Permission denied".to_string() },
        "Error processing file: Permission denied"
    )]
    #[case::invalid_argument(
        ParseError::invalid_argument("File size should be less than 10MB"),
        "Invalid request parameters: File size should be less than 10MB"
    )]
    fn test_parse_error_display(#[case] error: ParseError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::timeout(ProcessingError::Timeout { seconds: 120 }, ProcessingErrorKind::Timeout)]
    #[case::parse_failure(
        ProcessingError::parse_failure("b.csv", ParseError::empty_file("b.csv")),
        ProcessingErrorKind::ParseFailure
    )]
    #[case::execution(ProcessingError::execution("task panicked"), ProcessingErrorKind::Execution)]
    fn test_processing_error_kind(
        #[case] error: ProcessingError,
        #[case] expected: ProcessingErrorKind,
    ) {
        assert_eq!(error.kind(), expected);
    }

    #[test]
    fn test_parse_failure_exposes_cause() {
        let error = ProcessingError::parse_failure("b.csv", ParseError::missing_header("TransactionID"));
        let source = error.source().expect("cause should be attached");
        assert_eq!(source.to_string(), "Required CSV header is missing: TransactionID");
    }

    #[test]
    fn test_line_number_only_for_row_failures() {
        let error = ParseError::line_parsing(7, "raw", ParseError::transaction_data("bad"));
        assert_eq!(error.line(), Some(7));
        assert_eq!(ParseError::Cancelled.line(), None);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error: ParseError = io_error.into();
        assert!(matches!(error, ParseError::Io { .. }));
        assert_eq!(error.to_string(), "Error processing file: Permission denied");
    }
}
