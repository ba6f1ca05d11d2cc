//! CSV format handling for transaction records and report output
//!
//! This module centralizes all CSV format concerns, providing:
//! - The required header set and the header-to-column layout
//! - Parser policies (row failures, field strictness, accepted date patterns)
//! - Conversion from raw CSV cells to [`Transaction`] records
//! - Serialization of unmatched pairs back to CSV
//!
//! All functions are pure (no I/O beyond the writer they are handed) so the
//! sync and async readers can share them.

use crate::types::{ParseError, ReconciliationReport, Transaction, TransactionId, TransactionType};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use std::collections::HashMap;
use std::io::Write;
use tracing::{debug, info, trace, warn};

pub const HEADER_PROFILE_NAME: &str = "ProfileName";
pub const HEADER_TRANSACTION_DATE: &str = "TransactionDate";
pub const HEADER_TRANSACTION_AMOUNT: &str = "TransactionAmount";
pub const HEADER_TRANSACTION_NARRATIVE: &str = "TransactionNarrative";
pub const HEADER_TRANSACTION_DESCRIPTION: &str = "TransactionDescription";
pub const HEADER_TRANSACTION_ID: &str = "TransactionID";
pub const HEADER_TRANSACTION_TYPE: &str = "TransactionType";
pub const HEADER_WALLET_REFERENCE: &str = "WalletReference";

/// Headers every source must declare (order-independent, case-sensitive)
pub const REQUIRED_HEADERS: [&str; 8] = [
    HEADER_PROFILE_NAME,
    HEADER_TRANSACTION_DATE,
    HEADER_TRANSACTION_AMOUNT,
    HEADER_TRANSACTION_NARRATIVE,
    HEADER_TRANSACTION_DESCRIPTION,
    HEADER_TRANSACTION_ID,
    HEADER_TRANSACTION_TYPE,
    HEADER_WALLET_REFERENCE,
];

/// Largest accepted source, in bytes (10 MiB)
pub const MAX_SOURCE_BYTES: u64 = 10 * 1024 * 1024;

/// The date-time pattern accepted by default (`yyyy-MM-dd HH:mm:ss`)
pub const PRIMARY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ISO_LOCAL_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const US_DATE_FORMAT: &str = "%m/%d/%Y %H:%M:%S";
const EU_DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

const PROGRESS_INTERVAL: usize = 1000;

/// What to do when a row cannot be assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Abort the whole source on the first failing row
    #[default]
    AbortOnFirstError,
    /// Record the failing row and keep going
    CollectAndContinue,
}

/// How strictly individual cells are decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldPolicy {
    /// Unparseable date, amount or type becomes an absent value; short rows
    /// are padded with empty cells
    #[default]
    Lenient,
    /// Unparseable non-empty cells and short rows fail the row
    Strict,
}

/// Date-time patterns tried when decoding `TransactionDate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFormats {
    /// Only [`PRIMARY_DATE_FORMAT`]
    #[default]
    Primary,
    /// Primary, RFC 3339, ISO local, `MM/dd/yyyy HH:mm:ss`, `dd/MM/yyyy HH:mm:ss`,
    /// in that order
    Extended,
}

/// Parser configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParserConfig {
    pub error_policy: ErrorPolicy,
    pub field_policy: FieldPolicy,
    pub date_formats: DateFormats,
    /// Sources larger than this are rejected before parsing
    pub max_source_bytes: u64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::default(),
            field_policy: FieldPolicy::default(),
            date_formats: DateFormats::default(),
            max_source_bytes: MAX_SOURCE_BYTES,
        }
    }
}

impl ParserConfig {
    /// Create a ParserConfig, falling back to the default size limit when
    /// given zero
    pub fn new(
        error_policy: ErrorPolicy,
        field_policy: FieldPolicy,
        date_formats: DateFormats,
        max_source_bytes: u64,
    ) -> Self {
        let max_source_bytes = if max_source_bytes == 0 {
            warn!(
                "Invalid max_source_bytes ({}), using default ({})",
                max_source_bytes, MAX_SOURCE_BYTES
            );
            MAX_SOURCE_BYTES
        } else {
            max_source_bytes
        };

        Self {
            error_policy,
            field_policy,
            date_formats,
            max_source_bytes,
        }
    }

    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    pub fn with_field_policy(mut self, field_policy: FieldPolicy) -> Self {
        self.field_policy = field_policy;
        self
    }

    pub fn with_date_formats(mut self, date_formats: DateFormats) -> Self {
        self.date_formats = date_formats;
        self
    }

    /// Reject empty or oversize sources before any parsing begins
    pub fn check_source_size(&self, source_name: &str, len: u64) -> Result<(), ParseError> {
        if len == 0 {
            warn!("Source '{}' is empty", source_name);
            return Err(ParseError::empty_file(source_name));
        }
        if len > self.max_source_bytes {
            warn!(
                "Source '{}' exceeds size limit - Size: {} bytes, Limit: {} bytes",
                source_name, len, self.max_source_bytes
            );
            return Err(ParseError::invalid_argument(format!(
                "File size should be less than {}MB",
                self.max_source_bytes / (1024 * 1024)
            )));
        }
        Ok(())
    }
}

/// Transactions accepted from one source, plus rows rejected under
/// [`ErrorPolicy::CollectAndContinue`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub transactions: Vec<Transaction>,
    /// Each entry is a [`ParseError::LineParsing`]
    pub rejected: Vec<ParseError>,
}

/// Columns the decoder reads, in [`REQUIRED_HEADERS`] order
#[derive(Debug, Clone, Copy)]
enum Column {
    ProfileName = 0,
    TransactionDate,
    TransactionAmount,
    TransactionNarrative,
    TransactionDescription,
    TransactionId,
    TransactionType,
    WalletReference,
}

impl Column {
    fn header(self) -> &'static str {
        REQUIRED_HEADERS[self as usize]
    }
}

/// Mapping from required header to column index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLayout {
    indices: HashMap<String, usize>,
    column_count: usize,
}

impl HeaderLayout {
    /// Build the layout from the header cells and validate it
    ///
    /// Header names are trimmed; on duplicates the first occurrence wins.
    /// Fails with `MissingHeader` naming the first required header absent.
    pub fn from_header_cells<S: AsRef<str>>(cells: &[S]) -> Result<Self, ParseError> {
        let mut indices = HashMap::with_capacity(cells.len());
        for (index, cell) in cells.iter().enumerate() {
            let name = cell.as_ref().trim().trim_start_matches('\u{feff}');
            trace!("Mapped header '{}' to column index {}", name, index);
            indices.entry(name.to_string()).or_insert(index);
        }
        debug!("Parsed {} header columns", cells.len());

        for required in REQUIRED_HEADERS {
            if !indices.contains_key(required) {
                warn!("Missing required header: '{}'", required);
                debug!("Available headers: {:?}", indices.keys().collect::<Vec<_>>());
                return Err(ParseError::missing_header(required));
            }
        }
        debug!("All {} required headers found", REQUIRED_HEADERS.len());

        Ok(Self {
            indices,
            column_count: cells.len(),
        })
    }

    /// Number of columns declared by the header line
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    fn cell<'a>(&self, column: Column, cells: &[&'a str]) -> Result<&'a str, ParseError> {
        let header = column.header();
        let index = *self
            .indices
            .get(header)
            .ok_or_else(|| ParseError::invalid_header(header))?;
        cells
            .get(index)
            .copied()
            .map(str::trim)
            .ok_or_else(|| ParseError::invalid_header(header))
    }
}

/// Convert the cells of one data row into a [`Transaction`]
///
/// Short rows are padded with empty cells under the lenient policy and
/// rejected with `ColumnMismatch` under the strict one. Extra trailing cells
/// are ignored.
pub fn decode_row(
    cells: &[&str],
    layout: &HeaderLayout,
    config: &ParserConfig,
) -> Result<Transaction, ParseError> {
    if cells.len() < layout.column_count() && config.field_policy == FieldPolicy::Strict {
        return Err(ParseError::ColumnMismatch {
            expected: layout.column_count(),
            actual: cells.len(),
        });
    }

    let padded: Vec<&str> = (0..layout.column_count().max(cells.len()))
        .map(|i| cells.get(i).copied().unwrap_or(""))
        .collect();

    let transaction = Transaction {
        profile_name: Some(layout.cell(Column::ProfileName, &padded)?.to_string()),
        transaction_date: decode_date(layout.cell(Column::TransactionDate, &padded)?, config)?,
        transaction_amount: decode_amount(layout.cell(Column::TransactionAmount, &padded)?, config)?,
        transaction_narrative: Some(
            layout
                .cell(Column::TransactionNarrative, &padded)?
                .to_string(),
        ),
        transaction_description: Some(
            layout
                .cell(Column::TransactionDescription, &padded)?
                .to_string(),
        ),
        transaction_id: Some(TransactionId::new(
            layout.cell(Column::TransactionId, &padded)?,
        )),
        transaction_type: decode_type(layout.cell(Column::TransactionType, &padded)?, config)?,
        wallet_reference: Some(layout.cell(Column::WalletReference, &padded)?.to_string()),
    };

    trace!(
        "Parsed transaction data: ID={:?}, Amount={:?}, Type={:?}",
        transaction.transaction_id,
        transaction.transaction_amount,
        transaction.transaction_type
    );

    Ok(transaction)
}

/// Parse a date-time cell with the configured patterns
///
/// Naive timestamps are attached to the local time zone; a time that falls in
/// a DST gap is shifted forward by an hour, an ambiguous one takes the earlier
/// offset.
pub fn parse_date(raw: &str, formats: DateFormats) -> Option<DateTime<Local>> {
    let primary = parse_naive(raw, PRIMARY_DATE_FORMAT);
    if primary.is_some() || formats == DateFormats::Primary {
        return primary;
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Local))
        .or_else(|| parse_naive(raw, ISO_LOCAL_DATE_FORMAT))
        .or_else(|| parse_naive(raw, US_DATE_FORMAT))
        .or_else(|| parse_naive(raw, EU_DATE_FORMAT))
}

fn parse_naive(raw: &str, format: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(raw, format).ok()?;
    Local.from_local_datetime(&naive).earliest().or_else(|| {
        naive
            .checked_add_signed(chrono::Duration::hours(1))
            .and_then(|shifted| Local.from_local_datetime(&shifted).earliest())
    })
}

fn decode_date(raw: &str, config: &ParserConfig) -> Result<Option<DateTime<Local>>, ParseError> {
    if raw.is_empty() {
        return Ok(None);
    }
    match parse_date(raw, config.date_formats) {
        Some(date) => Ok(Some(date)),
        None if config.field_policy == FieldPolicy::Strict => Err(ParseError::date_parsing(raw)),
        None => {
            warn!("Failed to parse date: '{}' - leaving it empty", raw);
            Ok(None)
        }
    }
}

fn decode_amount(raw: &str, config: &ParserConfig) -> Result<Option<f64>, ParseError> {
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(amount) => Ok(Some(amount)),
        Err(e) if config.field_policy == FieldPolicy::Strict => Err(ParseError::transaction_data(
            format!("Invalid amount '{}': {}", raw, e),
        )),
        Err(e) => {
            warn!("Failed to parse amount: '{}' - leaving it empty. Error: {}", raw, e);
            Ok(None)
        }
    }
}

fn decode_type(raw: &str, config: &ParserConfig) -> Result<Option<TransactionType>, ParseError> {
    match TransactionType::from_code(raw) {
        Some(tx_type) => Ok(Some(tx_type)),
        None if raw.is_empty() => Ok(None),
        None if config.field_policy == FieldPolicy::Strict => {
            Err(ParseError::transaction_type_parsing(raw))
        }
        None => {
            warn!("Unknown transaction type: '{}' - leaving it empty", raw);
            Ok(None)
        }
    }
}

/// Row-by-row accumulator shared by the sync and async readers
///
/// Readers hand it raw byte cells; it validates the header once, skips blank
/// lines, decodes rows and applies the [`ErrorPolicy`].
#[derive(Debug)]
pub struct TransactionCollector<'a> {
    source_name: &'a str,
    config: &'a ParserConfig,
    layout: HeaderLayout,
    outcome: ParseOutcome,
    skipped_lines: usize,
}

impl<'a> TransactionCollector<'a> {
    /// Validate the header record and prepare to accept rows
    pub fn from_header(
        source_name: &'a str,
        config: &'a ParserConfig,
        header: &[&[u8]],
    ) -> Result<Self, ParseError> {
        let cells: Vec<String> = header
            .iter()
            .map(|cell| String::from_utf8_lossy(cell).into_owned())
            .collect();
        debug!("Header line read from '{}': {}", source_name, cells.join(","));

        let layout = HeaderLayout::from_header_cells(&cells)?;
        info!(
            "Parsed {} headers for '{}'",
            layout.column_count(),
            source_name
        );

        Ok(Self {
            source_name,
            config,
            layout,
            outcome: ParseOutcome::default(),
            skipped_lines: 0,
        })
    }

    /// Decode one data row
    ///
    /// Returns an error only when the row failed and the policy is to abort.
    pub fn push_row(&mut self, cells: &[&[u8]], line: u64) -> Result<(), ParseError> {
        if is_blank(cells) {
            trace!("Skipping empty line at line number: {}", line);
            self.skipped_lines += 1;
            return Ok(());
        }

        match decode_byte_cells(cells).and_then(|text| {
            let refs: Vec<&str> = text.iter().map(String::as_str).collect();
            decode_row(&refs, &self.layout, self.config)
        }) {
            Ok(transaction) => {
                self.outcome.transactions.push(transaction);
                let parsed = self.outcome.transactions.len();
                if parsed % PROGRESS_INTERVAL == 0 {
                    info!("Processed {} transactions so far from '{}'", parsed, self.source_name);
                }
                Ok(())
            }
            Err(cause) => {
                let content = raw_line(cells);
                warn!(
                    "Parsing error at line {} of '{}': {} - Line content: '{}'",
                    line, self.source_name, cause, content
                );
                let error = ParseError::line_parsing(line, &content, cause);
                match self.config.error_policy {
                    ErrorPolicy::AbortOnFirstError => Err(error),
                    ErrorPolicy::CollectAndContinue => {
                        self.outcome.rejected.push(error);
                        Ok(())
                    }
                }
            }
        }
    }

    /// Finish the source and return what was collected
    pub fn finish(self) -> ParseOutcome {
        info!(
            "CSV parsing completed for '{}' - Successful: {}, Rejected: {}, Skipped: {}",
            self.source_name,
            self.outcome.transactions.len(),
            self.outcome.rejected.len(),
            self.skipped_lines
        );
        self.outcome
    }
}

fn is_blank(cells: &[&[u8]]) -> bool {
    match cells {
        [] => true,
        [only] => only.iter().all(u8::is_ascii_whitespace),
        _ => false,
    }
}

fn decode_byte_cells(cells: &[&[u8]]) -> Result<Vec<String>, ParseError> {
    cells
        .iter()
        .enumerate()
        .map(|(index, cell)| {
            std::str::from_utf8(cell)
                .map(str::to_string)
                .map_err(|e| {
                    ParseError::transaction_data(format!(
                        "invalid UTF-8 in column {}: {}",
                        index + 1,
                        e
                    ))
                })
        })
        .collect()
}

fn raw_line(cells: &[&[u8]]) -> String {
    cells
        .iter()
        .map(|cell| String::from_utf8_lossy(cell))
        .collect::<Vec<_>>()
        .join(",")
}

/// Write the unmatched pairs of a report as CSV
///
/// One row per present side of each pair, prefixed with the pair index and
/// the side (`file1` / `file2`). Field columns use the input header names and
/// encodings so the output can be parsed again.
pub fn write_unmatched_csv(
    report: &ReconciliationReport,
    output: &mut dyn Write,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(output);

    let mut header = vec!["Pair", "Side"];
    header.extend(REQUIRED_HEADERS);
    writer.write_record(&header)?;

    for (index, pair) in report.unmatched_pairs.iter().enumerate() {
        let sides = [("file1", pair.left()), ("file2", pair.right())];
        for (side, transaction) in sides {
            if let Some(transaction) = transaction {
                let mut record = vec![(index + 1).to_string(), side.to_string()];
                record.extend(transaction_cells(transaction));
                writer.write_record(&record)?;
            }
        }
    }

    writer.flush()?;
    Ok(())
}

fn transaction_cells(tx: &Transaction) -> [String; 8] {
    [
        tx.profile_name.clone().unwrap_or_default(),
        tx.transaction_date
            .map(|date| date.format(PRIMARY_DATE_FORMAT).to_string())
            .unwrap_or_default(),
        tx.transaction_amount
            .map(|amount| amount.to_string())
            .unwrap_or_default(),
        tx.transaction_narrative.clone().unwrap_or_default(),
        tx.transaction_description.clone().unwrap_or_default(),
        tx.transaction_id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_default(),
        tx.transaction_type
            .map(|tx_type| tx_type.code().to_string())
            .unwrap_or_default(),
        tx.wallet_reference.clone().unwrap_or_default(),
    ]
}
