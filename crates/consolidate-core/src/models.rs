use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ConsolidateError;

// ── Required schema ───────────────────────────────────────────────────────────

/// One of the four columns every transaction file is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Column {
    Transaction,
    Country,
    Currency,
    Client,
}

/// The required columns in canonical output order.
pub const REQUIRED_SCHEMA: [Column; 4] = [
    Column::Transaction,
    Column::Country,
    Column::Currency,
    Column::Client,
];

/// Header name of the day label column appended to every ingested row.
pub const DAY_COLUMN: &str = "day";
/// Header name of the continent enrichment column.
pub const CONTINENT_COLUMN: &str = "Continent";
/// Header name of the USD-converted total column.
pub const TOTAL_USD_COLUMN: &str = "Total_in_USD";

impl Column {
    /// Exact header spelling of the column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Transaction => "Transaction",
            Column::Country => "Country",
            Column::Currency => "Currency",
            Column::Client => "Client",
        }
    }

    /// Resolve a header cell to a required column. Matching is exact.
    pub fn from_header(name: &str) -> Option<Column> {
        REQUIRED_SCHEMA.iter().copied().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered intersection of [`REQUIRED_SCHEMA`] with a file's header.
///
/// The result follows the schema's order, not the file's.
pub fn reconcile_columns<S: AsRef<str>>(available: &[S]) -> Vec<Column> {
    REQUIRED_SCHEMA
        .iter()
        .copied()
        .filter(|col| available.iter().any(|a| a.as_ref() == col.as_str()))
        .collect()
}

// ── File classification ───────────────────────────────────────────────────────

/// Tabular formats the consolidator knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Delimited text (`.csv`).
    Csv,
    /// Excel workbook (`.xlsx` or `.xls`).
    Spreadsheet,
}

impl FileKind {
    /// Classify a path by its file-name suffix. Case-sensitive.
    pub fn from_path(path: &Path) -> Option<FileKind> {
        let name = path.file_name()?.to_string_lossy();
        if name.ends_with(".csv") {
            Some(FileKind::Csv)
        } else if name.ends_with(".xlsx") || name.ends_with(".xls") {
            Some(FileKind::Spreadsheet)
        } else {
            None
        }
    }
}

/// Field separators the sniffer chooses between.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
    Tab,
}

impl Delimiter {
    /// Candidates in tie-break priority order.
    pub const CANDIDATES: [Delimiter; 3] = [Delimiter::Comma, Delimiter::Semicolon, Delimiter::Tab];

    pub fn as_byte(&self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Tab => b'\t',
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Delimiter::Comma => "comma",
            Delimiter::Semicolon => "semicolon",
            Delimiter::Tab => "tab",
        };
        f.write_str(name)
    }
}

// ── Per-file records ──────────────────────────────────────────────────────────

/// Everything learned about one discovered file before its rows are read.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub path: PathBuf,
    /// Name of the enclosing day directory.
    pub day: String,
    pub kind: FileKind,
    /// Sniffed separator; `None` for spreadsheets.
    pub delimiter: Option<Delimiter>,
    /// Header cells in file order.
    pub available_columns: Vec<String>,
    /// Required columns the file provides, in schema order.
    pub used_columns: Vec<Column>,
}

/// A single transaction row.
///
/// Only the columns the source file provided are populated; the enrichment
/// fields stay `None` until the consolidated dataset is enriched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub transaction: Option<f64>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub client: Option<String>,
    pub day: String,
    pub continent: Option<String>,
    pub total_in_usd: Option<f64>,
}

impl Row {
    /// Text value of a required column, `None` when absent.
    pub fn text(&self, column: Column) -> Option<String> {
        match column {
            Column::Transaction => self
                .transaction
                .map(crate::formatting::format_cell_number),
            Column::Country => self.country.clone(),
            Column::Currency => self.currency.clone(),
            Column::Client => self.client.clone(),
        }
    }
}

/// Rows read from one file together with the columns that file provided.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

/// Why a file was passed over without being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The suffix is not `.csv`, `.xlsx` or `.xls`.
    UnsupportedExtension,
    /// The header shares no column with [`REQUIRED_SCHEMA`].
    NoRequiredColumns,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedExtension => f.write_str("unsupported file type"),
            SkipReason::NoRequiredColumns => f.write_str("no required columns found"),
        }
    }
}

/// Result of handling one discovered file.
#[derive(Debug)]
pub enum FileOutcome {
    /// The file was fully read.
    Ingested { record: FileRecord, rows: RowSet },
    /// The file was recognised (or not) but deliberately not read.
    Skipped {
        path: PathBuf,
        kind: Option<FileKind>,
        reason: SkipReason,
    },
    /// Reading the file failed part-way.
    Failed {
        path: PathBuf,
        kind: FileKind,
        error: ConsolidateError,
    },
}

impl FileOutcome {
    /// The recognised file kind, if any. Drives the "seen" counters.
    pub fn kind(&self) -> Option<FileKind> {
        match self {
            FileOutcome::Ingested { record, .. } => Some(record.kind),
            FileOutcome::Skipped { kind, .. } => *kind,
            FileOutcome::Failed { kind, .. } => Some(*kind),
        }
    }

    pub fn is_ingested(&self) -> bool {
        matches!(self, FileOutcome::Ingested { .. })
    }
}

// ── Run-level state ───────────────────────────────────────────────────────────

/// Files seen and successfully ingested, per format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub csv_seen: u32,
    pub csv_ok: u32,
    pub excel_seen: u32,
    pub excel_ok: u32,
}

impl ProcessingStats {
    /// Count a file whose extension was recognised.
    pub fn record_seen(&mut self, kind: FileKind) {
        match kind {
            FileKind::Csv => self.csv_seen += 1,
            FileKind::Spreadsheet => self.excel_seen += 1,
        }
    }

    /// Count a file that was read to completion.
    pub fn record_success(&mut self, kind: FileKind) {
        match kind {
            FileKind::Csv => self.csv_ok += 1,
            FileKind::Spreadsheet => self.excel_ok += 1,
        }
    }

    /// Fold one outcome into the counters.
    pub fn record(&mut self, outcome: &FileOutcome) {
        if let Some(kind) = outcome.kind() {
            self.record_seen(kind);
            if outcome.is_ingested() {
                self.record_success(kind);
            }
        }
    }
}

/// All ingested rows, concatenated in traversal order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsolidatedDataset {
    /// Union of the files' used columns, in schema order.
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl ConsolidatedDataset {
    /// Output header: required columns present, then day, continent and total.
    pub fn headers(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .map(|c| c.as_str())
            .chain([DAY_COLUMN, CONTINENT_COLUMN, TOTAL_USD_COLUMN])
            .collect()
    }

    /// Sum of every populated `Total_in_USD` value.
    pub fn total_usd(&self) -> f64 {
        self.rows.iter().filter_map(|r| r.total_in_usd).sum()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
