use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the consolidator.
#[derive(Error, Debug)]
pub enum ConsolidateError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output file could not be created or written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A delimited text file could not be parsed.
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A spreadsheet could not be opened or one of its sheets could not be read.
    #[error("Failed to read spreadsheet {path}: {message}")]
    Spreadsheet { path: PathBuf, message: String },

    /// A spreadsheet contains no worksheets at all.
    #[error("Spreadsheet has no worksheets: {0}")]
    EmptyWorkbook(PathBuf),

    /// A column that must be present in a header row is missing.
    #[error("Column {column} not found in {path}")]
    MissingColumn { path: PathBuf, column: String },

    /// A cell that must hold a number holds something else.
    #[error("Invalid number in column {column} of {path}: {value:?}")]
    InvalidNumber {
        path: PathBuf,
        column: String,
        value: String,
    },

    /// A data line carries more fields than the header declares.
    #[error("Expected {expected} fields in line {line} of {path}, saw {found}")]
    TooManyFields {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the consolidator crates.
pub type Result<T> = std::result::Result<T, ConsolidateError>;
