//! Schema reconciliation and row ingestion for a single transaction file.
//!
//! Each discovered file is turned into a [`FileOutcome`]: its header is read
//! on its own first, intersected with the required columns, and only then is
//! the full file read restricted to that intersection. Nothing in here
//! panics or aborts the run; failures come back as
//! [`FileOutcome::Failed`].

use std::fs::File;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use consolidate_core::error::{ConsolidateError, Result};
use consolidate_core::formatting::format_cell_number;
use consolidate_core::models::{
    reconcile_columns, Column, Delimiter, FileKind, FileOutcome, FileRecord, Row, RowSet,
    SkipReason,
};
use tracing::{error, info, warn};

use crate::sniffer::sniff_delimiter;
use crate::walker::DayFile;

const BOM: char = '\u{feff}';

// ── Public API ────────────────────────────────────────────────────────────────

/// Classify, reconcile and read one file.
pub fn ingest_file(file: &DayFile) -> FileOutcome {
    let path = &file.path;
    let name = display_name(path);
    info!("      Processing file: {}", name);

    let Some(kind) = FileKind::from_path(path) else {
        warn!("      Skipping non-CSV/Excel file: {}", name);
        return FileOutcome::Skipped {
            path: path.clone(),
            kind: None,
            reason: SkipReason::UnsupportedExtension,
        };
    };

    let record = match reconcile_file(file, kind) {
        Ok(record) => record,
        Err(error) => return failed(file, kind, error),
    };

    if record.used_columns.is_empty() {
        warn!("      Skipping file {}: No required columns found.", name);
        return FileOutcome::Skipped {
            path: path.clone(),
            kind: Some(kind),
            reason: SkipReason::NoRequiredColumns,
        };
    }

    match read_rows(&record) {
        Ok(rows) => {
            info!("      Successfully read: {}", name);
            FileOutcome::Ingested { record, rows }
        }
        Err(error) => failed(file, kind, error),
    }
}

/// Build the [`FileRecord`] for `file`: sniff (CSV only), read the header
/// and intersect it with the required columns.
pub fn reconcile_file(file: &DayFile, kind: FileKind) -> Result<FileRecord> {
    let name = display_name(&file.path);
    let delimiter = match kind {
        FileKind::Csv => Some(sniff_delimiter(&file.path)),
        FileKind::Spreadsheet => None,
    };

    let available_columns = read_header(&file.path, kind, delimiter)?;
    info!(
        "      Available columns in {}: {:?}",
        name, available_columns
    );

    let used_columns = reconcile_columns(&available_columns);
    let used_names: Vec<&str> = used_columns.iter().map(Column::as_str).collect();
    info!("      Columns to be used from {}: {:?}", name, used_names);

    Ok(FileRecord {
        path: file.path.clone(),
        day: file.day.clone(),
        kind,
        delimiter,
        available_columns,
        used_columns,
    })
}

/// Read only the header row of a file.
pub fn read_header(path: &Path, kind: FileKind, delimiter: Option<Delimiter>) -> Result<Vec<String>> {
    match kind {
        FileKind::Csv => {
            let mut reader = open_csv(path, delimiter.unwrap_or_default())?;
            Ok(header_cells(reader.headers()?))
        }
        FileKind::Spreadsheet => {
            let range = open_first_sheet(path)?;
            Ok(range
                .rows()
                .next()
                .map(|row| row.iter().map(|c| cell_text(c).unwrap_or_default()).collect())
                .unwrap_or_default())
        }
    }
}

/// Read every data row of `record`, keeping only its used columns and
/// tagging each row with the record's day label.
pub fn read_rows(record: &FileRecord) -> Result<RowSet> {
    let rows = match record.kind {
        FileKind::Csv => read_csv_rows(record)?,
        FileKind::Spreadsheet => read_sheet_rows(record)?,
    };
    Ok(RowSet {
        columns: record.used_columns.clone(),
        rows,
    })
}

// ── Cell values ───────────────────────────────────────────────────────────────

/// A single source cell, independent of file format.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    fn from_field(field: Option<&str>) -> Self {
        match field {
            None | Some("") => Cell::Empty,
            Some(s) => Cell::Text(s.to_string()),
        }
    }

    pub(crate) fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::String(s) if s.is_empty() => Cell::Empty,
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Text(if *b { "True" } else { "False" }.to_string()),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub(crate) fn into_text(self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) => Some(format_cell_number(n)),
            Cell::Text(s) => Some(s),
        }
    }

    /// Numeric value of the cell; text must parse as a number.
    pub(crate) fn into_number(self, path: &Path, column: &str) -> Result<Option<f64>> {
        match self {
            Cell::Empty => Ok(None),
            Cell::Number(n) => Ok(Some(n)),
            Cell::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| ConsolidateError::InvalidNumber {
                        path: path.to_path_buf(),
                        column: column.to_string(),
                        value: s,
                    })
            }
        }
    }
}

/// Text form of a spreadsheet cell, `None` when empty.
pub(crate) fn cell_text(data: &Data) -> Option<String> {
    Cell::from_data(data).into_text()
}

fn assign(row: &mut Row, column: Column, cell: Cell, path: &Path) -> Result<()> {
    match column {
        Column::Transaction => row.transaction = cell.into_number(path, column.as_str())?,
        Column::Country => row.country = cell.into_text(),
        Column::Currency => row.currency = cell.into_text(),
        Column::Client => row.client = cell.into_text(),
    }
    Ok(())
}

/// Position of each used column in `headers`.
fn column_positions(
    headers: &[String],
    columns: &[Column],
    path: &Path,
) -> Result<Vec<(Column, usize)>> {
    columns
        .iter()
        .map(|&column| {
            headers
                .iter()
                .position(|h| h == column.as_str())
                .map(|idx| (column, idx))
                .ok_or_else(|| ConsolidateError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                })
        })
        .collect()
}

// ── Delimited text ────────────────────────────────────────────────────────────

pub(crate) fn open_csv(path: &Path, delimiter: Delimiter) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|source| ConsolidateError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(true)
        .flexible(true)
        .from_reader(file))
}

/// Header cells with a leading byte-order mark removed.
pub(crate) fn header_cells(record: &csv::StringRecord) -> Vec<String> {
    record
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches(BOM).to_string()
            } else {
                h.to_string()
            }
        })
        .collect()
}

fn read_csv_rows(record: &FileRecord) -> Result<Vec<Row>> {
    let path = &record.path;
    let mut reader = open_csv(path, record.delimiter.unwrap_or_default())?;
    let headers = header_cells(reader.headers()?);
    let positions = column_positions(&headers, &record.used_columns, path)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let fields = result?;
        if fields.len() > headers.len() {
            return Err(ConsolidateError::TooManyFields {
                path: path.clone(),
                line: fields.position().map(|p| p.line()).unwrap_or_default(),
                expected: headers.len(),
                found: fields.len(),
            });
        }

        let mut row = Row {
            day: record.day.clone(),
            ..Default::default()
        };
        for &(column, idx) in &positions {
            assign(&mut row, column, Cell::from_field(fields.get(idx)), path)?;
        }
        rows.push(row);
    }

    Ok(rows)
}

// ── Spreadsheets ──────────────────────────────────────────────────────────────

/// Open a workbook and read its first worksheet.
pub(crate) fn open_first_sheet(path: &Path) -> Result<Range<Data>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| spreadsheet_error(path, e))?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ConsolidateError::EmptyWorkbook(path.to_path_buf()))?;
    workbook
        .worksheet_range(&first)
        .map_err(|e| spreadsheet_error(path, e))
}

fn spreadsheet_error(path: &Path, e: impl std::fmt::Display) -> ConsolidateError {
    ConsolidateError::Spreadsheet {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

fn read_sheet_rows(record: &FileRecord) -> Result<Vec<Row>> {
    let path = &record.path;
    let range = open_first_sheet(path)?;
    let mut sheet_rows = range.rows();

    let headers: Vec<String> = sheet_rows
        .next()
        .map(|row| row.iter().map(|c| cell_text(c).unwrap_or_default()).collect())
        .unwrap_or_default();
    let positions = column_positions(&headers, &record.used_columns, path)?;

    let mut rows = Vec::new();
    for cells in sheet_rows {
        let values: Vec<(Column, Cell)> = positions
            .iter()
            .map(|&(column, idx)| (column, cells.get(idx).map_or(Cell::Empty, Cell::from_data)))
            .collect();
        if values.iter().all(|(_, cell)| cell.is_empty()) {
            continue;
        }

        let mut row = Row {
            day: record.day.clone(),
            ..Default::default()
        };
        for (column, cell) in values {
            assign(&mut row, column, cell, path)?;
        }
        rows.push(row);
    }

    Ok(rows)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn failed(file: &DayFile, kind: FileKind, error: ConsolidateError) -> FileOutcome {
    error!(
        "      Error reading {}: {}",
        display_name(&file.path),
        error
    );
    FileOutcome::Failed {
        path: file.path.clone(),
        kind,
        error,
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    const REQUIRED: [Column; 4] = consolidate_core::models::REQUIRED_SCHEMA;

    fn write_file(dir: &Path, name: &str, content: &str) -> DayFile {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        DayFile {
            path,
            day: "15".to_string(),
        }
    }

    /// Cells that parse as numbers are written as numbers.
    fn write_xlsx(dir: &Path, name: &str, rows: &[&[&str]]) -> DayFile {
        let path = dir.join(name);
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                match value.parse::<f64>() {
                    Ok(n) => sheet.write_number(r as u32, c as u16, n).unwrap(),
                    Err(_) => sheet.write_string(r as u32, c as u16, *value).unwrap(),
                };
            }
        }
        workbook.save(&path).unwrap();
        DayFile {
            path,
            day: "15".to_string(),
        }
    }

    fn ingested(outcome: FileOutcome) -> (FileRecord, RowSet) {
        match outcome {
            FileOutcome::Ingested { record, rows } => (record, rows),
            other => panic!("expected ingested outcome, got {:?}", other),
        }
    }

    // ── Classification ────────────────────────────────────────────────────────

    #[test]
    fn test_unsupported_extension_is_skipped_without_kind() {
        let dir = TempDir::new().unwrap();
        let file = write_file(dir.path(), "notes.txt", "Transaction\n1\n");

        match ingest_file(&file) {
            FileOutcome::Skipped { kind, reason, .. } => {
                assert_eq!(kind, None);
                assert_eq!(reason, SkipReason::UnsupportedExtension);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    // ── CSV ───────────────────────────────────────────────────────────────────

    #[test]
    fn test_csv_semicolon_end_to_end_row() {
        let dir = TempDir::new().unwrap();
        let file = write_file(
            dir.path(),
            "a.csv",
            "Transaction;Country;Currency;Client\n100;US;USD;Bob\n",
        );

        let (record, set) = ingested(ingest_file(&file));
        assert_eq!(record.delimiter, Some(Delimiter::Semicolon));
        assert_eq!(record.kind, FileKind::Csv);
        assert_eq!(set.columns, REQUIRED.to_vec());
        assert_eq!(
            set.rows,
            vec![Row {
                transaction: Some(100.0),
                country: Some("US".to_string()),
                currency: Some("USD".to_string()),
                client: Some("Bob".to_string()),
                day: "15".to_string(),
                ..Default::default()
            }]
        );
    }

    #[test]
    fn test_csv_subset_of_columns_in_schema_order() {
        let dir = TempDir::new().unwrap();
        let file = write_file(
            dir.path(),
            "b.csv",
            "Client,Notes,Transaction\nAlice,hello,12.5\nCarol,,7\n",
        );

        let (record, set) = ingested(ingest_file(&file));
        assert_eq!(
            record.available_columns,
            vec!["Client".to_string(), "Notes".to_string(), "Transaction".to_string()]
        );
        assert_eq!(set.columns, vec![Column::Transaction, Column::Client]);
        assert_eq!(set.rows.len(), 2);
        assert_eq!(set.rows[0].transaction, Some(12.5));
        assert_eq!(set.rows[0].client.as_deref(), Some("Alice"));
        assert_eq!(set.rows[0].country, None);
        assert_eq!(set.rows[1].transaction, Some(7.0));
    }

    #[test]
    fn test_csv_no_required_columns_is_skipped_with_kind() {
        let dir = TempDir::new().unwrap();
        let file = write_file(dir.path(), "c.csv", "Amount,Where\n1,US\n");

        match ingest_file(&file) {
            FileOutcome::Skipped { kind, reason, .. } => {
                assert_eq!(kind, Some(FileKind::Csv));
                assert_eq!(reason, SkipReason::NoRequiredColumns);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_csv_non_numeric_transaction_fails_file() {
        let dir = TempDir::new().unwrap();
        let file = write_file(dir.path(), "d.csv", "Transaction,Client\nten,Bob\n");

        match ingest_file(&file) {
            FileOutcome::Failed { kind, error, .. } => {
                assert_eq!(kind, FileKind::Csv);
                assert!(matches!(error, ConsolidateError::InvalidNumber { .. }));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_csv_extra_fields_fail_file() {
        let dir = TempDir::new().unwrap();
        let file = write_file(dir.path(), "e.csv", "Transaction,Client\n1,Bob,extra\n");

        match ingest_file(&file) {
            FileOutcome::Failed { error, .. } => {
                assert!(matches!(
                    error,
                    ConsolidateError::TooManyFields {
                        expected: 2,
                        found: 3,
                        ..
                    }
                ));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_csv_short_rows_and_blank_lines() {
        let dir = TempDir::new().unwrap();
        let file = write_file(
            dir.path(),
            "f.csv",
            "Transaction,Country,Client\n5,FR\n\n6,DE,Eve\n",
        );

        let (_, set) = ingested(ingest_file(&file));
        assert_eq!(set.rows.len(), 2);
        assert_eq!(set.rows[0].client, None);
        assert_eq!(set.rows[1].client.as_deref(), Some("Eve"));
    }

    #[test]
    fn test_csv_bom_is_stripped_from_header() {
        let dir = TempDir::new().unwrap();
        let file = write_file(dir.path(), "g.csv", "\u{feff}Transaction,Client\n3,Zed\n");

        let (record, set) = ingested(ingest_file(&file));
        assert_eq!(record.used_columns, vec![Column::Transaction, Column::Client]);
        assert_eq!(set.rows[0].transaction, Some(3.0));
    }

    #[test]
    fn test_csv_invalid_utf8_fails_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("h.csv");
        std::fs::write(&path, b"Transaction,Client\n1,\xff\xfe\n").unwrap();
        let file = DayFile {
            path,
            day: "15".to_string(),
        };

        assert!(matches!(ingest_file(&file), FileOutcome::Failed { .. }));
    }

    #[test]
    fn test_csv_header_only_is_ingested_with_no_rows() {
        let dir = TempDir::new().unwrap();
        let file = write_file(dir.path(), "i.csv", "Transaction,Currency\n");

        let (_, set) = ingested(ingest_file(&file));
        assert!(set.rows.is_empty());
        assert_eq!(set.columns, vec![Column::Transaction, Column::Currency]);
    }

    #[test]
    fn test_read_header_missing_file_is_file_read_error() {
        let err = read_header(
            &PathBuf::from("/nonexistent/a.csv"),
            FileKind::Csv,
            Some(Delimiter::Comma),
        )
        .unwrap_err();
        assert!(matches!(err, ConsolidateError::FileRead { .. }));
    }

    // ── Spreadsheets ──────────────────────────────────────────────────────────

    #[test]
    fn test_xlsx_ingest() {
        let dir = TempDir::new().unwrap();
        let file = write_xlsx(
            dir.path(),
            "t.xlsx",
            &[
                &["Country", "Transaction", "Currency", "Other"],
                &["DE", "250", "EUR", "x"],
                &["", "", "", ""],
                &["JP", "1000", "JPY", "y"],
            ],
        );

        let (record, set) = ingested(ingest_file(&file));
        assert_eq!(record.kind, FileKind::Spreadsheet);
        assert_eq!(record.delimiter, None);
        assert_eq!(
            set.columns,
            vec![Column::Transaction, Column::Country, Column::Currency]
        );
        assert_eq!(set.rows.len(), 2);
        assert_eq!(set.rows[0].transaction, Some(250.0));
        assert_eq!(set.rows[0].country.as_deref(), Some("DE"));
        assert_eq!(set.rows[1].currency.as_deref(), Some("JPY"));
        assert!(set.rows.iter().all(|r| r.day == "15"));
    }

    #[test]
    fn test_xlsx_numeric_client_becomes_text() {
        let dir = TempDir::new().unwrap();
        let file = write_xlsx(
            dir.path(),
            "n.xlsx",
            &[&["Transaction", "Client"], &["1", "4021"]],
        );

        let (_, set) = ingested(ingest_file(&file));
        assert_eq!(set.rows[0].client.as_deref(), Some("4021"));
    }

    #[test]
    fn test_xlsx_without_required_columns_is_skipped() {
        let dir = TempDir::new().unwrap();
        let file = write_xlsx(dir.path(), "s.xlsx", &[&["Amount"], &["1"]]);

        match ingest_file(&file) {
            FileOutcome::Skipped { kind, reason, .. } => {
                assert_eq!(kind, Some(FileKind::Spreadsheet));
                assert_eq!(reason, SkipReason::NoRequiredColumns);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_corrupt_xlsx_fails_file() {
        let dir = TempDir::new().unwrap();
        let file = write_file(dir.path(), "broken.xlsx", "this is not a zip archive");

        match ingest_file(&file) {
            FileOutcome::Failed { kind, error, .. } => {
                assert_eq!(kind, FileKind::Spreadsheet);
                assert!(matches!(error, ConsolidateError::Spreadsheet { .. }));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_legacy_xls_goes_through_spreadsheet_reader() {
        let dir = TempDir::new().unwrap();
        let file = write_file(dir.path(), "old.xls", "Transaction,Country\n1,US\n");

        let outcome = ingest_file(&file);
        assert_eq!(outcome.kind(), Some(FileKind::Spreadsheet));
        match outcome {
            FileOutcome::Failed { error, .. } => {
                assert!(matches!(error, ConsolidateError::Spreadsheet { .. }));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    // ── Cell ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_cell_into_number() {
        let path = Path::new("x.csv");
        assert_eq!(
            Cell::Text(" 42.5 ".to_string()).into_number(path, "Transaction").unwrap(),
            Some(42.5)
        );
        assert_eq!(Cell::Empty.into_number(path, "Transaction").unwrap(), None);
        assert!(Cell::Text("abc".to_string())
            .into_number(path, "Transaction")
            .is_err());
    }

    #[test]
    fn test_cell_from_data() {
        assert_eq!(Cell::from_data(&Data::Int(7)), Cell::Number(7.0));
        assert_eq!(Cell::from_data(&Data::String(String::new())), Cell::Empty);
        assert_eq!(
            Cell::from_data(&Data::Bool(true)).into_text(),
            Some("True".to_string())
        );
    }
}
