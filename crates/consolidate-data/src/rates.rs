//! Exchange-rate file loading.
//!
//! The rate source starts with a fixed banner of [`BANNER_ROWS`] rows,
//! followed by a header row naming at least `CODE` and `RATE`. Spreadsheets
//! (first worksheet) and delimited text are both accepted.

use std::path::Path;

use consolidate_core::currency::ExchangeRateTable;
use consolidate_core::error::{ConsolidateError, Result};
use consolidate_core::models::FileKind;
use tracing::{debug, info};

use crate::reader::{header_cells, open_first_sheet, Cell};
use crate::sniffer::{sniff_sample, SAMPLE_BYTES};

/// Rows preceding the header in every rate source.
pub const BANNER_ROWS: usize = 6;
pub const CODE_COLUMN: &str = "CODE";
pub const RATE_COLUMN: &str = "RATE";

/// Load the exchange-rate table at `path`.
///
/// Any failure here is fatal to the caller's run: there is no per-row
/// recovery for an unreadable or malformed rate source.
pub fn load_exchange_rates(path: &Path) -> Result<ExchangeRateTable> {
    let pairs = match FileKind::from_path(path) {
        Some(FileKind::Csv) => read_csv_pairs(path)?,
        _ => read_sheet_pairs(path)?,
    };
    let table = ExchangeRateTable::from_pairs(pairs);
    info!(
        "Loaded {} exchange rates from {}",
        table.len(),
        path.display()
    );
    Ok(table)
}

/// Turn one data row into a `(code, rate)` pair. Rows without a code or
/// without a rate are ignored.
fn pair_from_cells(code: Cell, rate: Cell, path: &Path) -> Result<Option<(String, f64)>> {
    let Some(code) = code.into_text() else {
        return Ok(None);
    };
    match rate.into_number(path, RATE_COLUMN)? {
        Some(rate) => Ok(Some((code, rate))),
        None => {
            debug!("No rate for {} in {}", code, path.display());
            Ok(None)
        }
    }
}

fn find_column(headers: &[String], name: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| ConsolidateError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
}

// ── Spreadsheet source ────────────────────────────────────────────────────────

fn read_sheet_pairs(path: &Path) -> Result<Vec<(String, f64)>> {
    let range = open_first_sheet(path)?;
    // The range starts at the first non-empty cell; banner rows are counted
    // from the top of the sheet.
    let first_row = range.start().map_or(0, |(row, _)| row as usize);
    let skip = BANNER_ROWS.saturating_sub(first_row);

    let mut rows = range.rows().skip(skip);
    let headers: Vec<String> = rows
        .next()
        .map(|row| {
            row.iter()
                .map(|c| Cell::from_data(c).into_text().unwrap_or_default())
                .collect()
        })
        .unwrap_or_default();
    let code_idx = find_column(&headers, CODE_COLUMN, path)?;
    let rate_idx = find_column(&headers, RATE_COLUMN, path)?;

    let mut pairs = Vec::new();
    for row in rows {
        let code = row.get(code_idx).map_or(Cell::Empty, Cell::from_data);
        let rate = row.get(rate_idx).map_or(Cell::Empty, Cell::from_data);
        if let Some(pair) = pair_from_cells(code, rate, path)? {
            pairs.push(pair);
        }
    }
    Ok(pairs)
}

// ── Delimited text source ─────────────────────────────────────────────────────

fn read_csv_pairs(path: &Path) -> Result<Vec<(String, f64)>> {
    let content = std::fs::read_to_string(path).map_err(|source| ConsolidateError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    // Banner lines are skipped verbatim, blank or not.
    let body: String = content
        .split_inclusive('\n')
        .skip(BANNER_ROWS)
        .collect();

    // Banner text is free-form, so only the table itself is sampled.
    let sample = &body.as_bytes()[..body.len().min(SAMPLE_BYTES as usize)];
    let delimiter = sniff_sample(sample);
    debug!("Detected {} delimiter in {}", delimiter, path.display());

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());
    let headers = header_cells(reader.headers()?);
    let code_idx = find_column(&headers, CODE_COLUMN, path)?;
    let rate_idx = find_column(&headers, RATE_COLUMN, path)?;

    let mut pairs = Vec::new();
    for result in reader.records() {
        let record = result?;
        let cell = |idx: usize| match record.get(idx) {
            None | Some("") => Cell::Empty,
            Some(s) => Cell::Text(s.to_string()),
        };
        if let Some(pair) = pair_from_cells(cell(code_idx), cell(rate_idx), path)? {
            pairs.push(pair);
        }
    }
    Ok(pairs)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
