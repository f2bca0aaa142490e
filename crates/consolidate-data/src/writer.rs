//! CSV output of the consolidated dataset.

use std::fs::File;
use std::path::Path;

use consolidate_core::error::{ConsolidateError, Result};
use consolidate_core::formatting::format_float;
use consolidate_core::models::{ConsolidatedDataset, Row};

/// Write `dataset` to `path` as comma-separated text with a header row and
/// no index column. Absent values become empty fields.
pub fn write_dataset(dataset: &ConsolidatedDataset, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|source| ConsolidateError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(dataset.headers())?;
    for row in &dataset.rows {
        writer.write_record(render_row(dataset, row))?;
    }
    writer.flush().map_err(|source| ConsolidateError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Output fields for one row, aligned with [`ConsolidatedDataset::headers`].
pub fn render_row(dataset: &ConsolidatedDataset, row: &Row) -> Vec<String> {
    let mut fields: Vec<String> = dataset
        .columns
        .iter()
        .map(|&column| row.text(column).unwrap_or_default())
        .collect();
    fields.push(row.day.clone());
    fields.push(row.continent.clone().unwrap_or_default());
    fields.push(row.total_in_usd.map(format_float).unwrap_or_default());
    fields
}

// ── Tests ─────────────────────────────────────────────────────────────────────
