//! End-to-end consolidation run.
//!
//! Walk the tree, ingest every file, concatenate, then (only when something
//! was ingested) load exchange rates, enrich and write the output.

use std::path::Path;

use consolidate_core::continents::ContinentMap;
use consolidate_core::currency::ExchangeRateTable;
use consolidate_core::error::Result;
use consolidate_core::models::FileOutcome;
use consolidate_core::report::RunSummary;
use tracing::{debug, info, warn};

use crate::aggregator::Aggregator;
use crate::rates::load_exchange_rates;
use crate::reader::ingest_file;
use crate::walker::walk_day_files;
use crate::writer::{render_row, write_dataset};

const PREVIEW_ROWS: usize = 5;

/// Knobs for a single run.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Country → continent lookup used for the `Continent` column.
    pub continents: ContinentMap,
    /// Abort on the first file that fails to read.
    pub strict: bool,
    /// Fall back to an identity rate table when the rate file is unusable.
    pub lenient_rates: bool,
}

/// Consolidate every transaction file under `root` into `output_path`.
///
/// Returns `Ok(None)` when no file could be ingested; in that case the rate
/// file is not read and nothing is written.
pub fn process_data(
    root: &Path,
    rates_path: &Path,
    output_path: &Path,
    options: &PipelineOptions,
) -> Result<Option<RunSummary>> {
    let mut aggregator = Aggregator::new();
    for file in walk_day_files(root) {
        match ingest_file(&file) {
            FileOutcome::Failed { error, .. } if options.strict => return Err(error),
            outcome => aggregator.absorb(outcome),
        }
    }

    let (stats, dataset) = aggregator.finish();
    let Some(mut dataset) = dataset else {
        info!("No data found.");
        return Ok(None);
    };

    let rates = match load_exchange_rates(rates_path) {
        Ok(rates) => rates,
        Err(e) if options.lenient_rates => {
            warn!(
                "Could not load exchange rates from {}: {}. Totals are not converted.",
                rates_path.display(),
                e
            );
            ExchangeRateTable::identity()
        }
        Err(e) => return Err(e),
    };

    options.continents.apply(&mut dataset);
    rates.apply(&mut dataset);

    write_dataset(&dataset, output_path)?;
    info!("Data saved to {}", output_path.display());

    debug!("{}", dataset.headers().join(","));
    for row in dataset.rows.iter().take(PREVIEW_ROWS) {
        debug!("{}", render_row(&dataset, row).join(","));
    }

    let summary = RunSummary::new(stats, output_path, dataset.rows.len(), dataset.total_usd());
    for line in summary.lines().iter().take(4) {
        info!("{}", line);
    }
    debug!(
        "Rows written: {}, total in USD: {:.2}",
        summary.rows_written, summary.total_usd
    );
    Ok(Some(summary))
}
