//! Processing summary returned to the caller after a successful run.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ProcessingStats;

/// Outcome of a run that produced an output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub stats: ProcessingStats,
    /// Where the consolidated dataset was written.
    pub output_path: PathBuf,
    /// Number of data rows written.
    pub rows_written: usize,
    /// Sum of the `Total_in_USD` column.
    pub total_usd: f64,
    /// When the summary was produced.
    pub generated_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn new(
        stats: ProcessingStats,
        output_path: impl Into<PathBuf>,
        rows_written: usize,
        total_usd: f64,
    ) -> Self {
        Self {
            stats,
            output_path: output_path.into(),
            rows_written,
            total_usd,
            generated_at: Utc::now(),
        }
    }

    /// The five summary lines, in the order the report has always used.
    pub fn lines(&self) -> [String; 5] {
        [
            format!("Total CSV files processed: {}", self.stats.csv_seen),
            format!("Total CSV files read successfully: {}", self.stats.csv_ok),
            format!("Total Excel files processed: {}", self.stats.excel_seen),
            format!(
                "Total Excel files read successfully: {}",
                self.stats.excel_ok
            ),
            format!("Data saved to {}", self.output_path.display()),
        ]
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}
