//! Concatenation of per-file row sets into one consolidated dataset.

use std::collections::BTreeSet;

use consolidate_core::models::{Column, ConsolidatedDataset, FileOutcome, ProcessingStats, Row};

// ── Aggregator ────────────────────────────────────────────────────────────────

/// Accumulates file outcomes in traversal order.
///
/// Counters are updated for every outcome; rows are kept only for ingested
/// files. The final column set is the union of every ingested file's used
/// columns, in schema order.
#[derive(Debug, Default)]
pub struct Aggregator {
    stats: ProcessingStats,
    columns: BTreeSet<Column>,
    rows: Vec<Row>,
    files_ingested: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one file outcome into the running state.
    pub fn absorb(&mut self, outcome: FileOutcome) {
        self.stats.record(&outcome);
        if let FileOutcome::Ingested { rows, .. } = outcome {
            self.columns.extend(rows.columns);
            self.rows.extend(rows.rows);
            self.files_ingested += 1;
        }
    }

    pub fn stats(&self) -> ProcessingStats {
        self.stats
    }

    pub fn files_ingested(&self) -> usize {
        self.files_ingested
    }

    /// Final counters plus the dataset, or `None` when no file was ingested.
    ///
    /// A dataset may be empty of rows: a header-only file still counts.
    pub fn finish(self) -> (ProcessingStats, Option<ConsolidatedDataset>) {
        if self.files_ingested == 0 {
            return (self.stats, None);
        }
        let dataset = ConsolidatedDataset {
            columns: self.columns.into_iter().collect(),
            rows: self.rows,
        };
        (self.stats, Some(dataset))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
