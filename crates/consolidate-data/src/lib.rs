//! Ingestion layer for the transaction consolidator.
//!
//! Walks the `<year>/<month>/<day>/<file>` tree, sniffs delimiters,
//! reconciles each file's header against the required columns, reads the
//! usable subset, concatenates everything and writes the enriched result.

pub mod aggregator;
pub mod pipeline;
pub mod rates;
pub mod reader;
pub mod sniffer;
pub mod walker;
pub mod writer;

pub use consolidate_core as core;
