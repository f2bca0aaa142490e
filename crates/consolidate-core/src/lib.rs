//! Domain model for the transaction consolidator.
//!
//! Holds the required column schema, per-file records and outcomes, the
//! consolidated dataset, exchange-rate and continent enrichment, the run
//! summary and the command-line settings. Nothing in here touches the
//! transaction directory tree; that lives in `consolidate-data`.

pub mod continents;
pub mod currency;
pub mod error;
pub mod formatting;
pub mod models;
pub mod report;
pub mod settings;

pub use error::{ConsolidateError, Result};
