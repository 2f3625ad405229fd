//! Output module for the artifacts a crawl hands to downstream consumers
//!
//! This module handles:
//! - The page manifest (`sources_meta.json`)
//! - The assembled corpus document (`sources.md`)
//! - The diagnostic report (`crawl_debug.json`) and its console rendering

mod corpus;
mod manifest;
pub mod report;

pub use corpus::{rebuild_corpus, render_corpus, write_corpus, CORPUS_FILE};
pub use manifest::{load_manifest, write_manifest, PageRecord, SourcesMeta, MANIFEST_FILE};
pub use report::{
    load_report, print_report, write_report, CrawlCounters, CrawlReport, SkipSamples,
    REPORT_FILE,
};

use crate::storage::StorageError;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
