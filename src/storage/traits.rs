//! Storage traits and error types
//!
//! This module defines the trait interface for artifact stores and
//! associated error types.

use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid artifact path: {0}")]
    InvalidPath(String),

    #[error("Artifact not found: {0}")]
    NotFound(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for artifact store implementations
///
/// All paths handed in or returned are relative to the site directory and
/// use `/` separators, e.g. `raw/pages/001.html`.
pub trait ArtifactStore {
    /// Site directory every artifact lives under
    fn root(&self) -> &Path;

    /// Writes the raw HTML of page `id`; returns its relative path
    fn write_raw_page(&mut self, id: usize, html: &str) -> StorageResult<String>;

    /// Writes the extracted text of page `id`; returns its relative path
    fn write_extracted(&mut self, id: usize, text: &str) -> StorageResult<String>;

    /// Replaces a whole artifact (manifest, corpus, report) at once
    fn write_artifact(&mut self, relative: &str, contents: &str) -> StorageResult<()>;

    /// Reads an artifact back
    fn read_artifact(&self, relative: &str) -> StorageResult<String>;
}
