//! Storage module for persisting crawl artifacts
//!
//! This module handles writing everything a crawl produces, including:
//! - Raw HTML per page
//! - Extracted text per page
//! - Whole-file artifacts (manifest, corpus, diagnostic report), replaced
//!   atomically

mod fs;
mod traits;

pub use fs::{page_file_name, FsStore, EXTRACTED_DIR, RAW_DIR};
pub use traits::{ArtifactStore, StorageError, StorageResult};
