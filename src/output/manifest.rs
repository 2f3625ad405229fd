//! Page manifest
//!
//! One record per page that produced HTML, in fetch order. Paths are
//! relative to the site directory so the whole directory can be moved.

use crate::output::OutputResult;
use crate::storage::ArtifactStore;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// File name of the manifest inside the site directory
pub const MANIFEST_FILE: &str = "sources_meta.json";

/// A fetched page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Sequential id starting at 1
    pub id: usize,

    pub url: String,

    /// Relative path of the raw HTML
    pub raw_file: String,

    /// Relative path of the extracted text; empty when the text was not stored
    pub text_file: String,

    #[serde(default)]
    pub title: String,

    /// Whether the stored HTML came from the rendering engine
    #[serde(default)]
    pub rendered: bool,

    /// Extracted text; empty when `text_file` is empty
    #[serde(skip)]
    pub text: String,
}

impl PageRecord {
    /// Whether this page contributes to the corpus
    pub fn is_stored(&self) -> bool {
        !self.text_file.is_empty() && !self.text.trim().is_empty()
    }
}

/// Manifest written at the end of a crawl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesMeta {
    pub slug: String,
    pub name: String,
    pub website: String,

    /// RFC 3339 UTC timestamp with second precision
    pub fetched_at: String,

    pub pages: Vec<PageRecord>,
}

impl SourcesMeta {
    /// Builds a manifest stamped with the current time
    pub fn new(slug: &str, name: &str, website: &str, pages: Vec<PageRecord>) -> Self {
        Self {
            slug: slug.to_string(),
            name: name.to_string(),
            website: website.to_string(),
            fetched_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false),
            pages,
        }
    }

    /// Number of pages whose text was stored
    pub fn stored_count(&self) -> usize {
        self.pages.iter().filter(|p| p.is_stored()).count()
    }
}

/// Writes the manifest as pretty-printed JSON
pub fn write_manifest(store: &mut dyn ArtifactStore, meta: &SourcesMeta) -> OutputResult<()> {
    let json = serde_json::to_string_pretty(meta)?;
    store.write_artifact(MANIFEST_FILE, &json)?;
    Ok(())
}

/// Loads the manifest and reads each stored page's text back in
///
/// A missing text file leaves that record's text empty.
pub fn load_manifest(store: &dyn ArtifactStore) -> OutputResult<SourcesMeta> {
    let json = store.read_artifact(MANIFEST_FILE)?;
    let mut meta: SourcesMeta = serde_json::from_str(&json)?;

    for page in meta.pages.iter_mut().filter(|p| !p.text_file.is_empty()) {
        match store.read_artifact(&page.text_file) {
            Ok(text) => page.text = text,
            Err(e) => {
                tracing::warn!("Missing text for page {} ({}): {}", page.id, page.url, e);
            }
        }
    }

    Ok(meta)
}
