//! Corpus document generation
//!
//! The corpus is the single markdown file the retrieval side chunks and
//! indexes. Only pages whose text was stored appear in it.

use crate::output::manifest::{load_manifest, SourcesMeta};
use crate::output::OutputResult;
use crate::storage::ArtifactStore;

/// File name of the corpus inside the site directory
pub const CORPUS_FILE: &str = "sources.md";

/// Formats the corpus document for a manifest
///
/// # Arguments
///
/// * `meta` - The manifest, with page text loaded
///
/// # Returns
///
/// The markdown text, always ending in a single newline
pub fn render_corpus(meta: &SourcesMeta) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {}\n\n", meta.name));
    md.push_str(&format!("Website: {}\n", meta.website));
    md.push_str(&format!("Fetched at: {}\n\n", meta.fetched_at));

    let stored: Vec<_> = meta.pages.iter().filter(|p| p.is_stored()).collect();
    if stored.is_empty() {
        md.push_str("No usable content.\n");
    }

    for page in stored {
        md.push_str(&format!("## Page {}\n", page.id));

        let title = page.title.trim();
        if !title.is_empty() {
            md.push_str(&format!("Title: {}\n\n", title));
        }
        if page.rendered {
            md.push_str("(rendered via JS)\n\n");
        }

        md.push_str(page.text.trim());
        md.push_str("\n\n");
        md.push_str("Source:\n");
        md.push_str(&format!("- {}\n\n", page.url));
    }

    let mut out = md.trim().to_string();
    out.push('\n');
    out
}

/// Writes the corpus document for a manifest
pub fn write_corpus(store: &mut dyn ArtifactStore, meta: &SourcesMeta) -> OutputResult<()> {
    store.write_artifact(CORPUS_FILE, &render_corpus(meta))?;
    Ok(())
}

/// Rebuilds the corpus from the manifest and extracted text on disk
///
/// Returns the number of pages included.
pub fn rebuild_corpus(store: &mut dyn ArtifactStore) -> OutputResult<usize> {
    let meta = load_manifest(store)?;
    write_corpus(store, &meta)?;
    Ok(meta.stored_count())
}
