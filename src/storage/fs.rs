//! Filesystem artifact store
//!
//! Layout under `<output>/<slug>/`:
//!
//! ```text
//! raw/pages/001.html
//! extracted/001.txt
//! sources_meta.json
//! sources.md
//! crawl_debug.json
//! ```

use crate::storage::traits::{ArtifactStore, StorageError, StorageResult};
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// Directory for raw HTML, relative to the site directory
pub const RAW_DIR: &str = "raw/pages";

/// Directory for extracted text, relative to the site directory
pub const EXTRACTED_DIR: &str = "extracted";

/// File name of page `id`: zero-padded to three digits
pub fn page_file_name(id: usize, extension: &str) -> String {
    format!("{:03}.{}", id, extension)
}

/// Artifact store rooted at a site directory on disk
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Opens `<output_dir>/<slug>`, creating the page directories
    pub fn open(output_dir: &Path, slug: &str) -> StorageResult<Self> {
        let store = Self {
            root: output_dir.join(slug),
        };
        for dir in [RAW_DIR, EXTRACTED_DIR] {
            let path = store.root.join(dir);
            fs::create_dir_all(&path).map_err(|e| io_error(&path, e))?;
        }
        Ok(store)
    }

    /// Opens an existing site directory without creating anything
    pub fn existing(output_dir: &Path, slug: &str) -> StorageResult<Self> {
        let root = output_dir.join(slug);
        if !root.is_dir() {
            return Err(StorageError::NotFound(root.display().to_string()));
        }
        Ok(Self { root })
    }

    /// Resolves a relative artifact path, refusing anything that escapes the root
    fn resolve(&self, relative: &str) -> StorageResult<PathBuf> {
        let path = Path::new(relative);
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative.is_empty() || escapes {
            return Err(StorageError::InvalidPath(relative.to_string()));
        }
        Ok(self.root.join(path))
    }

    /// Writes to a temporary sibling and renames it into place
    fn write_atomic(&self, relative: &str, contents: &str) -> StorageResult<()> {
        let target = self.resolve(relative)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        let tmp = target.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp).map_err(|e| io_error(&tmp, e))?;
            file.write_all(contents.as_bytes())
                .map_err(|e| io_error(&tmp, e))?;
            file.sync_all().map_err(|e| io_error(&tmp, e))?;
        }
        fs::rename(&tmp, &target).map_err(|e| io_error(&target, e))?;
        Ok(())
    }
}

impl ArtifactStore for FsStore {
    fn root(&self) -> &Path {
        &self.root
    }

    fn write_raw_page(&mut self, id: usize, html: &str) -> StorageResult<String> {
        let relative = format!("{}/{}", RAW_DIR, page_file_name(id, "html"));
        self.write_atomic(&relative, html)?;
        Ok(relative)
    }

    fn write_extracted(&mut self, id: usize, text: &str) -> StorageResult<String> {
        let relative = format!("{}/{}", EXTRACTED_DIR, page_file_name(id, "txt"));
        self.write_atomic(&relative, text)?;
        Ok(relative)
    }

    fn write_artifact(&mut self, relative: &str, contents: &str) -> StorageResult<()> {
        self.write_atomic(relative, contents)
    }

    fn read_artifact(&self, relative: &str) -> StorageResult<String> {
        let path = self.resolve(relative)?;
        fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.display().to_string())
            } else {
                io_error(&path, e)
            }
        })
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_page_file_name() {
        assert_eq!(page_file_name(1, "html"), "001.html");
        assert_eq!(page_file_name(42, "txt"), "042.txt");
        assert_eq!(page_file_name(1234, "txt"), "1234.txt");
    }

    #[test]
    fn test_open_creates_layout() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path(), "acme").unwrap();
        assert!(store.root().join("raw/pages").is_dir());
        assert!(store.root().join("extracted").is_dir());
    }

    #[test]
    fn test_write_and_read_pages() {
        let dir = TempDir::new().unwrap();
        let mut store = FsStore::open(dir.path(), "acme").unwrap();

        let raw = store.write_raw_page(3, "<html></html>").unwrap();
        assert_eq!(raw, "raw/pages/003.html");
        assert_eq!(store.read_artifact(&raw).unwrap(), "<html></html>");

        let text = store.write_extracted(3, "hello").unwrap();
        assert_eq!(text, "extracted/003.txt");
        assert_eq!(store.read_artifact(&text).unwrap(), "hello");
    }

    #[test]
    fn test_write_artifact_replaces_and_leaves_no_tmp() {
        let dir = TempDir::new().unwrap();
        let mut store = FsStore::open(dir.path(), "acme").unwrap();

        store.write_artifact("sources.md", "first").unwrap();
        store.write_artifact("sources.md", "second").unwrap();
        assert_eq!(store.read_artifact("sources.md").unwrap(), "second");
        assert!(!store.root().join("sources.tmp").exists());
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let dir = TempDir::new().unwrap();
        let mut store = FsStore::open(dir.path(), "acme").unwrap();

        assert!(matches!(
            store.write_artifact("../evil.txt", "x"),
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            store.read_artifact("/etc/passwd"),
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            store.read_artifact(""),
            Err(StorageError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path(), "acme").unwrap();
        assert!(matches!(
            store.read_artifact("sources_meta.json"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_existing_requires_directory() {
        let dir = TempDir::new().unwrap();
        assert!(FsStore::existing(dir.path(), "missing").is_err());
        FsStore::open(dir.path(), "acme").unwrap();
        assert!(FsStore::existing(dir.path(), "acme").is_ok());
    }
}
