//! Package store abstraction consumed by the signing and verification flows.
//!
//! The core only ever reads a package: entries are enumerated or fetched by
//! relative path, and file content is read lazily. Archive formats live
//! behind implementations of [`PackageStore`]; the in-memory implementation
//! here covers tests and callers that already hold the bytes.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Lazily readable content of a single package entry.
#[async_trait]
pub trait EntryContent: Send + Sync {
    /// Read the entry's full decompressed byte content.
    async fn read(&self) -> Result<Bytes>;
}

struct BytesContent(Bytes);

#[async_trait]
impl EntryContent for BytesContent {
    async fn read(&self) -> Result<Bytes> {
        Ok(self.0.clone())
    }
}

/// A single entry of a package: a directory marker or a file with content.
#[derive(Clone)]
pub struct PackageEntry {
    /// Path of the entry relative to the package root, `/`-separated.
    pub relative_path: String,
    /// Whether the entry is a directory marker. Directories carry no content.
    pub is_dir: bool,
    content: Arc<dyn EntryContent>,
}

impl PackageEntry {
    /// Lift an in-memory byte buffer into a file entry.
    pub fn file(relative_path: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            relative_path: relative_path.into(),
            is_dir: false,
            content: Arc::new(BytesContent(content.into())),
        }
    }

    /// Create a directory marker entry.
    pub fn dir(relative_path: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            is_dir: true,
            content: Arc::new(BytesContent(Bytes::new())),
        }
    }

    /// Create a file entry with custom lazily-read content.
    pub fn with_content(relative_path: impl Into<String>, content: Arc<dyn EntryContent>) -> Self {
        Self {
            relative_path: relative_path.into(),
            is_dir: false,
            content,
        }
    }

    /// Read the entry's full byte content.
    ///
    /// # Errors
    ///
    /// Propagates the underlying store's I/O error; such failures abort the
    /// whole operation rather than a single envelope's verdict.
    pub async fn read_content(&self) -> Result<Bytes> {
        self.content.read().await
    }
}

impl std::fmt::Debug for PackageEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageEntry")
            .field("relative_path", &self.relative_path)
            .field("is_dir", &self.is_dir)
            .finish_non_exhaustive()
    }
}

/// Read-only view of a package's contents.
#[async_trait]
pub trait PackageStore: Send + Sync {
    /// Enumerate every entry of the package.
    async fn entries(&self) -> Result<Vec<PackageEntry>>;

    /// Fetch a single entry by relative path, or `None` if absent.
    async fn entry(&self, relative_path: &str) -> Result<Option<PackageEntry>>;
}

/// In-memory package store backed by a plain entry list.
#[derive(Debug, Clone, Default)]
pub struct MemoryPackage {
    entries: Vec<PackageEntry>,
}

impl MemoryPackage {
    /// Create an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: add a file entry.
    pub fn with_file(mut self, relative_path: impl Into<String>, content: impl Into<Bytes>) -> Self {
        self.insert_file(relative_path, content);
        self
    }

    /// Builder-style: add a directory marker.
    pub fn with_dir(mut self, relative_path: impl Into<String>) -> Self {
        self.entries.push(PackageEntry::dir(relative_path));
        self
    }

    /// Add a file entry, replacing any existing entry at the same path.
    pub fn insert_file(&mut self, relative_path: impl Into<String>, content: impl Into<Bytes>) {
        let entry = PackageEntry::file(relative_path, content);
        self.entries
            .retain(|e| e.relative_path != entry.relative_path);
        self.entries.push(entry);
    }
}

#[async_trait]
impl PackageStore for MemoryPackage {
    async fn entries(&self) -> Result<Vec<PackageEntry>> {
        Ok(self.entries.clone())
    }

    async fn entry(&self, relative_path: &str) -> Result<Option<PackageEntry>> {
        Ok(self
            .entries
            .iter()
            .find(|e| e.relative_path == relative_path)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_and_read() {
        let pkg = MemoryPackage::new()
            .with_file("a.txt", "hello")
            .with_dir("sub");

        let entry = pkg.entry("a.txt").await.unwrap().unwrap();
        assert!(!entry.is_dir);
        assert_eq!(entry.read_content().await.unwrap(), Bytes::from("hello"));

        assert!(pkg.entry("missing.txt").await.unwrap().is_none());
        assert_eq!(pkg.entries().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn insert_replaces_existing_path() {
        let mut pkg = MemoryPackage::new().with_file("a.txt", "hello");
        pkg.insert_file("a.txt", "HELLO");

        let entries = pkg.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].read_content().await.unwrap(),
            Bytes::from("HELLO")
        );
    }
}
