//! Document Store Abstraction
//!
//! Read-only view of the capture pipeline's document store. The sync core
//! resolves queued document titles against it to materialize upload records
//! lazily; it never mutates documents.

use async_trait::async_trait;
use std::path::PathBuf;

/// A captured document: a title plus the ordered files belonging to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    title: String,
    files: Vec<PathBuf>,
}

impl Document {
    pub fn new(title: impl Into<String>, files: Vec<PathBuf>) -> Self {
        Self {
            title: title.into(),
            files,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Files in page order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Lookup contract against the document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the document with the given title, or `None` if it was
    /// deleted or never existed.
    async fn get_document(&self, title: &str) -> Option<Document>;
}
