//! Record store abstraction.
//!
//! The forum keeps every post, reply, channel and user as a JSON document tagged by
//! `type`. Backends provide revision-checked writes: an update or delete carrying a
//! stale revision fails with [`StoreError::VersionConflict`] and the caller is expected
//! to re-read before trying again.

#[cfg(feature = "couchdb")]
pub mod couch;
#[cfg(feature = "memory-store")]
pub mod memory;
pub mod timeout;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::models::{DocKind, Document};

#[cfg(feature = "couchdb")]
pub use couch::{CouchConfig, CouchStore};
#[cfg(feature = "memory-store")]
pub use memory::MemoryStore;
pub use timeout::TimeoutStore;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Revision conflict on document: {0}")]
    VersionConflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Id and revision of a persisted document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocMeta {
    pub id: String,
    pub rev: String,
}

/// Query over stored documents.
///
/// An empty kind list matches every type; otherwise the document type must be one of
/// the listed kinds (`$in`). The author filter is an equality match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    pub kinds: Vec<DocKind>,
    pub author: Option<String>,
}

impl Selector {
    pub fn kind(kind: DocKind) -> Self {
        Self {
            kinds: vec![kind],
            author: None,
        }
    }

    pub fn kinds(kinds: impl IntoIterator<Item = DocKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
            author: None,
        }
    }

    /// Posts and replies
    pub fn records() -> Self {
        Self::kinds([DocKind::Post, DocKind::Response])
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&doc.kind()) {
            return false;
        }

        match &self.author {
            Some(author) => doc.author() == Some(author.as_str()),
            None => true,
        }
    }
}

/// A document store with revision-checked writes.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new document. An empty id is replaced by a generated one; an id that
    /// is already taken fails with `VersionConflict`.
    async fn insert(&self, doc: Document) -> StoreResult<DocMeta>;

    /// Replace an existing document. The document's revision must match the stored one.
    async fn update(&self, doc: Document) -> StoreResult<DocMeta>;

    /// Fetch a document by id
    async fn get(&self, id: &str) -> StoreResult<Document>;

    /// Remove a document at the given revision
    async fn delete(&self, id: &str, rev: &str) -> StoreResult<()>;

    /// All documents matching the selector, ordered by id
    async fn find(&self, selector: &Selector) -> StoreResult<Vec<Document>>;

    /// Check that the backend is reachable
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Shared handle to the record store, created once at startup and passed into each service
pub type StoreHandle = Arc<dyn RecordStore>;
