//! Versioned document store abstraction.
//!
//! A store holds whole JSON documents addressed by path. Every document has
//! an opaque version token; a write names the token it expects to replace and
//! the store rejects it with [`WriteOutcome::Conflict`] when that token is
//! stale. Conflicts are an expected outcome, not an error: the save engine
//! reconciles them. Transport and auth problems surface as [`StoreError`].

mod github;
mod memory;

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

pub use github::{GitHubConfig, GitHubStore};
pub use memory::MemoryStore;

/// Opaque document version (a blob SHA for the GitHub store).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VersionToken({})", self.0)
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fetched document. `version` is `None` when the document does not exist
/// yet; writing with no expected version creates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub bytes: Vec<u8>,
    pub version: Option<VersionToken>,
}

impl Document {
    /// Placeholder for a document that does not exist yet: an empty collection.
    #[must_use]
    pub fn missing() -> Self {
        Self {
            bytes: b"[]".to_vec(),
            version: None,
        }
    }
}

/// Result of a conditional write that reached the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Replaced atomically; carries the new version.
    Written(VersionToken),
    /// The expected version was stale.
    Conflict,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Store API error: {message} ({status})")]
    Api { status: StatusCode, message: String },
    #[error("Invalid store payload: {0}")]
    InvalidPayload(String),
}

/// Whole-document get/put keyed by version token.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Fetch a document and its current version.
    async fn read(&self, path: &str) -> Result<Document, StoreError>;

    /// Replace a document if its current version still equals `expected`.
    async fn write(
        &self,
        path: &str,
        bytes: &[u8],
        expected: Option<&VersionToken>,
        message: &str,
    ) -> Result<WriteOutcome, StoreError>;
}

impl<S: DocumentStore> DocumentStore for &S {
    async fn read(&self, path: &str) -> Result<Document, StoreError> {
        (**self).read(path).await
    }

    async fn write(
        &self,
        path: &str,
        bytes: &[u8],
        expected: Option<&VersionToken>,
        message: &str,
    ) -> Result<WriteOutcome, StoreError> {
        (**self).write(path, bytes, expected, message).await
    }
}
