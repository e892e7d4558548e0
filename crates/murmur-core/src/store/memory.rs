//! In-process document store with the same conditional-write semantics as
//! the remote store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{Document, DocumentStore, StoreError, VersionToken, WriteOutcome};

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    documents: HashMap<String, (Vec<u8>, VersionToken)>,
    next_version: u64,
    writes: usize,
}

impl MemoryState {
    fn bump(&mut self, path: &str, bytes: Vec<u8>) -> VersionToken {
        self.next_version += 1;
        let version = VersionToken::new(format!("v{}", self.next_version));
        self.documents
            .insert(path.to_string(), (bytes, version.clone()));
        version
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally replace a document, as another writer would.
    pub fn overwrite(&self, path: &str, bytes: impl Into<Vec<u8>>) -> VersionToken {
        self.lock().bump(path, bytes.into())
    }

    /// Current bytes of a document, if it exists.
    #[must_use]
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.lock()
            .documents
            .get(path)
            .map(|(bytes, _)| bytes.clone())
    }

    #[must_use]
    pub fn version(&self, path: &str) -> Option<VersionToken> {
        self.lock()
            .documents
            .get(path)
            .map(|(_, version)| version.clone())
    }

    /// Number of conditional writes accepted or rejected so far.
    #[must_use]
    pub fn write_attempts(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DocumentStore for MemoryStore {
    async fn read(&self, path: &str) -> Result<Document, StoreError> {
        let state = self.lock();
        Ok(state
            .documents
            .get(path)
            .map_or_else(Document::missing, |(bytes, version)| Document {
                bytes: bytes.clone(),
                version: Some(version.clone()),
            }))
    }

    async fn write(
        &self,
        path: &str,
        bytes: &[u8],
        expected: Option<&VersionToken>,
        _message: &str,
    ) -> Result<WriteOutcome, StoreError> {
        let mut state = self.lock();
        state.writes += 1;

        let current = state.documents.get(path).map(|(_, version)| version);
        if current != expected {
            return Ok(WriteOutcome::Conflict);
        }

        Ok(WriteOutcome::Written(state.bump(path, bytes.to_vec())))
    }
}
