//! Conflict-resolving save engine.
//!
//! A [`WorkingList`] is one interaction's in-memory copy of a collection: the
//! records as loaded, the version they were loaded at, and the removals made
//! since. [`save`] writes it conditioned on that version. When the store
//! reports a conflict the engine re-reads, reconciles record by record and
//! writes once more at the fresh version; a second conflict is a failure.

mod merge;

use std::collections::{BTreeSet, HashMap};

use crate::document::{decode_records, encode_records};
use crate::models::{CollectionKind, Record, RecordId, Timestamp};
use crate::store::{DocumentStore, VersionToken, WriteOutcome};
use crate::{Error, Result};

pub use merge::{merge_records, pending_changes, reconcile};

/// Mutable view of a collection bound to the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingList {
    kind: CollectionKind,
    records: Vec<Record>,
    read_as: HashMap<RecordId, Record>,
    removed: BTreeSet<RecordId>,
    version: Option<VersionToken>,
}

impl WorkingList {
    /// Start from records freshly read at `version`.
    #[must_use]
    pub fn new(kind: CollectionKind, records: Vec<Record>, version: Option<VersionToken>) -> Self {
        let read_as = records
            .iter()
            .map(|record| (record.id, record.clone()))
            .collect();
        Self {
            kind,
            records,
            read_as,
            removed: BTreeSet::new(),
            version,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> CollectionKind {
        self.kind
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Version the list was read at (or last saved as).
    #[must_use]
    pub const fn version(&self) -> Option<&VersionToken> {
        self.version.as_ref()
    }

    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut Record> {
        self.records.iter_mut().find(|record| record.id == id)
    }

    /// The record as it was when this list was read, if it existed then.
    #[must_use]
    pub fn read_version(&self, id: RecordId) -> Option<&Record> {
        self.read_as.get(&id)
    }

    #[must_use]
    pub fn is_removed(&self, id: RecordId) -> bool {
        self.removed.contains(&id)
    }

    /// Ids removed since the list was read.
    pub fn removed(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.removed.iter().copied()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.removed.is_empty()
            || self.records.len() != self.read_as.len()
            || self
                .records
                .iter()
                .any(|record| self.read_as.get(&record.id) != Some(record))
    }

    /// Next id to hand out: one past every id present or removed here.
    #[must_use]
    pub fn next_id(&self) -> RecordId {
        self.records
            .iter()
            .map(|record| record.id)
            .chain(self.removed.iter().copied())
            .max()
            .map_or(RecordId::new(1), RecordId::next)
    }

    /// Append a new record with the next free id and return that id.
    pub fn append(&mut self, mut record: Record) -> RecordId {
        record.id = self.next_id();
        let id = record.id;
        self.records.push(record);
        id
    }

    /// Remove a record. The removal is replayed if the save has to reconcile.
    pub fn remove(&mut self, id: RecordId) -> Option<Record> {
        let position = self.records.iter().position(|record| record.id == id)?;
        self.removed.insert(id);
        Some(self.records.remove(position))
    }
}

/// Outcome of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    /// Version of the document now in the store.
    pub version: VersionToken,
    /// Whether a conflict was reconciled on the way.
    pub reconciled: bool,
    /// Exactly what was written.
    pub records: Vec<Record>,
}

impl SaveReport {
    /// A fresh working list positioned at the saved version.
    #[must_use]
    pub fn into_working_list(self, kind: CollectionKind) -> WorkingList {
        WorkingList::new(kind, self.records, Some(self.version))
    }
}

/// Persist `working` to `path`, reconciling at most once on conflict.
///
/// Store failures are returned as-is and never retried. The caller's working
/// list is not modified; on error its version must not be trusted as current.
pub async fn save<S: DocumentStore>(
    store: &S,
    path: &str,
    working: &WorkingList,
) -> Result<SaveReport> {
    let kind = working.kind();
    let message = kind.commit_message();
    let bytes = encode_records(working.records())?;

    match store.write(path, &bytes, working.version(), message).await? {
        WriteOutcome::Written(version) => {
            tracing::info!("Saved {} ({} records) as {}", path, working.records().len(), version);
            return Ok(SaveReport {
                version,
                reconciled: false,
                records: working.records().to_vec(),
            });
        }
        WriteOutcome::Conflict => {
            tracing::warn!(
                "Version {:?} of {} is stale; reconciling with the latest copy",
                working.version(),
                path
            );
        }
    }

    let latest = store.read(path).await?;
    let authoritative = decode_records(kind, &latest.bytes, Timestamp::now());
    let merged = reconcile(working, authoritative);
    let bytes = encode_records(&merged)?;

    match store
        .write(path, &bytes, latest.version.as_ref(), message)
        .await?
    {
        WriteOutcome::Written(version) => {
            tracing::info!(
                "Saved {} ({} records) as {} after reconciling",
                path,
                merged.len(),
                version
            );
            Ok(SaveReport {
                version,
                reconciled: true,
                records: merged,
            })
        }
        WriteOutcome::Conflict => {
            tracing::warn!("{} changed again during reconciliation; giving up", path);
            Err(Error::UnresolvedConflict(path.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::models::{Reaction, Reply};
    use crate::store::{Document, MemoryStore, StoreError};
    use pretty_assertions::assert_eq;

    const PATH: &str = "feedback.json";

    fn ts(value: &str) -> Timestamp {
        value.parse().unwrap()
    }

    fn feedback(id: u64, text: &str) -> Record {
        Record::new(
            CollectionKind::Feedback,
            RecordId::new(id),
            text,
            ts("2024-01-01T00:00:00"),
        )
    }

    fn seed(store: &MemoryStore, records: &[Record]) -> VersionToken {
        store.overwrite(PATH, encode_records(records).unwrap())
    }

    fn stored(store: &MemoryStore) -> Vec<Record> {
        decode_records(
            CollectionKind::Feedback,
            &store.contents(PATH).unwrap(),
            Timestamp::now(),
        )
    }

    /// Runs a scripted concurrent write right before each of our writes.
    struct InterleavedStore {
        inner: MemoryStore,
        before_write: Mutex<VecDeque<Vec<Record>>>,
    }

    impl InterleavedStore {
        fn new(inner: MemoryStore, concurrent: Vec<Vec<Record>>) -> Self {
            Self {
                inner,
                before_write: Mutex::new(concurrent.into()),
            }
        }
    }

    impl DocumentStore for InterleavedStore {
        async fn read(&self, path: &str) -> std::result::Result<Document, StoreError> {
            self.inner.read(path).await
        }

        async fn write(
            &self,
            path: &str,
            bytes: &[u8],
            expected: Option<&VersionToken>,
            message: &str,
        ) -> std::result::Result<WriteOutcome, StoreError> {
            let concurrent = self.before_write.lock().unwrap().pop_front();
            if let Some(records) = concurrent {
                self.inner.overwrite(path, encode_records(&records).unwrap());
            }
            self.inner.write(path, bytes, expected, message).await
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn clean_save_returns_new_version() {
        let store = MemoryStore::new();
        let v1 = seed(&store, &[feedback(1, "a")]);

        let mut working = WorkingList::new(CollectionKind::Feedback, vec![feedback(1, "a")], Some(v1.clone()));
        working.append(feedback(0, "b"));

        let report = save(&store, PATH, &working).await.unwrap();
        assert!(!report.reconciled);
        assert_ne!(report.version, v1);
        assert_eq!(Some(report.version), store.version(PATH));
        assert_eq!(stored(&store).len(), 2);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn first_save_creates_missing_document() {
        let store = MemoryStore::new();
        let mut working = WorkingList::new(CollectionKind::Feedback, Vec::new(), None);
        let id = working.append(feedback(0, "first"));
        assert_eq!(id, RecordId::new(1));

        save(&store, PATH, &working).await.unwrap();
        assert_eq!(stored(&store)[0].text(), "first");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn concurrent_reactions_are_both_kept() {
        let mut base = feedback(1, "m");
        base.reactions.like = 2;
        let inner = MemoryStore::new();
        let v1 = seed(&inner, &[base.clone()]);

        // Another session bumped "helpful" after we read.
        let mut theirs = base.clone();
        theirs.reactions.bump(Reaction::Helpful);
        let store = InterleavedStore::new(inner, vec![vec![theirs]]);

        let mut working = WorkingList::new(CollectionKind::Feedback, vec![base], Some(v1));
        working
            .get_mut(RecordId::new(1))
            .unwrap()
            .reactions
            .bump(Reaction::Like);

        let report = save(&store, PATH, &working).await.unwrap();
        assert!(report.reconciled);
        let merged = &stored(&store.inner)[0];
        assert_eq!(merged.reactions.like, 3);
        assert_eq!(merged.reactions.helpful, 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn concurrent_replies_are_unioned() {
        let base = feedback(1, "m");
        let inner = MemoryStore::new();
        let v1 = seed(&inner, &[base.clone()]);

        let mut theirs = base.clone();
        theirs.replies.push(Reply {
            message: "from them".to_string(),
            created_at: ts("2024-01-01T01:00:00"),
        });
        let store = InterleavedStore::new(inner, vec![vec![theirs]]);

        let mut working = WorkingList::new(CollectionKind::Feedback, vec![base], Some(v1));
        working.get_mut(RecordId::new(1)).unwrap().replies.push(Reply {
            message: "from us".to_string(),
            created_at: ts("2024-01-01T01:00:01"),
        });

        save(&store, PATH, &working).await.unwrap();
        let messages = stored(&store.inner)[0]
            .replies
            .iter()
            .map(|reply| reply.message.clone())
            .collect::<Vec<_>>();
        assert_eq!(messages, vec!["from them", "from us"]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn concurrent_submissions_with_same_id_both_survive() {
        let inner = MemoryStore::new();
        let v1 = seed(&inner, &[feedback(1, "existing")]);

        let store = InterleavedStore::new(
            inner,
            vec![vec![feedback(1, "existing"), feedback(2, "their submission")]],
        );

        let mut working = WorkingList::new(CollectionKind::Feedback, vec![feedback(1, "existing")], Some(v1));
        working.append(feedback(0, "our submission"));

        let report = save(&store, PATH, &working).await.unwrap();
        assert!(report.reconciled);

        let records = stored(&store.inner);
        let summary = records
            .iter()
            .map(|record| (record.id.get(), record.text().to_string()))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                (1, "existing".to_string()),
                (2, "their submission".to_string()),
                (3, "our submission".to_string()),
            ]
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn removal_survives_reconciliation_without_losing_new_records() {
        let inner = MemoryStore::new();
        let v1 = seed(&inner, &[feedback(1, "keep"), feedback(2, "drop me")]);

        let store = InterleavedStore::new(
            inner,
            vec![vec![feedback(1, "keep"), feedback(2, "drop me"), feedback(3, "new")]],
        );

        let mut working = WorkingList::new(
            CollectionKind::Feedback,
            vec![feedback(1, "keep"), feedback(2, "drop me")],
            Some(v1),
        );
        assert!(working.remove(RecordId::new(2)).is_some());

        save(&store, PATH, &working).await.unwrap();
        let ids = stored(&store.inner)
            .iter()
            .map(|record| record.id.get())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn reaction_does_not_undo_a_concurrent_delete() {
        let inner = MemoryStore::new();
        let v1 = seed(&inner, &[feedback(1, "liked"), feedback(2, "deleted by admin")]);

        // An admin removed #2 after we read.
        let store = InterleavedStore::new(inner, vec![vec![feedback(1, "liked")]]);

        let mut working = WorkingList::new(
            CollectionKind::Feedback,
            vec![feedback(1, "liked"), feedback(2, "deleted by admin")],
            Some(v1),
        );
        working
            .get_mut(RecordId::new(1))
            .unwrap()
            .reactions
            .bump(Reaction::Like);

        let report = save(&store, PATH, &working).await.unwrap();
        assert!(report.reconciled);
        let records = stored(&store.inner);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, RecordId::new(1));
        assert_eq!(records[0].reactions.like, 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn later_scalar_edit_wins_during_reconciliation() {
        let base = feedback(1, "original");
        let inner = MemoryStore::new();
        let v1 = seed(&inner, &[base.clone()]);

        let mut theirs = base.clone();
        theirs.body.set_text("their edit");
        theirs.updated_at = ts("2024-01-01T00:10:00");
        let store = InterleavedStore::new(inner, vec![vec![theirs]]);

        let mut working = WorkingList::new(CollectionKind::Feedback, vec![base], Some(v1));
        let ours = working.get_mut(RecordId::new(1)).unwrap();
        ours.body.set_text("our edit");
        ours.updated_at = ts("2024-01-01T00:20:00");

        save(&store, PATH, &working).await.unwrap();
        let merged = &stored(&store.inner)[0];
        assert_eq!(merged.text(), "our edit");
        assert_eq!(merged.updated_at, ts("2024-01-01T00:20:00"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn second_conflict_fails_after_one_reconciliation() {
        let inner = MemoryStore::new();
        let v1 = seed(&inner, &[feedback(1, "a")]);
        let store = InterleavedStore::new(
            inner,
            vec![vec![feedback(1, "b")], vec![feedback(1, "c")], vec![feedback(1, "d")]],
        );

        let working = WorkingList::new(CollectionKind::Feedback, vec![feedback(1, "z")], Some(v1));
        let error = save(&store, PATH, &working).await.unwrap_err();

        assert!(matches!(error, Error::UnresolvedConflict(ref path) if path == PATH));
        assert_eq!(store.inner.write_attempts(), 2);
        assert_eq!(stored(&store.inner)[0].text(), "c");
    }

    #[test]
    fn next_id_skips_removed_ids() {
        let mut working = WorkingList::new(
            CollectionKind::Feedback,
            vec![feedback(1, "a"), feedback(2, "b")],
            None,
        );
        working.remove(RecordId::new(2));
        assert_eq!(working.next_id(), RecordId::new(3));
        assert!(working.is_dirty());
    }
}
