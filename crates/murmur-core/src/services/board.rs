//! Board operations: every call is one read-modify-write cycle against the
//! document store, persisted through the conflict-resolving save engine.

use serde_json::{json, Value};

use crate::auth::AdminSession;
use crate::config::BoardSettings;
use crate::document::decode_records;
use crate::models::{
    Attachment, CollectionKind, Priority, Reaction, Record, RecordId, Reply, TicketStatus,
    Timestamp, DEFAULT_CATEGORY,
};
use crate::retention;
use crate::save::{save, SaveReport, WorkingList};
use crate::search::{Page, ViewContext};
use crate::store::{DocumentStore, VersionToken};
use crate::util::{normalize_labels, normalize_text_option};
use crate::{Error, Result};

/// A public submission before it is assigned an id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    pub text: String,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub labels: Vec<String>,
    pub attachments: Vec<Attachment>,
}

impl Submission {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Admin edit of a record's scalar fields. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordEdit {
    pub text: Option<String>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub labels: Option<Vec<String>>,
    pub assigned_to: Option<String>,
    pub admin_notes: Option<String>,
}

impl RecordEdit {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.category.is_none()
            && self.priority.is_none()
            && self.labels.is_none()
            && self.assigned_to.is_none()
            && self.admin_notes.is_none()
    }
}

/// What a successful operation persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub record_id: RecordId,
    pub version: VersionToken,
    pub reconciled: bool,
}

/// Feedback and ticket operations over a document store.
#[derive(Debug, Clone)]
pub struct Board<S> {
    store: S,
    settings: BoardSettings,
}

impl<S: DocumentStore> Board<S> {
    pub const fn new(store: S, settings: BoardSettings) -> Self {
        Self { store, settings }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn settings(&self) -> &BoardSettings {
        &self.settings
    }

    /// Read and normalize a collection.
    ///
    /// Feedback is swept for records past the retention window. If the sweep
    /// removed anything, the shrunken collection is saved once; when that save
    /// fails the filtered list is still returned, bound to the version it was
    /// read at, with the removals pending.
    pub async fn load(&self, kind: CollectionKind) -> Result<WorkingList> {
        let path = self.settings.path(kind);
        let document = self.store.read(path).await?;
        let now = Timestamp::now();
        let records = decode_records(kind, &document.bytes, now);
        tracing::debug!("Loaded {} {} records from {}", records.len(), kind, path);

        let mut working = WorkingList::new(kind, records, document.version);
        if kind != CollectionKind::Feedback {
            return Ok(working);
        }

        let expired =
            retention::expired_ids(working.records(), now, self.settings.retention_hours);
        if expired.is_empty() {
            return Ok(working);
        }
        for id in &expired {
            working.remove(*id);
        }

        match save(&self.store, path, &working).await {
            Ok(report) => {
                tracing::info!("Retention sweep removed {} feedback records", expired.len());
                Ok(report.into_working_list(kind))
            }
            Err(error) => {
                tracing::warn!("Failed to persist retention sweep of {}: {}", path, error);
                Ok(working)
            }
        }
    }

    /// Filtered, ordered page of a collection. A zero page size is rejected
    /// before the store is touched.
    pub async fn list(&self, kind: CollectionKind, view: &ViewContext) -> Result<Page<Record>> {
        if view.page_size == 0 {
            return Err(Error::InvalidInput("page size must be at least 1".to_string()));
        }
        let working = self.load(kind).await?;
        view.view(working.records())
    }

    pub async fn get(&self, kind: CollectionKind, id: RecordId) -> Result<Record> {
        let working = self.load(kind).await?;
        working.get(id).cloned().ok_or(Error::NotFound(id))
    }

    /// Append a new record. Blank text is rejected before the store is touched.
    pub async fn submit(&self, kind: CollectionKind, submission: Submission) -> Result<Receipt> {
        let text = submission.text.trim();
        if text.is_empty() {
            return Err(Error::InvalidInput(format!(
                "{} text must not be empty",
                kind.noun()
            )));
        }

        let mut working = self.load(kind).await?;
        let now = Timestamp::now();
        let mut record = Record::new(kind, RecordId::new(0), text, now);
        record.category =
            normalize_text_option(submission.category).unwrap_or_else(|| DEFAULT_CATEGORY.into());
        record.priority = submission.priority.unwrap_or_default();
        record.labels = normalize_labels(submission.labels);
        record.attachments = submission.attachments;

        let id = working.append(record);
        let submitted = working.get(id).cloned().ok_or(Error::NotFound(id))?;

        let report = self.persist(&working).await?;
        let record_id = locate_submission(&report, &submitted).unwrap_or(id);
        tracing::info!("{} #{} submitted", kind.noun(), record_id);

        Ok(Receipt {
            record_id,
            version: report.version,
            reconciled: report.reconciled,
        })
    }

    /// Anonymous reaction. Does not touch `updated_at`.
    pub async fn react(
        &self,
        kind: CollectionKind,
        id: RecordId,
        reaction: Reaction,
    ) -> Result<Receipt> {
        self.update(kind, id, |record, _| {
            record.reactions.bump(reaction);
            Ok(())
        })
        .await
    }

    /// Anonymous upvote. Does not touch `updated_at`.
    pub async fn vote(&self, kind: CollectionKind, id: RecordId) -> Result<Receipt> {
        self.update(kind, id, |record, _| {
            record.votes = record.votes.saturating_add(1);
            Ok(())
        })
        .await
    }

    pub async fn reply(
        &self,
        session: &AdminSession,
        kind: CollectionKind,
        id: RecordId,
        message: &str,
    ) -> Result<Receipt> {
        let message = message.trim().to_string();
        if message.is_empty() {
            return Err(Error::InvalidInput("reply must not be empty".to_string()));
        }

        self.update(kind, id, |record, now| {
            record.replies.push(Reply {
                message: message.clone(),
                created_at: now,
            });
            record.record_change("reply", session.author(), now, Value::Null, json!(message));
            Ok(())
        })
        .await
    }

    /// Apply an admin edit. Each field that actually changes gets its own
    /// history entry.
    pub async fn edit(
        &self,
        session: &AdminSession,
        kind: CollectionKind,
        id: RecordId,
        edit: RecordEdit,
    ) -> Result<Receipt> {
        if edit.is_empty() {
            return Err(Error::InvalidInput("nothing to edit".to_string()));
        }
        if edit
            .text
            .as_deref()
            .is_some_and(|text| text.trim().is_empty())
        {
            return Err(Error::InvalidInput(format!(
                "{} text must not be empty",
                kind.noun()
            )));
        }

        self.update(kind, id, |record, now| {
            apply_edit(record, edit, session.author(), now);
            Ok(())
        })
        .await
    }

    pub async fn set_status(
        &self,
        session: &AdminSession,
        kind: CollectionKind,
        id: RecordId,
        status: TicketStatus,
    ) -> Result<Receipt> {
        require_tickets(kind, "status")?;

        self.update(kind, id, |record, now| {
            let before = record.status;
            if before != Some(status) {
                record.status = Some(status);
                record.record_change(
                    "set_status",
                    session.author(),
                    now,
                    json!(before),
                    json!(status),
                );
            }
            Ok(())
        })
        .await
    }

    /// Hard-delete a record.
    pub async fn delete(
        &self,
        session: &AdminSession,
        kind: CollectionKind,
        id: RecordId,
    ) -> Result<Receipt> {
        let mut working = self.load(kind).await?;
        let removed = working.remove(id).ok_or(Error::NotFound(id))?;
        let report = self.persist(&working).await?;
        tracing::info!(
            "{} #{} deleted by {}: {}",
            kind.noun(),
            id,
            session.author(),
            removed.preview(60)
        );

        Ok(Receipt {
            record_id: id,
            version: report.version,
            reconciled: report.reconciled,
        })
    }

    /// Mark a ticket completed and take it off the board.
    pub async fn complete_and_remove(
        &self,
        session: &AdminSession,
        kind: CollectionKind,
        id: RecordId,
    ) -> Result<Receipt> {
        require_tickets(kind, "completion")?;

        let mut working = self.load(kind).await?;
        let completed = working.remove(id).ok_or(Error::NotFound(id))?;
        let report = self.persist(&working).await?;
        tracing::info!(
            "Ticket #{} completed and removed by {}: {}",
            completed.id,
            session.author(),
            completed.preview(60)
        );

        Ok(Receipt {
            record_id: id,
            version: report.version,
            reconciled: report.reconciled,
        })
    }

    async fn update<F>(&self, kind: CollectionKind, id: RecordId, change: F) -> Result<Receipt>
    where
        F: FnOnce(&mut Record, Timestamp) -> Result<()>,
    {
        let mut working = self.load(kind).await?;
        let record = working.get_mut(id).ok_or(Error::NotFound(id))?;
        change(record, Timestamp::now())?;

        if !working.is_dirty() {
            if let Some(version) = working.version() {
                tracing::debug!("{} #{} unchanged; nothing to write", kind.noun(), id);
                return Ok(Receipt {
                    record_id: id,
                    version: version.clone(),
                    reconciled: false,
                });
            }
        }

        let report = self.persist(&working).await?;
        Ok(Receipt {
            record_id: id,
            version: report.version,
            reconciled: report.reconciled,
        })
    }

    async fn persist(&self, working: &WorkingList) -> Result<SaveReport> {
        save(&self.store, self.settings.path(working.kind()), working).await
    }
}

fn require_tickets(kind: CollectionKind, what: &str) -> Result<()> {
    if kind == CollectionKind::Tickets {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("{what} only applies to tickets")))
    }
}

fn apply_edit(record: &mut Record, edit: RecordEdit, author: &str, now: Timestamp) {
    if let Some(text) = edit.text {
        let text = text.trim().to_string();
        if text != record.text() {
            let before = record.text().to_string();
            record.body.set_text(text.clone());
            record.record_change("edit_text", author, now, json!(before), json!(text));
        }
    }

    if let Some(category) = edit.category {
        let category =
            normalize_text_option(Some(category)).unwrap_or_else(|| DEFAULT_CATEGORY.into());
        if category != record.category {
            let before = std::mem::replace(&mut record.category, category.clone());
            record.record_change("set_category", author, now, json!(before), json!(category));
        }
    }

    if let Some(priority) = edit.priority {
        if priority != record.priority {
            let before = std::mem::replace(&mut record.priority, priority);
            record.record_change("set_priority", author, now, json!(before), json!(priority));
        }
    }

    if let Some(labels) = edit.labels {
        let labels = normalize_labels(labels);
        if labels != record.labels {
            let before = std::mem::replace(&mut record.labels, labels.clone());
            record.record_change("set_labels", author, now, json!(before), json!(labels));
        }
    }

    if let Some(assignee) = edit.assigned_to {
        let assignee = assignee.trim().to_string();
        if assignee != record.assigned_to {
            let before = std::mem::replace(&mut record.assigned_to, assignee.clone());
            record.record_change("assign", author, now, json!(before), json!(assignee));
        }
    }

    if let Some(notes) = edit.admin_notes {
        if notes != record.admin_notes {
            let before = std::mem::replace(&mut record.admin_notes, notes.clone());
            record.record_change("set_admin_notes", author, now, json!(before), json!(notes));
        }
    }
}

/// Find a submitted record in what was written; its id changes when a
/// concurrent submission took it first.
fn locate_submission(report: &SaveReport, submitted: &Record) -> Option<RecordId> {
    report
        .records
        .iter()
        .rev()
        .find(|record| {
            record.created_at == submitted.created_at
                && record.body == submitted.body
                && record.attachments == submitted.attachments
        })
        .map(|record| record.id)
}
