//! Per-record reconciliation rules.

use std::collections::HashMap;

use crate::models::{Record, RecordId};

use super::WorkingList;

/// Merge two versions of the same record.
///
/// The side with the later `updated_at` is the base (ties go to
/// `authoritative`). On top of the base, replies and history are the
/// authoritative sequence followed by the local one, and counters are summed.
/// Every other field is taken from the base as-is.
#[must_use]
pub fn merge_records(authoritative: &Record, local: &Record) -> Record {
    let base = if local.updated_at > authoritative.updated_at {
        local
    } else {
        authoritative
    };

    let mut merged = base.clone();
    merged.replies = authoritative
        .replies
        .iter()
        .chain(&local.replies)
        .cloned()
        .collect();
    merged.history = authoritative
        .history
        .iter()
        .chain(&local.history)
        .cloned()
        .collect();
    merged.reactions = authoritative.reactions.saturating_add(local.reactions);
    merged.votes = authoritative.votes.saturating_add(local.votes);
    merged
}

/// What `local` changed relative to the version it was read as.
///
/// Counters become the increments since the read, and replies/history keep
/// only the entries appended since the read. Scalars and `updated_at` are
/// the local values.
#[must_use]
pub fn pending_changes(local: &Record, read_as: &Record) -> Record {
    let mut changes = local.clone();
    changes.reactions = local.reactions.saturating_sub(read_as.reactions);
    changes.votes = local.votes.saturating_sub(read_as.votes);
    changes.replies = appended_since(&local.replies, &read_as.replies);
    changes.history = appended_since(&local.history, &read_as.history);
    changes
}

fn appended_since<T: Clone + PartialEq>(current: &[T], earlier: &[T]) -> Vec<T> {
    if current.starts_with(earlier) {
        current[earlier.len()..].to_vec()
    } else {
        current
            .iter()
            .filter(|item| !earlier.contains(item))
            .cloned()
            .collect()
    }
}

/// Fold a working list into the latest authoritative collection.
///
/// - records removed from the working list are removed from the result;
/// - a working record unknown to the authoritative list is inserted, unless
///   it was read earlier and left untouched (someone else deleted it);
/// - a record present on both sides is merged via [`merge_records`] using
///   the working side's pending changes;
/// - a brand-new working record whose id was taken concurrently is renumbered
///   past every id on either side.
#[must_use]
pub fn reconcile(working: &WorkingList, authoritative: Vec<Record>) -> Vec<Record> {
    let mut merged = authoritative
        .into_iter()
        .filter(|record| !working.is_removed(record.id))
        .collect::<Vec<_>>();
    let mut index = merged
        .iter()
        .enumerate()
        .map(|(position, record)| (record.id, position))
        .collect::<HashMap<RecordId, usize>>();

    let mut next_id = merged
        .iter()
        .chain(working.records())
        .map(|record| record.id)
        .max()
        .map_or(RecordId::new(1), RecordId::next);

    for local in working.records() {
        let read_as = working.read_version(local.id);
        match (index.get(&local.id).copied(), read_as) {
            (Some(position), Some(read_as)) => {
                let changes = pending_changes(local, read_as);
                merged[position] = merge_records(&merged[position], &changes);
            }
            (Some(_), None) => {
                let mut renumbered = local.clone();
                tracing::info!(
                    "Renumbering new record #{} to #{} after a concurrent submission",
                    local.id,
                    next_id
                );
                renumbered.id = next_id;
                next_id = next_id.next();
                index.insert(renumbered.id, merged.len());
                merged.push(renumbered);
            }
            (None, Some(read_as)) if local == read_as => {
                tracing::debug!("#{} was removed concurrently; not restoring it", local.id);
            }
            (None, _) => {
                index.insert(local.id, merged.len());
                merged.push(local.clone());
            }
        }
    }

    merged
}
