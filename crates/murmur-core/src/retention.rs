//! Retention window for public feedback.

use chrono::Duration;

use crate::models::{Record, RecordId, Timestamp};

/// Default feedback retention window.
pub const DEFAULT_RETENTION_HOURS: u32 = 24;

/// Oldest `created_at` that is still inside the window. Records created at
/// or before this instant are expired.
#[must_use]
pub fn cutoff(now: Timestamp, window_hours: u32) -> Timestamp {
    now.saturating_sub(Duration::hours(i64::from(window_hours)))
}

#[must_use]
pub fn is_expired(record: &Record, now: Timestamp, window_hours: u32) -> bool {
    record.created_at <= cutoff(now, window_hours)
}

/// Ids of records that fall outside the window.
#[must_use]
pub fn expired_ids(records: &[Record], now: Timestamp, window_hours: u32) -> Vec<RecordId> {
    records
        .iter()
        .filter(|record| is_expired(record, now, window_hours))
        .map(|record| record.id)
        .collect()
}

/// Records still inside the window, untouched and in their original order.
#[must_use]
pub fn sweep(records: Vec<Record>, now: Timestamp, window_hours: u32) -> Vec<Record> {
    records
        .into_iter()
        .filter(|record| !is_expired(record, now, window_hours))
        .collect()
}
