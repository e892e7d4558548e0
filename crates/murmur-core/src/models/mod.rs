//! Data models for Murmur

mod collection;
mod record;
mod timestamp;

pub use collection::CollectionKind;
pub use record::{
    Attachment, Body, HistoryEntry, Priority, Reaction, Reactions, Record, RecordId, Reply,
    TicketStatus, DEFAULT_CATEGORY,
};
pub use timestamp::{Timestamp, TIMESTAMP_FORMAT};
