//! Record model shared by feedback posts and support tickets

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::collection::CollectionKind;
use super::timestamp::Timestamp;

/// Integer identifier, unique within one collection document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().trim_start_matches('#').parse()?))
    }
}

/// Domain text of a record. Serialized under `message` for feedback and
/// `query` for tickets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Body {
    Message(String),
    Query(String),
}

impl Body {
    #[must_use]
    pub fn for_kind(kind: CollectionKind, text: impl Into<String>) -> Self {
        match kind {
            CollectionKind::Feedback => Self::Message(text.into()),
            CollectionKind::Tickets => Self::Query(text.into()),
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Message(text) | Self::Query(text) => text,
        }
    }

    pub fn set_text(&mut self, value: impl Into<String>) {
        match self {
            Self::Message(text) | Self::Query(text) => *text = value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ticket lifecycle state. Feedback records carry no status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    #[default]
    #[serde(rename = "In Process")]
    InProcess,
    #[serde(rename = "Completed")]
    Completed,
}

impl TicketStatus {
    pub const ALL: [Self; 2] = [Self::InProcess, Self::Completed];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProcess => "In Process",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anonymous reaction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reaction {
    Like,
    Helpful,
    Agree,
}

impl Reaction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Helpful => "helpful",
            Self::Agree => "agree",
        }
    }
}

impl FromStr for Reaction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "like" => Ok(Self::Like),
            "helpful" => Ok(Self::Helpful),
            "agree" => Ok(Self::Agree),
            other => Err(format!("unknown reaction '{other}'")),
        }
    }
}

/// Reaction counters. Merged by summing increments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reactions {
    #[serde(default)]
    pub like: u32,
    #[serde(default)]
    pub helpful: u32,
    #[serde(default)]
    pub agree: u32,
}

impl Reactions {
    #[must_use]
    pub const fn get(&self, reaction: Reaction) -> u32 {
        match reaction {
            Reaction::Like => self.like,
            Reaction::Helpful => self.helpful,
            Reaction::Agree => self.agree,
        }
    }

    pub fn bump(&mut self, reaction: Reaction) {
        let counter = match reaction {
            Reaction::Like => &mut self.like,
            Reaction::Helpful => &mut self.helpful,
            Reaction::Agree => &mut self.agree,
        };
        *counter = counter.saturating_add(1);
    }

    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self {
            like: self.like.saturating_add(other.like),
            helpful: self.helpful.saturating_add(other.helpful),
            agree: self.agree.saturating_add(other.agree),
        }
    }

    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self {
            like: self.like.saturating_sub(other.like),
            helpful: self.helpful.saturating_sub(other.helpful),
            agree: self.agree.saturating_sub(other.agree),
        }
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.like
            .saturating_add(self.helpful)
            .saturating_add(self.agree)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub message: String,
    pub created_at: Timestamp,
}

/// One audit trail entry. `before`/`after` hold whatever the action changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action: String,
    pub author: String,
    pub at: Timestamp,
    #[serde(default)]
    pub before: Value,
    #[serde(default)]
    pub after: Value,
}

/// Inline file attachment, stored base64-encoded inside the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub content_base64: String,
    #[serde(rename = "type")]
    pub content_type: String,
}

/// A feedback post or support ticket.
///
/// Every recognized field is present once a record has passed the
/// normalizer; unrecognized keys ride along in `extra`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(flatten)]
    pub body: Body,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    pub category: String,
    pub priority: Priority,
    pub labels: Vec<String>,
    pub assigned_to: String,
    pub admin_notes: String,
    pub reactions: Reactions,
    pub votes: u32,
    pub deleted_at: Option<Timestamp>,
    pub replies: Vec<Reply>,
    pub history: Vec<HistoryEntry>,
    pub attachments: Vec<Attachment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Category assigned when a submission does not name one.
pub const DEFAULT_CATEGORY: &str = "General";

impl Record {
    /// Create a fresh record with every field at its default.
    #[must_use]
    pub fn new(kind: CollectionKind, id: RecordId, text: impl Into<String>, now: Timestamp) -> Self {
        Self {
            id,
            created_at: now,
            updated_at: now,
            body: Body::for_kind(kind, text),
            status: kind.default_status(),
            category: DEFAULT_CATEGORY.to_string(),
            priority: Priority::default(),
            labels: Vec::new(),
            assigned_to: String::new(),
            admin_notes: String::new(),
            reactions: Reactions::default(),
            votes: 0,
            deleted_at: None,
            replies: Vec::new(),
            history: Vec::new(),
            attachments: Vec::new(),
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        self.body.text()
    }

    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Check whether every given label is present on the record.
    #[must_use]
    pub fn has_labels(&self, wanted: &[String]) -> bool {
        wanted
            .iter()
            .all(|label| self.labels.iter().any(|own| own == label))
    }

    /// Append an audit entry and bump `updated_at` to `at`, never backwards.
    pub fn record_change(
        &mut self,
        action: &str,
        author: &str,
        at: Timestamp,
        before: Value,
        after: Value,
    ) {
        self.history.push(HistoryEntry {
            action: action.to_string(),
            author: author.to_string(),
            at,
            before,
            after,
        });
        self.touch(at);
    }

    /// Move `updated_at` forward to `at`; earlier instants are ignored.
    pub fn touch(&mut self, at: Timestamp) {
        if at > self.updated_at {
            self.updated_at = at;
        }
    }

    /// First line of the text, collapsed and truncated to `max_chars`.
    #[must_use]
    pub fn preview(&self, max_chars: usize) -> String {
        let first_line = self.text().lines().next().unwrap_or("").trim();
        let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

        if collapsed.chars().count() <= max_chars {
            collapsed
        } else {
            let take_len = max_chars.saturating_sub(3);
            let mut truncated = collapsed.chars().take(take_len).collect::<String>();
            truncated.push_str("...");
            truncated
        }
    }
}
