//! Collection kinds: one JSON document per kind

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::record::TicketStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Feedback,
    Tickets,
}

impl CollectionKind {
    /// Key holding the record's domain text.
    #[must_use]
    pub const fn text_key(self) -> &'static str {
        match self {
            Self::Feedback => "message",
            Self::Tickets => "query",
        }
    }

    #[must_use]
    pub const fn default_path(self) -> &'static str {
        match self {
            Self::Feedback => "feedback.json",
            Self::Tickets => "tickets.json",
        }
    }

    #[must_use]
    pub const fn commit_message(self) -> &'static str {
        match self {
            Self::Feedback => "Update feedback data",
            Self::Tickets => "Update tickets data",
        }
    }

    #[must_use]
    pub const fn default_status(self) -> Option<TicketStatus> {
        match self {
            Self::Feedback => None,
            Self::Tickets => Some(TicketStatus::InProcess),
        }
    }

    /// Singular display noun ("Feedback", "Ticket").
    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Feedback => "Feedback",
            Self::Tickets => "Ticket",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Feedback => "feedback",
            Self::Tickets => "tickets",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "feedback" => Ok(Self::Feedback),
            "ticket" | "tickets" => Ok(Self::Tickets),
            other => Err(format!("unknown collection '{other}'")),
        }
    }
}
