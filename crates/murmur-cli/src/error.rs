use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] murmur_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No {0} text provided")]
    EmptyText(&'static str),
    #[error("Invalid record id '{0}': expected a number such as 12 or #12")]
    InvalidId(String),
    #[error("Invalid date '{0}': expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS")]
    InvalidDate(String),
    #[error("Page numbers start at 1")]
    InvalidPage,
    #[error("Page size must be at least 1")]
    InvalidPageSize,
    #[error("This command needs admin access; pass --admin-password")]
    AdminRequired,
    #[error("Failed to read attachment {}: {source}", .path.display())]
    Attachment { path: PathBuf, source: io::Error },
}
