use std::fmt::Write as _;
use std::io::{self, IsTerminal, Read};
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use murmur_core::auth::{AdminGate, AdminSession};
use murmur_core::config::BoardConfig;
use murmur_core::models::{Attachment, CollectionKind, Record, RecordId, Timestamp};
use murmur_core::services::{Board, Receipt};
use murmur_core::store::GitHubStore;
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct RecordListItem {
    pub id: u64,
    pub preview: String,
    pub text: String,
    pub created_at: String,
    pub updated_at: String,
    pub relative_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub category: String,
    pub priority: String,
    pub labels: Vec<String>,
    pub votes: u32,
    pub reactions: u32,
    pub replies: usize,
}

/// Build the GitHub-backed board and admin gate from the environment.
pub fn open_board() -> Result<(Board<GitHubStore>, AdminGate), CliError> {
    let config = BoardConfig::from_env()?;
    tracing::debug!("Using {:?}", config);

    let store = GitHubStore::new(config.github_config()).map_err(murmur_core::Error::from)?;
    Ok((Board::new(store, config.settings.clone()), config.admin_gate()))
}

/// Log in when a password was given. A wrong password is an error rather
/// than a silent downgrade to the public view.
pub fn admin_session(
    gate: &AdminGate,
    password: Option<&str>,
) -> Result<Option<AdminSession>, CliError> {
    match password {
        Some(password) => Ok(Some(gate.login(password)?)),
        None => Ok(None),
    }
}

pub const fn require_admin(admin: Option<&AdminSession>) -> Result<&AdminSession, CliError> {
    match admin {
        Some(session) => Ok(session),
        None => Err(CliError::AdminRequired),
    }
}

pub fn parse_record_id(value: &str) -> Result<RecordId, CliError> {
    value
        .parse::<RecordId>()
        .map_err(|_| CliError::InvalidId(value.trim().to_string()))
}

/// `--from` bound: a bare date means the start of that day.
pub fn parse_from_bound(value: &str) -> Result<Timestamp, CliError> {
    Timestamp::parse_date_or_timestamp(value).map_err(|_| CliError::InvalidDate(value.to_string()))
}

/// `--to` bound: a bare date covers that whole day.
pub fn parse_to_bound(value: &str) -> Result<Timestamp, CliError> {
    if let Ok(timestamp) = Timestamp::parse(value) {
        return Ok(timestamp);
    }
    let start = parse_from_bound(value)?;
    Timestamp::from_unix(start.unix_seconds() + 86_399)
        .ok_or_else(|| CliError::InvalidDate(value.to_string()))
}

/// Text from the arguments, or piped stdin when no arguments were given.
pub fn resolve_text(parts: &[String], what: &'static str) -> Result<String, CliError> {
    if let Some(text) = normalize_content(&parts.join(" ")) {
        return Ok(text);
    }

    if let Some(text) = read_piped_stdin()? {
        return Ok(text);
    }

    Err(CliError::EmptyText(what))
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

/// Read a file into an inline base64 attachment with a guessed MIME type.
pub fn load_attachment(path: &Path) -> Result<Attachment, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::Attachment {
        path: path.to_path_buf(),
        source,
    })?;
    let filename = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());

    Ok(Attachment {
        filename,
        content_base64: BASE64_STANDARD.encode(bytes),
        content_type: mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    })
}

pub fn format_record_lines(records: &[Record], now: Timestamp) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            let id = format!("#{}", record.id);
            let preview = record.preview(40);
            let relative_time = format_relative_time(record.created_at, now);
            let mut line = format!("{id:<6}  {preview:<40}  {relative_time:<10}");

            if let Some(status) = record.status {
                let _ = write!(line, "  [{status}]");
            }
            let counters = record.reactions.total() + record.votes;
            if counters > 0 {
                let _ = write!(line, "  +{counters}");
            }
            if !record.labels.is_empty() {
                let _ = write!(line, "  {}", render_labels(&record.labels));
            }
            line
        })
        .collect()
}

pub fn record_to_list_item(record: &Record, now: Timestamp) -> RecordListItem {
    RecordListItem {
        id: record.id.get(),
        preview: record.preview(80),
        text: record.text().to_string(),
        created_at: record.created_at.to_string(),
        updated_at: record.updated_at.to_string(),
        relative_time: format_relative_time(record.created_at, now),
        status: record.status.map(|status| status.to_string()),
        category: record.category.clone(),
        priority: record.priority.to_string(),
        labels: record.labels.clone(),
        votes: record.votes,
        reactions: record.reactions.total(),
        replies: record.replies.len(),
    }
}

pub fn render_labels(labels: &[String]) -> String {
    labels
        .iter()
        .map(|label| format!("#{label}"))
        .collect::<Vec<String>>()
        .join(" ")
}

/// Full multi-line rendering used by `show`.
pub fn format_record_detail(record: &Record, admin: bool) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "#{}  {}", record.id, record.created_at);
    let _ = writeln!(output);
    let _ = writeln!(output, "{}", record.text());
    let _ = writeln!(output);

    if let Some(status) = record.status {
        let _ = writeln!(output, "Status:    {status}");
    }
    let _ = writeln!(output, "Category:  {}", record.category);
    let _ = writeln!(output, "Priority:  {}", record.priority);
    if !record.labels.is_empty() {
        let _ = writeln!(output, "Labels:    {}", render_labels(&record.labels));
    }
    if !record.assigned_to.is_empty() {
        let _ = writeln!(output, "Assigned:  {}", record.assigned_to);
    }
    let _ = writeln!(
        output,
        "Reactions: like {} | helpful {} | agree {} | votes {}",
        record.reactions.like, record.reactions.helpful, record.reactions.agree, record.votes
    );
    for attachment in &record.attachments {
        let _ = writeln!(
            output,
            "Attached:  {} ({})",
            attachment.filename, attachment.content_type
        );
    }
    if admin && !record.admin_notes.is_empty() {
        let _ = writeln!(output, "Notes:     {}", record.admin_notes);
    }

    if !record.replies.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "Replies:");
        for reply in &record.replies {
            let _ = writeln!(output, "  [{}] {}", reply.created_at, reply.message);
        }
    }

    if admin && !record.history.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "History:");
        for entry in &record.history {
            let _ = writeln!(
                output,
                "  [{}] {} by {}: {} -> {}",
                entry.at, entry.action, entry.author, entry.before, entry.after
            );
        }
    }

    output.trim_end().to_string()
}

/// Success banner for a persisted change.
pub fn format_receipt(kind: CollectionKind, verb: &str, receipt: &Receipt) -> String {
    let mut banner = format!("{} #{} {verb}", kind.noun(), receipt.record_id);
    if receipt.reconciled {
        banner.push_str(" (merged with a concurrent change)");
    }
    banner
}

pub fn format_relative_time(at: Timestamp, now: Timestamp) -> String {
    let diff = now.unix_seconds().saturating_sub(at.unix_seconds());
    let minute = 60;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        format!("{}w ago", diff / week)
    }
}
