use murmur_core::auth::AdminSession;
use murmur_core::models::{CollectionKind, TicketStatus};
use murmur_core::services::{Board, RecordEdit};
use murmur_core::store::DocumentStore;

use crate::cli::EditArgs;
use crate::commands::common::{format_receipt, parse_record_id, resolve_text};
use crate::error::CliError;

pub async fn run_reply<S: DocumentStore>(
    board: &Board<S>,
    session: &AdminSession,
    kind: CollectionKind,
    id: &str,
    message: &[String],
) -> Result<String, CliError> {
    let id = parse_record_id(id)?;
    let message = resolve_text(message, "reply")?;
    let receipt = board.reply(session, kind, id, &message).await?;
    Ok(format_receipt(kind, "replied to", &receipt))
}

pub fn record_edit(args: &EditArgs) -> RecordEdit {
    let labels = if args.clear_labels {
        Some(Vec::new())
    } else if args.labels.is_empty() {
        None
    } else {
        Some(args.labels.clone())
    };

    RecordEdit {
        text: args.text.clone(),
        category: args.category.clone(),
        priority: args.priority.map(Into::into),
        labels,
        assigned_to: args.assign.clone(),
        admin_notes: args.notes.clone(),
    }
}

pub async fn run_edit<S: DocumentStore>(
    board: &Board<S>,
    session: &AdminSession,
    kind: CollectionKind,
    args: &EditArgs,
) -> Result<String, CliError> {
    let id = parse_record_id(&args.id)?;
    let receipt = board.edit(session, kind, id, record_edit(args)).await?;
    Ok(format_receipt(kind, "updated", &receipt))
}

pub async fn run_status<S: DocumentStore>(
    board: &Board<S>,
    session: &AdminSession,
    kind: CollectionKind,
    id: &str,
    status: TicketStatus,
) -> Result<String, CliError> {
    let id = parse_record_id(id)?;
    let receipt = board.set_status(session, kind, id, status).await?;
    Ok(format_receipt(kind, &format!("marked {status}"), &receipt))
}

pub async fn run_delete<S: DocumentStore>(
    board: &Board<S>,
    session: &AdminSession,
    kind: CollectionKind,
    id: &str,
) -> Result<String, CliError> {
    let id = parse_record_id(id)?;
    let receipt = board.delete(session, kind, id).await?;
    Ok(format_receipt(kind, "deleted", &receipt))
}

pub async fn run_complete<S: DocumentStore>(
    board: &Board<S>,
    session: &AdminSession,
    kind: CollectionKind,
    id: &str,
) -> Result<String, CliError> {
    let id = parse_record_id(id)?;
    let receipt = board.complete_and_remove(session, kind, id).await?;
    Ok(format_receipt(kind, "completed and removed", &receipt))
}
