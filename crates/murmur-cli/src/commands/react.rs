use murmur_core::models::{CollectionKind, Reaction};
use murmur_core::services::Board;
use murmur_core::store::DocumentStore;

use crate::commands::common::{format_receipt, parse_record_id};
use crate::error::CliError;

pub async fn run_react<S: DocumentStore>(
    board: &Board<S>,
    kind: CollectionKind,
    id: &str,
    reaction: Reaction,
) -> Result<String, CliError> {
    let id = parse_record_id(id)?;
    let receipt = board.react(kind, id, reaction).await?;
    Ok(format_receipt(
        kind,
        &format!("got a '{}'", reaction.as_str()),
        &receipt,
    ))
}

pub async fn run_vote<S: DocumentStore>(
    board: &Board<S>,
    kind: CollectionKind,
    id: &str,
) -> Result<String, CliError> {
    let id = parse_record_id(id)?;
    let receipt = board.vote(kind, id).await?;
    Ok(format_receipt(kind, "upvoted", &receipt))
}
