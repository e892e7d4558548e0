use murmur_core::models::CollectionKind;
use murmur_core::services::Board;
use murmur_core::store::DocumentStore;

use crate::commands::common::{format_record_detail, parse_record_id};
use crate::error::CliError;

pub async fn run_show<S: DocumentStore>(
    board: &Board<S>,
    kind: CollectionKind,
    id: &str,
    as_json: bool,
    admin: bool,
) -> Result<String, CliError> {
    let id = parse_record_id(id)?;
    let record = board.get(kind, id).await?;

    if as_json {
        Ok(serde_json::to_string_pretty(&record)?)
    } else {
        Ok(format_record_detail(&record, admin))
    }
}
