use std::path::Path;

use murmur_core::export::render_records_export;
use murmur_core::models::CollectionKind;
use murmur_core::services::Board;
use murmur_core::store::DocumentStore;

use crate::cli::ExportFormat;
use crate::error::CliError;

/// Export every record of a collection. Returns what should be printed:
/// the written path, or the rendered export itself when no path was given.
pub async fn run_export<S: DocumentStore>(
    board: &Board<S>,
    kind: CollectionKind,
    format: ExportFormat,
    output_path: Option<&Path>,
) -> Result<String, CliError> {
    let working = board.load(kind).await?;
    let rendered = render_records_export(working.records(), format.into())?;

    if let Some(path) = output_path {
        std::fs::write(path, rendered)?;
        Ok(path.display().to_string())
    } else {
        Ok(rendered)
    }
}
