use std::path::PathBuf;

use murmur_core::models::{CollectionKind, Priority};
use murmur_core::services::{Board, Submission};
use murmur_core::store::DocumentStore;

use crate::commands::common::{format_receipt, load_attachment, resolve_text};
use crate::error::CliError;

pub struct SubmitArgs {
    pub text: Vec<String>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub labels: Vec<String>,
    pub attachments: Vec<PathBuf>,
}

pub async fn run_submit<S: DocumentStore>(
    board: &Board<S>,
    kind: CollectionKind,
    args: SubmitArgs,
) -> Result<String, CliError> {
    let what = match kind {
        CollectionKind::Feedback => "feedback",
        CollectionKind::Tickets => "ticket",
    };
    let text = resolve_text(&args.text, what)?;
    let attachments = args
        .attachments
        .iter()
        .map(|path| load_attachment(path))
        .collect::<Result<Vec<_>, _>>()?;

    let receipt = board
        .submit(
            kind,
            Submission {
                text,
                category: args.category,
                priority: args.priority,
                labels: args.labels,
                attachments,
            },
        )
        .await?;

    Ok(format_receipt(kind, "submitted", &receipt))
}
