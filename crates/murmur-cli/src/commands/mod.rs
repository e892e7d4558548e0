pub mod admin;
pub mod common;
pub mod completions;
pub mod export;
pub mod list;
pub mod react;
pub mod show;
pub mod submit;

use murmur_core::auth::AdminSession;
use murmur_core::models::CollectionKind;
use murmur_core::services::Board;
use murmur_core::store::DocumentStore;

use crate::cli::RecordCommands;
use crate::commands::common::require_admin;
use crate::commands::submit::SubmitArgs;
use crate::error::CliError;

/// Run one feedback/ticket subcommand and return the text to print.
pub async fn run_record_command<S: DocumentStore>(
    board: &Board<S>,
    kind: CollectionKind,
    command: RecordCommands,
    admin: Option<&AdminSession>,
) -> Result<String, CliError> {
    match command {
        RecordCommands::Submit {
            text,
            category,
            priority,
            labels,
            attachments,
        } => {
            let args = SubmitArgs {
                text,
                category,
                priority: priority.map(Into::into),
                labels,
                attachments,
            };
            submit::run_submit(board, kind, args).await
        }
        RecordCommands::List(args) => list::run_list(board, kind, &args, admin.is_some()).await,
        RecordCommands::Show { id, json } => {
            show::run_show(board, kind, &id, json, admin.is_some()).await
        }
        RecordCommands::React { id, reaction } => {
            react::run_react(board, kind, &id, reaction.into()).await
        }
        RecordCommands::Vote { id } => react::run_vote(board, kind, &id).await,
        RecordCommands::Reply { id, message } => {
            admin::run_reply(board, require_admin(admin)?, kind, &id, &message).await
        }
        RecordCommands::Edit(args) => {
            admin::run_edit(board, require_admin(admin)?, kind, &args).await
        }
        RecordCommands::Status { id, status } => {
            admin::run_status(board, require_admin(admin)?, kind, &id, status.into()).await
        }
        RecordCommands::Delete { id } => {
            admin::run_delete(board, require_admin(admin)?, kind, &id).await
        }
        RecordCommands::Complete { id } => {
            admin::run_complete(board, require_admin(admin)?, kind, &id).await
        }
    }
}
