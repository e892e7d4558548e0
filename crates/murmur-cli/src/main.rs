//! Murmur CLI - anonymous feedback and support tickets from the terminal
//!
//! Records live in JSON documents inside a GitHub repository; every command
//! is one read-modify-write cycle against it.

mod cli;
mod commands;
mod error;

use clap::Parser;
use murmur_core::models::CollectionKind;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::common::{admin_session, open_board};
use crate::commands::completions::run_completions;
use crate::commands::export::run_export;
use crate::commands::run_record_command;
use crate::error::CliError;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let output = match cli.command {
        Commands::Completions { shell, output } => {
            return run_completions(shell, output.as_deref());
        }
        Commands::Export {
            kind,
            format,
            output,
        } => {
            let (board, _) = open_board()?;
            run_export(&board, kind.into(), format, output.as_deref()).await?
        }
        Commands::Feedback { command } => {
            let (board, gate) = open_board()?;
            let admin = admin_session(&gate, cli.admin_password.as_deref())?;
            run_record_command(&board, CollectionKind::Feedback, command, admin.as_ref()).await?
        }
        Commands::Tickets { command } => {
            let (board, gate) = open_board()?;
            let admin = admin_session(&gate, cli.admin_password.as_deref())?;
            run_record_command(&board, CollectionKind::Tickets, command, admin.as_ref()).await?
        }
    };

    println!("{output}");
    Ok(())
}

fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "murmur=info".parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
