use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use murmur_core::export::ExportFormat as CoreExportFormat;
use murmur_core::models::{CollectionKind, Priority, Reaction, TicketStatus};
use murmur_core::search::{SearchField, SortKey};

#[derive(Parser)]
#[command(name = "murmur")]
#[command(about = "Anonymous feedback and support tickets stored in a GitHub repository")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Admin password; unlocks replies, edits, status changes and removals
    #[arg(long, global = true, value_name = "PASSWORD")]
    pub admin_password: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Anonymous feedback board
    Feedback {
        #[command(subcommand)]
        command: RecordCommands,
    },
    /// Support tickets
    #[command(alias = "ticket")]
    Tickets {
        #[command(subcommand)]
        command: RecordCommands,
    },
    /// Export a whole collection
    Export {
        /// Collection to export
        #[arg(value_enum)]
        kind: KindArg,
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum RecordCommands {
    /// Submit a new record (text from arguments or piped stdin)
    #[command(alias = "new")]
    Submit {
        /// Record text
        text: Vec<String>,
        /// Category (default "General")
        #[arg(long)]
        category: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,
        /// Label to attach; repeatable
        #[arg(long = "label", value_name = "LABEL")]
        labels: Vec<String>,
        /// File to attach; repeatable
        #[arg(long = "attach", value_name = "PATH")]
        attachments: Vec<PathBuf>,
    },
    /// List records, newest first
    #[command(alias = "ls")]
    List(ListArgs),
    /// Show one record with its replies
    Show {
        /// Record id, e.g. 12 or #12
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add an anonymous reaction
    React {
        id: String,
        #[arg(value_enum)]
        reaction: ReactionArg,
    },
    /// Upvote a record
    Vote { id: String },
    /// Reply to a record (admin)
    Reply {
        id: String,
        /// Reply text
        message: Vec<String>,
    },
    /// Edit fields of a record (admin)
    Edit(EditArgs),
    /// Change a ticket's status (admin)
    Status {
        id: String,
        #[arg(value_enum)]
        status: StatusArg,
    },
    /// Delete a record (admin)
    #[command(alias = "rm")]
    Delete { id: String },
    /// Mark a ticket completed and remove it (admin)
    Complete { id: String },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Case-insensitive keyword
    #[arg(short, long)]
    pub search: Option<String>,
    /// Fields the keyword searches; repeatable (default: text, labels, replies)
    #[arg(long = "field", value_enum, value_name = "FIELD")]
    pub fields: Vec<SearchFieldArg>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,
    #[arg(long, value_enum)]
    pub priority: Option<PriorityArg>,
    /// Required label; repeatable
    #[arg(long = "label", value_name = "LABEL")]
    pub labels: Vec<String>,
    /// Created on or after (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
    #[arg(long, value_name = "DATE")]
    pub from: Option<String>,
    /// Created on or before (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
    #[arg(long, value_name = "DATE")]
    pub to: Option<String>,
    #[arg(long, value_enum, default_value_t = SortArg::Created)]
    pub sort: SortArg,
    /// Page number, starting at 1
    #[arg(short, long, default_value = "1")]
    pub page: usize,
    #[arg(long, default_value = "5")]
    pub page_size: usize,
    /// Include soft-deleted records
    #[arg(long)]
    pub include_deleted: bool,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct EditArgs {
    pub id: String,
    /// Replacement text
    #[arg(long)]
    pub text: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long, value_enum)]
    pub priority: Option<PriorityArg>,
    /// Replace labels; repeatable
    #[arg(long = "label", value_name = "LABEL")]
    pub labels: Vec<String>,
    /// Remove every label
    #[arg(long, conflicts_with = "labels")]
    pub clear_labels: bool,
    /// Assignee (empty string unassigns)
    #[arg(long, value_name = "NAME")]
    pub assign: Option<String>,
    /// Internal admin notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum KindArg {
    Feedback,
    Tickets,
}

impl From<KindArg> for CollectionKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Feedback => Self::Feedback,
            KindArg::Tickets => Self::Tickets,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(value: PriorityArg) -> Self {
        match value {
            PriorityArg::Low => Self::Low,
            PriorityArg::Medium => Self::Medium,
            PriorityArg::High => Self::High,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StatusArg {
    InProcess,
    Completed,
}

impl From<StatusArg> for TicketStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::InProcess => Self::InProcess,
            StatusArg::Completed => Self::Completed,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ReactionArg {
    Like,
    Helpful,
    Agree,
}

impl From<ReactionArg> for Reaction {
    fn from(value: ReactionArg) -> Self {
        match value {
            ReactionArg::Like => Self::Like,
            ReactionArg::Helpful => Self::Helpful,
            ReactionArg::Agree => Self::Agree,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SearchFieldArg {
    Text,
    Category,
    Assignee,
    Notes,
    Labels,
    Replies,
}

impl From<SearchFieldArg> for SearchField {
    fn from(value: SearchFieldArg) -> Self {
        match value {
            SearchFieldArg::Text => Self::Text,
            SearchFieldArg::Category => Self::Category,
            SearchFieldArg::Assignee => Self::AssignedTo,
            SearchFieldArg::Notes => Self::AdminNotes,
            SearchFieldArg::Labels => Self::Labels,
            SearchFieldArg::Replies => Self::Replies,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum SortArg {
    #[default]
    Created,
    Updated,
}

impl From<SortArg> for SortKey {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Created => Self::CreatedAt,
            SortArg::Updated => Self::UpdatedAt,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl From<ExportFormat> for CoreExportFormat {
    fn from(value: ExportFormat) -> Self {
        match value {
            ExportFormat::Json => Self::Json,
            ExportFormat::Markdown => Self::Markdown,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
