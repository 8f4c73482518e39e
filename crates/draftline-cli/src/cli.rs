use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "draftline",
    about = "Draftline: field-level version control for structured documents",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Store directory (holds `draftline.toml` and one directory per document)
    #[arg(long, global = true, default_value = ".draftline")]
    pub store: PathBuf,

    /// Document id or unique id prefix; optional when the store holds one document
    #[arg(long, global = true)]
    pub doc: Option<String>,

    /// Author recorded on edits and commits
    #[arg(long, global = true)]
    pub author: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a document (version 1.0) in the store
    Init(InitArgs),
    /// Show the head version and uncommitted changes
    Status(StatusArgs),
    /// Set a field in the working copy
    Set(SetArgs),
    /// Remove a field from the working copy
    Unset(UnsetArgs),
    /// Drop all uncommitted changes
    Discard(DiscardArgs),
    /// Commit the working copy as a new version
    Commit(CommitArgs),
    /// Show version history
    Log(LogArgs),
    /// Show one version and the changes that produced it
    Show(ShowArgs),
    /// Show changes between versions, or uncommitted changes
    Diff(DiffArgs),
    /// Start a new working copy from an earlier version
    Revert(RevertArgs),
    /// Verify stored history integrity
    Verify(VerifyArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub title: String,
    /// JSON file whose top-level object holds the initial sections
    #[arg(long)]
    pub from: Option<PathBuf>,
    /// Also write a default `draftline.toml` if none exists
    #[arg(long)]
    pub config: bool,
}

#[derive(Args)]
pub struct StatusArgs {}

#[derive(Args)]
pub struct SetArgs {
    /// Field path, e.g. `budget.personnel` or `goals.items[0].title`
    pub path: String,
    /// JSON value; anything that is not valid JSON is stored as text
    pub value: String,
}

#[derive(Args)]
pub struct UnsetArgs {
    pub path: String,
}

#[derive(Args)]
pub struct DiscardArgs {}

#[derive(Args)]
pub struct CommitArgs {
    #[arg(short, long)]
    pub message: String,
    /// Bump the major component (1.4 -> 2.0)
    #[arg(long)]
    pub major: bool,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// `head`, `latest`, a number such as `1.2`, or a version id
    #[arg(default_value = "head")]
    pub version: String,
}

#[derive(Args)]
pub struct DiffArgs {
    /// Base version; omit to show uncommitted changes
    pub from: Option<String>,
    /// Target version (default: head)
    pub to: Option<String>,
}

#[derive(Args)]
pub struct RevertArgs {
    pub version: String,
    /// Confirm that uncommitted changes may be discarded
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct VerifyArgs {}
