use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "changes",
    about = "Changeset engine: sync catalog entities between instances",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// State file holding the changeset store and the entity model
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    #[arg(long, global = true, default_value = "changes.toml")]
    pub config: PathBuf,

    /// Author recorded on commits, merges and changemasks
    #[arg(long, global = true)]
    pub author: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Turn outstanding revisions into changesets
    Commit(CommitArgs),
    /// Show the net changes between two changesets
    Diff(DiffArgs),
    /// List branch tips, most recent first
    Heads(HeadsArgs),
    /// Show changeset summaries
    Log(LogArgs),
    /// Merge the working changeset into a target
    Merge(MergeArgs),
    /// Apply pending changesets to the model
    Update(UpdateArgs),
    /// Apply pending changesets, asking about each change
    Moderate(UpdateArgs),
    /// Fetch changesets from peer sources
    Pull(PullArgs),
    /// Show the working changeset
    Working(WorkingArgs),
    /// Record an entity edit in the model
    Record(RecordArgs),
    /// List changemasks
    Masks(MasksArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum MergeMode {
    /// Drop contested attributes
    Auto,
    /// Let the working line win contested attributes
    PreferClosing,
    /// Ask on the terminal
    Interactive,
}

#[derive(Args)]
pub struct CommitArgs {}

#[derive(Args)]
pub struct DiffArgs {
    /// Start changeset, or the only changeset when `stop` is omitted
    pub first: String,
    pub stop: Option<String>,
}

#[derive(Args)]
pub struct HeadsArgs {}

#[derive(Args)]
pub struct LogArgs {
    pub changeset: Option<String>,
}

#[derive(Args)]
pub struct MergeArgs {
    pub target: String,
    #[arg(value_enum, default_value = "auto")]
    pub mode: MergeMode,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub target: Option<String>,
}

#[derive(Args)]
pub struct PullArgs {
    pub sources: Vec<String>,
}

#[derive(Args)]
pub struct WorkingArgs {}

#[derive(Args)]
pub struct RecordArgs {
    /// Entity reference, `/<kind>/<id>`
    pub reference: String,
    /// Full new state as a JSON object
    pub attrs: Option<String>,
    #[arg(long, conflicts_with = "attrs")]
    pub delete: bool,
    #[arg(short, long)]
    pub message: Option<String>,
}

#[derive(Args)]
pub struct MasksArgs {}
