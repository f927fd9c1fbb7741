use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand};

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

#[derive(Debug, Parser)]
#[command(name = "tdsync")]
#[command(bin_name = "tdsync")]
#[command(version)]
#[command(about = "Offline-first task sync client")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        long,
        env = "TDSYNC_TOKEN",
        hide_env_values = true,
        help = "API token. Required by commands that talk to the server."
    )]
    pub token: Option<String>,

    #[arg(
        long,
        env = "TDSYNC_CONFIG",
        help = "Config file (defaults to ~/.config/tdsync/config.toml)."
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "TDSYNC_STATE_DIR",
        help = "Directory holding the persisted cache; overrides the config file."
    )]
    pub state_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "Print machine-readable JSON.")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Fetch changes since the last pull.")]
    Pull,
    #[command(about = "List cached items.")]
    Items(ItemsArgs),
    #[command(about = "List cached projects.")]
    Projects(ProjectsArgs),
    #[command(about = "List cached labels.")]
    Labels,
    #[command(about = "Create an item, push it and pull the result.")]
    AddItem(AddItemArgs),
    #[command(about = "Complete an item, push and pull.")]
    CloseItem(CloseItemArgs),
    #[command(about = "Discard the persisted cache so the next pull is a full sync.")]
    Reset,
}

#[derive(Debug, Args)]
pub struct ItemsArgs {
    #[arg(long = "project", help = "Only items in this project id (repeatable).")]
    pub projects: Vec<i64>,

    #[arg(long, help = "Only items carrying this label name.")]
    pub label: Option<String>,

    #[arg(long, help = "Only items whose content contains this text.")]
    pub content: Option<String>,

    #[arg(long, help = "List completed items instead of open ones.")]
    pub checked: bool,

    #[arg(long, help = "Only items with a due date.")]
    pub due: bool,

    #[arg(long, help = "Include items flagged as deleted.")]
    pub include_deleted: bool,
}

#[derive(Debug, Args)]
pub struct ProjectsArgs {
    #[arg(long, help = "Include archived projects.")]
    pub archived: bool,
}

#[derive(Debug, Args)]
pub struct AddItemArgs {
    #[arg(help = "Item content.")]
    pub content: String,

    #[arg(long, help = "Project id (server default project when omitted).")]
    pub project: Option<i64>,

    #[arg(long = "label", help = "Label name (repeatable).")]
    pub labels: Vec<String>,

    #[arg(long, help = "Due date (YYYY-MM-DD) or RFC 3339 datetime.")]
    pub due: Option<String>,

    #[arg(long, help = "Priority from 1 (normal) to 4 (urgent).")]
    pub priority: Option<i64>,
}

#[derive(Debug, Args)]
pub struct CloseItemArgs {
    #[arg(help = "Item id.")]
    pub id: i64,
}
