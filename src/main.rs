use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use taskboard::common::Column;

mod cmd;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(version, about = "Kanban and Scrum board client with optimistic moves")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Backend base URL. Overrides TASKBOARD_URL and taskboard.toml.
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Project id. Overrides TASKBOARD_PROJECT and taskboard.toml.
    #[arg(long, global = true)]
    pub project: Option<i64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the board as columns and lanes
    Board {
        /// Print the board view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move a work item to another column, lane or position
    Move {
        item: i64,
        /// Target column (new, ready, in_progress, ready_for_test, done, archived)
        column: Column,
        /// Target lane id. Omit for items without a lane.
        #[arg(long)]
        lane: Option<i64>,
        /// Position within the target column/lane (defaults to the end)
        #[arg(long)]
        index: Option<usize>,
    },
    /// List or add swimlanes
    Lanes {
        #[command(subcommand)]
        command: Option<LanesCommands>,
    },
    /// Show the Scrum backlog and sprint plans
    Backlog {
        #[command(subcommand)]
        command: Option<BacklogCommands>,

        #[arg(long)]
        json: bool,
    },
    /// Show project members and roles
    Team {
        #[command(subcommand)]
        command: Option<TeamCommands>,
    },
    /// Show a work item's activity log
    Activity {
        item: i64,
        /// Delete a comment from the item instead of listing activity
        #[arg(long)]
        delete_comment: Option<i64>,
    },
    /// Run the in-memory stub backend
    Stub {
        #[arg(short, long, default_value = "3141")]
        port: u16,

        /// Enable dev mode (permissive CORS, bind on all interfaces)
        #[arg(long)]
        dev: bool,

        /// Reject every move with 409 Conflict
        #[arg(long)]
        reject_moves: bool,

        /// Start without the demo project
        #[arg(long)]
        empty: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum LanesCommands {
    /// List lanes (default)
    List,
    /// Create a lane
    Add { name: String },
}

#[derive(Subcommand, Clone)]
pub enum BacklogCommands {
    /// Plan a story into a sprint
    Plan { item: i64, sprint: i64 },
    /// Return a story to the product backlog
    Unplan { item: i64 },
}

#[derive(Subcommand, Clone)]
pub enum TeamCommands {
    /// Change a member's role
    SetRole { member: i64, role: i64 },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default taskboard.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let config = taskboard::config::TaskboardConfig::with_cli_args(
        project_dir.clone(),
        cli.verbose,
        cli.url.clone(),
        cli.project,
    )?;
    let log_dir = config.log_dir();
    // A bad [logging] section must not block `config validate`.
    let _log_guard =
        match taskboard::logging::init_tracing(&config.toml.logging, log_dir.as_deref(), cli.verbose) {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Warning: logging disabled: {:#}", e);
                None
            }
        };

    match &cli.command {
        Commands::Board { json } => cmd::cmd_board(&config, *json).await?,
        Commands::Move {
            item,
            column,
            lane,
            index,
        } => cmd::cmd_move(&config, *item, *column, *lane, *index).await?,
        Commands::Lanes { command } => cmd::cmd_lanes(&config, command.clone()).await?,
        Commands::Backlog { command, json } => {
            cmd::cmd_backlog(&config, command.clone(), *json).await?
        }
        Commands::Team { command } => cmd::cmd_team(&config, command.clone()).await?,
        Commands::Activity {
            item,
            delete_comment,
        } => cmd::cmd_activity(&config, *item, *delete_comment).await?,
        Commands::Stub {
            port,
            dev,
            reject_moves,
            empty,
        } => cmd::cmd_stub(*port, *dev, *reject_moves, *empty).await?,
        Commands::Config { command } => cmd::cmd_config(&config, command.clone())?,
    }

    Ok(())
}
