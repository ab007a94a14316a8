//! Vacuum CLI - vac command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod logging;
mod system_config;

/// Vacuum - checkpoint and edit history for Lean workspaces
#[derive(Parser)]
#[command(name = "vac")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh checkpoints of every tracked file under the given roots
    Refresh {
        /// Tracked roots (default: current directory)
        roots: Vec<PathBuf>,
    },
    /// Log newline-delimited change events read from stdin
    LogEdit {
        /// Tracked roots the events belong to
        #[arg(long = "root", required = true)]
        roots: Vec<PathBuf>,
    },
    /// Watch roots for saves and log change events from stdin
    Daemon {
        /// Tracked roots (default: current directory)
        roots: Vec<PathBuf>,
        /// Write logs to this file instead of stderr
        #[arg(long)]
        log_file: Option<PathBuf>,
        /// Do not read change events from stdin (watch saves only)
        #[arg(long)]
        no_stdin: bool,
    },
    /// List the checkpoints and edits recorded for a file
    History {
        file: PathBuf,
        /// Tracked root (default: nearest ancestor holding a log)
        #[arg(long)]
        root: Option<PathBuf>,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a file as it was at a point in time
    Replay {
        file: PathBuf,
        /// Epoch milliseconds (default: latest)
        #[arg(long)]
        at: Option<u64>,
        /// Tracked root (default: nearest ancestor holding a log)
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// View or edit configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,
    /// Print one value
    Get { key: String },
    /// Set one value
    Set { key: String, value: String },
    /// Show the config file path
    Path {
        /// Create the file with defaults if missing
        #[arg(long)]
        create: bool,
    },
    /// Print an annotated example configuration
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Held until exit so buffered log lines are flushed
    let _log_guard = match &cli.command {
        Commands::Daemon {
            log_file: Some(path),
            ..
        } => Some(logging::init_file(cli.verbose, path)?),
        _ => {
            logging::init(cli.verbose);
            None
        }
    };

    let config_path = cli.config.as_deref();
    let config = match &cli.command {
        Commands::Config(config_cmd) => {
            return match config_cmd {
                ConfigCommands::List => cmd::config::run_list(config_path),
                ConfigCommands::Get { key } => cmd::config::run_get(config_path, key),
                ConfigCommands::Set { key, value } => cmd::config::run_set(config_path, key, value),
                ConfigCommands::Path { create } => cmd::config::run_path(config_path, *create),
                ConfigCommands::Example => cmd::config::run_example(),
            };
        }
        _ => system_config::load(config_path)?,
    };

    match cli.command {
        Commands::Refresh { roots } => cmd::refresh::run(&config, roots).await,
        Commands::LogEdit { roots } => cmd::log_edit::run(&config, roots).await,
        Commands::Daemon { roots, no_stdin, .. } => cmd::daemon::run(&config, roots, !no_stdin).await,
        Commands::History { file, root, json } => cmd::history::run(&config, &file, root, json).await,
        Commands::Replay { file, at, root } => cmd::replay::run(&config, &file, at, root).await,
        Commands::Config(_) => Ok(()),
    }
}
