//! # Precog CLI Module
//!
//! ## Available Commands
//!
//! - `serve` - Start the HTTP ingest server
//! - `replay` - Drive a session from a recorded frame file
//! - `verify` - Check an action sequence file line by line
//! - `config` - Show the effective configuration (default)

mod commands;

use crate::config::{load_config, resolve_config};
use clap::{Parser, Subcommand};
use precog_core::PrecogError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Precog - in-game action sequence collector
///
/// Samples player state on a fixed tick cadence and writes
/// Action1 -> Action2 transitions as JSONL training data.
#[derive(Parser, Debug)]
#[command(name = "precog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// TOML config file
    #[arg(short, long, global = true, env = "PRECOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the output file
    #[arg(short = 'D', long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Output file name inside the data directory
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP ingest server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Replay a recorded JSONL file of tick and chat frames
    Replay {
        /// Path to the frame file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Verify an action sequence file
    Verify {
        /// File to check (defaults to the configured output file)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Report every invalid line instead of stopping at the first
        #[arg(short, long)]
        keep_going: bool,
    },

    /// Show the effective configuration
    Config,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), PrecogError> {
    let config = resolve_config(
        load_config(cli.config.as_deref())?,
        cli.data_dir,
        cli.output,
    )?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Serve { host, port }) => cmd_serve(config, &host, port).await,
        Some(Commands::Replay { file }) => cmd_replay(config, &file, json_mode, cli.verbose),
        Some(Commands::Verify { file, keep_going }) => {
            let file = file.unwrap_or_else(|| config.output_path());
            cmd_verify(&file, keep_going, json_mode, cli.verbose)
        }
        Some(Commands::Config) | None => cmd_config(&config, json_mode),
    }
}
