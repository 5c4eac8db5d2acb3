//! CLI argument definitions using clap
//!
//! Commands:
//! - scoreboard serve --config <path>
//! - scoreboard check-config --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Live-ranked scoreboard server
#[derive(Parser, Debug)]
#[command(name = "scoreboard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP and WebSocket server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./scoreboard.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate a configuration file and print the effective settings
    CheckConfig {
        /// Path to configuration file
        #[arg(long, default_value = "./scoreboard.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse process arguments, exiting on error
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
