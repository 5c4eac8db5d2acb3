//! CLI module
//!
//! - serve: load config, seed the store, run the server until Ctrl-C
//! - check-config: validate config and seed file, print effective settings

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{check_config, load_config, run, run_command, seed_store, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
