//! CLI command implementations
//!
//! `serve` boot order:
//! 1. Configuration load and validation
//! 2. Store seeding
//! 3. Background loops (broadcast, load sampling)
//! 4. HTTP and WebSocket activation
//!
//! Ctrl-C stops accepting connections, then stops the background loops.

use std::path::Path;
use std::sync::Arc;

use crate::config::ScoreboardConfig;
use crate::engine::Scoreboard;
use crate::http_server::HttpServer;
use crate::observability::{log_event, log_event_with_fields, Event, Logger};
use crate::store::MemoryRecordStore;

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Parse arguments and dispatch. The only function `main` calls.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Dispatch a parsed command
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::CheckConfig { config } => check_config(&config),
    }
}

/// Load `path` and apply command-line overrides
pub fn load_config(path: &Path, port: Option<u16>) -> CliResult<ScoreboardConfig> {
    let mut config = ScoreboardConfig::load(path)?;
    if let Some(port) = port {
        config.port = port;
    }

    let port = config.port.to_string();
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("host", config.host.as_str()), ("port", port.as_str())],
    );
    Ok(config)
}

/// Build the store described by `config`
pub fn seed_store(config: &ScoreboardConfig) -> CliResult<MemoryRecordStore> {
    let store = match &config.seed_file {
        Some(path) => MemoryRecordStore::from_seed_file(path)?,
        None => MemoryRecordStore::new(),
    };

    let records = store.len().to_string();
    log_event_with_fields(Event::StoreSeeded, &[("records", records.as_str())]);
    Ok(store)
}

/// Run the server until ctrl-c
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let config = load_config(config_path, port)?;
    let store = seed_store(&config)?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::serve_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        log_event(Event::ServerStart);
        let scoreboard = Scoreboard::start(config, Arc::new(store));
        let server = HttpServer::new(Arc::clone(&scoreboard));

        let result = server.start(shutdown_signal()).await;
        scoreboard.shutdown();

        match result {
            Ok(()) => {
                log_event(Event::ServerStop);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                log_event_with_fields(Event::ServerFailed, &[("error", message.as_str())]);
                Err(CliError::serve_failed(format!("HTTP server failed: {}", message)))
            }
        }
    })
}

/// Validate the configuration and seed file, then print the effective
/// settings as JSON
pub fn check_config(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path, None)?;
    seed_store(&config)?;

    let json = serde_json::to_string_pretty(&config)
        .map_err(|e| CliError::config_error(format!("Failed to render config: {}", e)))?;
    println!("{}", json);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        let message = e.to_string();
        Logger::error("SHUTDOWN_SIGNAL_FAILED", &[("error", message.as_str())]);
        // Without a signal handler, run until the process is killed
        std::future::pending::<()>().await;
    }
}
