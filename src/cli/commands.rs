//! CLI command implementations

use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::http_server::HttpServer;
use crate::observability::init_logging;
use crate::rest_api::CodeService;
use crate::store::{MongoBackend, StoreHandler};

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::write_json;

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve {
            config,
            port,
            memory,
        } => serve(&config, port, memory),
        Command::Check { config } => check(&config),
    }
}

/// Start the HTTP API and block until it stops
pub fn serve(config_path: &Path, port: Option<u16>, memory: bool) -> CliResult<()> {
    let mut config = Config::load(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }

    init_logging(config.log_format);

    let rt = runtime()?;
    rt.block_on(async {
        let store = open_store(&config, memory).await?;
        let service = Arc::new(CodeService::with_collection(
            store,
            config.database.clone(),
            config.code_collection.clone(),
        ));

        HttpServer::new(config.server.clone(), service)
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Load the configuration, ping the store and report the result on stdout
pub fn check(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    init_logging(config.log_format);

    let rt = runtime()?;
    rt.block_on(async {
        let store = open_store(&config, false).await?;
        store.ping().await?;
        Ok::<_, CliError>(())
    })?;

    let report = json!({
        "status": "ok",
        "store": config.mongodb.uri(),
        "database": config.database,
        "code_collection": config.code_collection,
    });
    write_json(&report)
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))
}

async fn open_store(config: &Config, memory: bool) -> CliResult<Arc<StoreHandler>> {
    if memory {
        info!("using in-memory document store");
        return Ok(Arc::new(StoreHandler::in_memory()));
    }

    let backend = MongoBackend::connect(&config.mongodb).await?;
    info!(endpoint = %config.mongodb.uri(), "created MongoDB client");
    Ok(Arc::new(StoreHandler::new(Arc::new(backend))))
}
