//! CLI module for stocklab
//!
//! Provides command-line interface for:
//! - serve: Start the HTTP API over MongoDB (or an in-memory store)
//! - check: Validate configuration and ping the store

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, run, run_command, serve};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
