//! CLI argument definitions using clap
//!
//! Commands:
//! - stocklab serve --config <path> [--port <n>] [--memory]
//! - stocklab check --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// stocklab - stock reference data API
#[derive(Parser, Debug)]
#[command(name = "stocklab")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./stocklab.json")]
        config: PathBuf,

        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,

        /// Serve from an empty in-memory store instead of MongoDB
        #[arg(long)]
        memory: bool,
    },

    /// Validate configuration and check that the store answers
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./stocklab.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["stocklab", "serve"]).unwrap();
        match cli.command {
            Command::Serve { config, port, memory } => {
                assert_eq!(config, PathBuf::from("./stocklab.json"));
                assert_eq!(port, None);
                assert!(!memory);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_serve_overrides() {
        let cli =
            Cli::try_parse_from(["stocklab", "serve", "--port", "8080", "--memory"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Serve { port: Some(8080), memory: true, .. }
        ));
    }

    #[test]
    fn test_check_config_path() {
        let cli = Cli::try_parse_from(["stocklab", "check", "--config", "conf/prod.json"]).unwrap();
        assert!(matches!(cli.command, Command::Check { .. }));
    }
}
