//! CLI argument definitions for the OptimalAI application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// OptimalAI - chat-driven DeFi vault assistant.
#[derive(Parser, Debug)]
#[command(name = "optimal", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API server.
    Serve {
        /// API server port.
        #[arg(short = 'p', long = "port")]
        port: Option<u16>,

        /// Data directory for the SQLite database.
        #[arg(short = 'd', long = "data-dir")]
        data_dir: Option<PathBuf>,
    },
    /// Chat with the agent over HTTP.
    Chat {
        /// Sender name sent with every message (wallet address or handle).
        #[arg(short = 'n', long = "name")]
        name: String,

        /// Agent id for the agent-scoped route.
        #[arg(long = "agent-id")]
        agent_id: Option<String>,

        /// Use the unscoped `/messages` route.
        #[arg(long = "messages-route")]
        messages_route: bool,

        /// Send the initialize-user-state command for this chain first.
        #[arg(long = "init-chain")]
        init_chain: Option<String>,
    },
    /// Replay the built-in demo conversation locally.
    Demo {
        /// Skip the replay delays.
        #[arg(long = "instant")]
        instant: bool,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > OPTIMAL_CONFIG env var > platform default (~/.optimal/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("OPTIMAL_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".optimal").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".optimal").join("config.toml");
    }
    PathBuf::from("config.toml")
}
