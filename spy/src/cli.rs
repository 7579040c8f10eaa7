//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// SpyAgent - step-bounded tool-calling agent
#[derive(Parser)]
#[command(
    name = "spy",
    about = "Step-bounded tool-calling agent for the terminal",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute; starts the interactive prompt when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one session to completion
    Run {
        /// Task for the agent
        prompt: String,

        /// Step budget (overrides agent.step-budget)
        #[arg(short, long)]
        steps: Option<u32>,

        /// Working directory for commands (overrides agent.working-dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Accept every proposed change without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// List registered tools
    Tools {
        /// Print the wire schemas as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a stored session log
    Log {
        /// Session ID (printed at the end of every run)
        session_id: String,
    },
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    log_dir().join("spyagent.log")
}

/// Directory holding the application log
pub fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("spyagent")
        .join("logs")
}
