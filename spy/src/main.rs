use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use std::fs;
use tracing::{debug, info};

use spyagent::agent::RunOutcome;
use spyagent::cli::{Cli, Command, get_log_path, log_dir};
use spyagent::config::Config;
use spyagent::events::read_session_log;
use spyagent::repl::{ReplSession, first_line, run_once};
use spyagent::tools::ToolRegistry;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = log_dir();
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(get_log_path()).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn generate_after_help() -> String {
    format!(
        "Logs are written to: {}\nWith no command, spy starts an interactive prompt.",
        get_log_path().display()
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(provider = %config.llm.provider, model = %config.llm.model, "SpyAgent loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Run { prompt, steps, dir, yes }) => {
            if let Some(steps) = steps {
                config.agent.step_budget = steps;
            }
            if dir.is_some() {
                config.agent.working_dir = dir;
            }
            cmd_run(&config, &prompt, yes).await
        }
        Some(Command::Tools { json }) => cmd_tools(json),
        Some(Command::Log { session_id }) => cmd_log(&config, &session_id),
        None => {
            config.validate()?;
            ReplSession::new(config, false).run().await
        }
    }
}

async fn cmd_run(config: &Config, prompt: &str, yes: bool) -> Result<()> {
    debug!(%yes, "cmd_run: called");
    config.validate()?;
    match run_once(config, prompt, yes).await? {
        RunOutcome::Failed(message) => Err(eyre::eyre!("Session failed: {}", message)),
        _ => Ok(()),
    }
}

fn cmd_tools(json: bool) -> Result<()> {
    debug!(%json, "cmd_tools: called");
    let registry = ToolRegistry::standard();
    if json {
        let schemas: Vec<serde_json::Value> = registry.definitions().iter().map(|d| d.to_openai_schema()).collect();
        println!("{}", serde_json::to_string_pretty(&schemas)?);
        return Ok(());
    }

    for tool in registry.iter() {
        let marker = if tool.is_terminal() { " (terminal)" } else { "" };
        println!("{}{}", tool.name().yellow().bold(), marker.dimmed());
        println!("  {}", first_line(tool.description()));
    }
    Ok(())
}

fn cmd_log(config: &Config, session_id: &str) -> Result<()> {
    debug!(%session_id, "cmd_log: called");
    let entries = read_session_log(&config.agent.runs_dir, session_id)?;
    if entries.is_empty() {
        return Err(eyre::eyre!(
            "No session log found for {} in {}",
            session_id,
            config.agent.runs_dir.display()
        ));
    }

    for entry in entries {
        println!(
            "{} {} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            entry.event.cyan(),
            entry.data
        );
    }
    Ok(())
}
