//! Operator sessions: one-shot runs and the interactive prompt loop

use std::path::PathBuf;

use colored::Colorize;
use eyre::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info};

use super::approval::{Approver, AutoApprover, InteractiveApprover};
use super::render::print_event;
use crate::agent::{Agent, RunOutcome};
use crate::config::Config;
use crate::events::{JsonlSessionLog, StepEvent};
use crate::llm::{LlmClient, create_client};
use crate::prompts::{PromptLoader, SystemPromptContext};
use crate::tools::ToolRegistry;

/// Build an agent for one session from configuration
pub fn build_agent(config: &Config, llm: Box<dyn LlmClient>) -> Result<Agent> {
    debug!("build_agent: called");
    let registry = ToolRegistry::standard();
    let prompt_root = match &config.agent.working_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    let ctx = SystemPromptContext::new(&registry, config.agent.step_budget, config.agent.working_dir.as_deref());
    let system_prompt = PromptLoader::new(&prompt_root).render_system(&ctx)?;

    Ok(Agent::new(llm, registry, config.agent.clone())
        .with_system_prompt(system_prompt)
        .with_max_tokens(config.llm.max_tokens)
        .with_session_log(Box::new(JsonlSessionLog::new(&config.agent.runs_dir))))
}

/// Run a prompt, resolving every approval with `approver`, until the run ends
pub async fn drive<F>(
    agent: &mut Agent,
    prompt: &str,
    approver: &mut dyn Approver,
    on_event: &mut F,
) -> Result<RunOutcome>
where
    F: FnMut(StepEvent),
{
    debug!(prompt_len = prompt.len(), "drive: called");
    let mut outcome = agent.run(prompt, on_event).await?;
    while let RunOutcome::AwaitingApproval(request) = &outcome {
        let decision = approver.decide(request)?;
        debug!(decision = decision.label(), "drive: resuming");
        outcome = agent.resume(decision, on_event).await?;
    }
    Ok(outcome)
}

/// Run one session and print its events
pub async fn run_once(config: &Config, prompt: &str, auto_approve: bool) -> Result<RunOutcome> {
    debug!(%auto_approve, "run_once: called");
    let llm = create_client(&config.llm)?;
    let mut agent = build_agent(config, llm)?;
    let mut approver: Box<dyn Approver> = if auto_approve {
        Box::new(AutoApprover)
    } else {
        Box::new(InteractiveApprover::new()?)
    };

    let outcome = drive(&mut agent, prompt, approver.as_mut(), &mut |event| print_event(&event)).await?;
    info!(session_id = %agent.session_id(), "Session finished");
    println!("{} {}", "session:".dimmed(), agent.session_id().dimmed());
    Ok(outcome)
}

enum SlashResult {
    Continue,
    Quit,
}

/// Interactive prompt loop; each line is a new session
pub struct ReplSession {
    config: Config,
    auto_approve: bool,
}

impl ReplSession {
    pub fn new(config: Config, auto_approve: bool) -> Self {
        Self { config, auto_approve }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();
        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            match rl.readline(&format!("{} ", ">".bright_green())) {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input) {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    }

                    // A failed session is reported and the prompt stays open
                    if let Err(e) = run_once(&self.config, input, self.auto_approve).await {
                        println!("{} {}", "x".red().bold(), e);
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => return Err(eyre::eyre!("Readline error: {}", err)),
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        let dir = self
            .config
            .agent
            .working_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        println!();
        println!("{}", "SpyAgent".bright_cyan().bold());
        println!("Working directory: {}", dir.display());
        println!(
            "Step budget: {}. Type {} for help, {} to quit",
            self.config.agent.step_budget,
            "/help".yellow(),
            "/quit".yellow()
        );
        println!();
    }

    fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let cmd = input.split_whitespace().next().unwrap_or("");
        match cmd {
            "/help" | "/h" => {
                println!("  {:10} Show this help", "/help".yellow());
                println!("  {:10} List tools", "/tools".yellow());
                println!("  {:10} Exit", "/quit".yellow());
                SlashResult::Continue
            }
            "/tools" => {
                for tool in ToolRegistry::standard().iter() {
                    println!("  {:18} {}", tool.name().yellow(), first_line(tool.description()));
                }
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                SlashResult::Continue
            }
        }
    }
}

/// First line of a description, for one-line listings
pub fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("").trim()
}
