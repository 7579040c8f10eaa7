//! Operator decisions on proposed changes

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::tools::{ApprovalDecision, ApprovalRequest};

/// Decides what happens to a proposed change
pub trait Approver {
    fn decide(&mut self, request: &ApprovalRequest) -> Result<ApprovalDecision>;
}

/// Accepts everything (`--yes`)
#[derive(Debug, Default)]
pub struct AutoApprover;

impl Approver for AutoApprover {
    fn decide(&mut self, request: &ApprovalRequest) -> Result<ApprovalDecision> {
        debug!(tool = %request.tool, "AutoApprover::decide: accepting");
        Ok(ApprovalDecision::Accept)
    }
}

/// Asks on the terminal: `a`ccept, `e`dit, or `d`ecline
pub struct InteractiveApprover {
    rl: DefaultEditor,
}

impl InteractiveApprover {
    pub fn new() -> Result<Self> {
        let rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;
        Ok(Self { rl })
    }

    fn read(&mut self, prompt: &str, initial: &str) -> Result<Option<String>> {
        match self.rl.readline_with_initial(prompt, (initial, "")) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(eyre::eyre!("Readline error: {}", err)),
        }
    }
}

impl Approver for InteractiveApprover {
    fn decide(&mut self, request: &ApprovalRequest) -> Result<ApprovalDecision> {
        debug!(tool = %request.tool, "InteractiveApprover::decide: called");
        loop {
            let prompt = format!("{} ", "[a]ccept / [e]dit / [d]ecline >".yellow());
            let Some(answer) = self.read(&prompt, "")? else {
                return Ok(ApprovalDecision::Decline(Some("cancelled by the user".to_string())));
            };

            match parse_choice(&answer) {
                Some(Choice::Accept) => return Ok(ApprovalDecision::Accept),
                Some(Choice::Edit) => {
                    let edited = self.read("edit> ", &request.after)?;
                    return Ok(match edited {
                        Some(text) => ApprovalDecision::Edit(text),
                        None => ApprovalDecision::Decline(None),
                    });
                }
                Some(Choice::Decline) => {
                    let reason = self.read("reason (optional)> ", "")?;
                    let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
                    return Ok(ApprovalDecision::Decline(reason));
                }
                None => println!("{} Please answer a, e, or d", "?".yellow()),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Accept,
    Edit,
    Decline,
}

fn parse_choice(answer: &str) -> Option<Choice> {
    match answer.trim().to_lowercase().as_str() {
        "a" | "accept" | "y" | "yes" => Some(Choice::Accept),
        "e" | "edit" => Some(Choice::Edit),
        "d" | "decline" | "n" | "no" => Some(Choice::Decline),
        _ => None,
    }
}
