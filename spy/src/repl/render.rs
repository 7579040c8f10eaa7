//! Terminal rendering of step events

use colored::Colorize;
use tracing::debug;

use crate::events::{StepEvent, Termination};
use crate::tools::ApprovalRequest;

/// Longest tool output echoed to the terminal, in chars
const PREVIEW_CHARS: usize = 2_000;

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}\n{}", head, "[output shortened]".dimmed())
}

/// Render a proposed change for review
pub fn format_approval(request: &ApprovalRequest) -> String {
    format!(
        "{} {} ({})\n{}\n{}\n{}\n{}",
        "?".yellow().bold(),
        format!("{} wants to change text", request.tool).yellow(),
        request.description.dimmed(),
        "--- before".red(),
        request.before,
        "+++ after".green(),
        request.after,
    )
}

/// Render one event; `Text` chunks come back without a trailing newline
pub fn format_event(event: &StepEvent) -> String {
    debug!(kind = event.kind(), "format_event: called");
    match event {
        StepEvent::Thinking(thought) => format!("{} {}", "thinking:".dimmed(), thought.dimmed()),
        StepEvent::Text(chunk) => chunk.clone(),
        StepEvent::ToolUsage { step, tool } => {
            format!("\n{} {}", format!("[step {}]", step).bright_black(), format!("-> {}", tool).cyan())
        }
        StepEvent::ToolResult { tool, content, is_error } => {
            let label = if *is_error {
                format!("[{} error]", tool).red()
            } else {
                format!("[{}]", tool).green()
            };
            format!("{}\n{}", label, preview(content))
        }
        StepEvent::ApprovalRequest(request) => format_approval(request),
        StepEvent::Terminal(termination) => format_termination(termination),
        StepEvent::Failure(message) => format!("\n{} {}", "x".red().bold(), message.red()),
    }
}

fn format_termination(termination: &Termination) -> String {
    let closing = termination.to_string();
    match termination {
        Termination::Done(message) => format!("\n{}\n{} {}", message, "✓".green().bold(), closing.green()),
        Termination::FinalAnswer(_) => format!("\n{} {}", "✓".green().bold(), closing.green()),
        _ => format!("\n{} {}", "!".yellow().bold(), closing.yellow()),
    }
}

/// Print an event to stdout
pub fn print_event(event: &StepEvent) {
    match event {
        StepEvent::Text(chunk) => {
            print!("{}", chunk);
            let _ = std::io::Write::flush(&mut std::io::stdout());
        }
        other => println!("{}", format_event(other)),
    }
}
