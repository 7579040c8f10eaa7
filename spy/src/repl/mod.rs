//! Terminal front end: event rendering, approvals, and the prompt loop

mod approval;
mod render;
mod session;

pub use approval::{Approver, AutoApprover, InteractiveApprover};
pub use render::{format_approval, format_event, print_event};
pub use session::{ReplSession, build_agent, drive, first_line, run_once};
