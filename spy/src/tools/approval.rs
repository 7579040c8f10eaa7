//! Approval gate types

use serde::{Deserialize, Serialize};

/// A pending human decision on a proposed change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Tool that produced the change
    pub tool: String,
    pub before: String,
    pub after: String,
    pub description: String,
}

/// Outcome of reviewing an `ApprovalRequest`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalDecision {
    /// Keep the proposed text
    Accept,
    /// Replace the proposed text with the operator's version
    Edit(String),
    /// Reject the change, optionally saying why
    Decline(Option<String>),
}

impl ApprovalDecision {
    /// Prompt sent to the model once the decision is made
    pub fn to_prompt(&self, request: &ApprovalRequest) -> String {
        match self {
            ApprovalDecision::Accept => format!(
                "The user accepted the {} change. The text is now:\n{}",
                request.tool, request.after
            ),
            ApprovalDecision::Edit(text) => format!(
                "The user edited the {} change before accepting it. The text is now:\n{}",
                request.tool, text
            ),
            ApprovalDecision::Decline(Some(reason)) => format!(
                "The user declined the {} change: {}. The text is unchanged:\n{}",
                request.tool, reason, request.before
            ),
            ApprovalDecision::Decline(None) => format!(
                "The user declined the {} change. The text is unchanged:\n{}",
                request.tool, request.before
            ),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ApprovalDecision::Accept => "accepted",
            ApprovalDecision::Edit(_) => "edited",
            ApprovalDecision::Decline(_) => "declined",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ApprovalRequest {
        ApprovalRequest {
            tool: "modifier".to_string(),
            before: "hello".to_string(),
            after: "heXXllo".to_string(),
            description: "insert".to_string(),
        }
    }

    #[test]
    fn test_accept_prompt_carries_after() {
        let prompt = ApprovalDecision::Accept.to_prompt(&request());
        assert!(prompt.contains("accepted"));
        assert!(prompt.ends_with("heXXllo"));
    }

    #[test]
    fn test_edit_prompt_carries_edit() {
        let prompt = ApprovalDecision::Edit("hey".to_string()).to_prompt(&request());
        assert!(prompt.contains("edited"));
        assert!(prompt.ends_with("hey"));
    }

    #[test]
    fn test_decline_prompt_keeps_before() {
        let prompt = ApprovalDecision::Decline(Some("too risky".to_string())).to_prompt(&request());
        assert!(prompt.contains("too risky"));
        assert!(prompt.ends_with("hello"));
        assert_eq!(ApprovalDecision::Decline(None).label(), "declined");
    }
}
