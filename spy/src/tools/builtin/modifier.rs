//! modifier tool - string edits that require human approval

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::tools::{
    ApprovalRequest, ParamType, ParameterSchema, Tool, ToolContext, ToolError, ToolResult, parse_args,
};

#[derive(Debug, Deserialize)]
struct ModifierArgs {
    operation: String,
    input: String,
    #[serde(default)]
    target: String,
    #[serde(default)]
    replacement: String,
    #[serde(default)]
    index: i64,
}

/// Replace every occurrence of `target` with `replacement`
///
/// An empty `target` matches nothing and returns `input` unchanged.
pub fn replace_all(input: &str, target: &str, replacement: &str) -> String {
    if target.is_empty() {
        return input.to_string();
    }
    input.replace(target, replacement)
}

/// Insert `replacement` at byte offset `index`
pub fn insert_at(input: &str, index: i64, replacement: &str) -> Result<String, ToolError> {
    debug!(%index, len = input.len(), "insert_at: called");
    let invalid = || ToolError::InvalidIndex { index, len: input.len() };

    let at = usize::try_from(index).map_err(|_| invalid())?;
    if at > input.len() || !input.is_char_boundary(at) {
        return Err(invalid());
    }

    let mut out = String::with_capacity(input.len() + replacement.len());
    out.push_str(&input[..at]);
    out.push_str(replacement);
    out.push_str(&input[at..]);
    Ok(out)
}

fn apply(args: &ModifierArgs) -> Result<String, ToolError> {
    match args.operation.as_str() {
        "replace" => {
            if args.target.is_empty() {
                return Err(ToolError::EmptyTarget);
            }
            Ok(replace_all(&args.input, &args.target, &args.replacement))
        }
        "insert" => insert_at(&args.input, args.index, &args.replacement),
        "view" => Ok(args.input.clone()),
        other => Err(ToolError::UnknownOperation(other.to_string())),
    }
}

/// Edits a string; every successful edit is held for operator review
pub struct ModifierTool;

#[async_trait]
impl Tool for ModifierTool {
    fn name(&self) -> &'static str {
        "modifier"
    }

    fn description(&self) -> &'static str {
        "Modify a string by replacing, inserting, or viewing content. \
         `replace` swaps every occurrence of `target` for `replacement`; \
         `insert` puts `replacement` at byte offset `index`; `view` returns `input` as is. \
         The user reviews every change before you continue."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .required("operation", ParamType::String, "Operation to perform: replace, insert, or view")
            .required("input", ParamType::String, "The string to operate on")
            .optional("target", ParamType::String, "The substring to replace (for replace)")
            .optional("replacement", ParamType::String, "The replacement string (for replace/insert)")
            .optional("index", ParamType::Integer, "The byte offset to insert at (for insert)")
    }

    async fn execute(&self, input: Value, _ctx: &ToolContext) -> ToolResult {
        debug!(?input, "ModifierTool::execute: called");
        let args: ModifierArgs = match parse_args(self.name(), input) {
            Ok(args) => args,
            Err(e) => return e.into(),
        };

        match apply(&args) {
            Ok(after) => {
                debug!(operation = %args.operation, "ModifierTool::execute: change proposed");
                let approval = ApprovalRequest {
                    tool: self.name().to_string(),
                    before: args.input.clone(),
                    after: after.clone(),
                    description: format!("{} on a {}-byte string", args.operation, args.input.len()),
                };
                ToolResult::success(after).with_approval(approval)
            }
            Err(e) => {
                debug!(%e, "ModifierTool::execute: operation failed");
                e.into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ctx() -> ToolContext {
        ToolContext::new(None, "test")
    }

    #[test]
    fn test_replace_all() {
        assert_eq!(replace_all("ababab", "ab", "x"), "xxx");
        assert_eq!(replace_all("abc", "", "x"), "abc");
        assert_eq!(replace_all("abc", "z", "x"), "abc");
    }

    #[test]
    fn test_insert_at() {
        assert_eq!(insert_at("hello", 2, "XX").unwrap(), "heXXllo");
        assert_eq!(insert_at("hello", 5, "!").unwrap(), "hello!");
        assert_eq!(insert_at("", 0, "a").unwrap(), "a");
    }

    #[test]
    fn test_insert_at_invalid() {
        assert!(matches!(insert_at("hello", 10, "X"), Err(ToolError::InvalidIndex { .. })));
        assert!(matches!(insert_at("hello", -1, "X"), Err(ToolError::InvalidIndex { .. })));
        // 'é' is two bytes; offset 1 splits it
        assert!(matches!(insert_at("é", 1, "X"), Err(ToolError::InvalidIndex { .. })));
    }

    #[tokio::test]
    async fn test_replace_carries_approval() {
        let input = serde_json::json!({
            "operation": "replace", "input": "foo bar foo", "target": "foo", "replacement": "baz"
        });

        let result = ModifierTool.execute(input, &ctx()).await;

        assert!(!result.is_error());
        assert_eq!(result.content, "baz bar baz");
        let approval = result.approval.expect("approval attached");
        assert_eq!(approval.tool, "modifier");
        assert_eq!(approval.before, "foo bar foo");
        assert_eq!(approval.after, "baz bar baz");
    }

    #[tokio::test]
    async fn test_view_carries_approval() {
        let input = serde_json::json!({ "operation": "view", "input": "same" });

        let result = ModifierTool.execute(input, &ctx()).await;

        assert_eq!(result.content, "same");
        assert!(result.approval.is_some());
    }

    #[tokio::test]
    async fn test_error_codes() {
        let empty_target = serde_json::json!({ "operation": "replace", "input": "abc", "target": "" });
        let bad_index = serde_json::json!({ "operation": "insert", "input": "abc", "index": 9 });
        let unknown = serde_json::json!({ "operation": "delete", "input": "abc" });

        let r1 = ModifierTool.execute(empty_target, &ctx()).await;
        let r2 = ModifierTool.execute(bad_index, &ctx()).await;
        let r3 = ModifierTool.execute(unknown, &ctx()).await;

        assert_eq!((r1.error_code, r2.error_code, r3.error_code), (1, 2, 3));
        assert!(r1.approval.is_none() && r2.approval.is_none() && r3.approval.is_none());
        assert!(r3.content.contains("delete"));
    }

    #[tokio::test]
    async fn test_missing_input_is_invalid_args() {
        let result = ModifierTool.execute(serde_json::json!({ "operation": "view" }), &ctx()).await;
        assert_eq!(result.error_code, crate::tools::ERROR_INVALID_ARGS);
    }

    proptest! {
        #[test]
        fn prop_insert_at_valid_offsets(s in ".{0,24}", ins in "[a-z]{0,4}") {
            for (at, _) in s.char_indices().chain(std::iter::once((s.len(), ' '))) {
                let out = insert_at(&s, at as i64, &ins).unwrap();
                prop_assert_eq!(out.len(), s.len() + ins.len());
                prop_assert!(out.starts_with(&s[..at]));
                prop_assert!(out.ends_with(&s[at..]));
            }
        }

        #[test]
        fn prop_insert_at_past_end_fails(s in ".{0,24}", extra in 1i64..64) {
            prop_assert!(insert_at(&s, s.len() as i64 + extra, "x").is_err());
        }

        #[test]
        fn prop_replace_all_removes_target(s in "[ab]{0,32}") {
            prop_assert!(!replace_all(&s, "ab", "c").contains("ab"));
        }
    }
}
