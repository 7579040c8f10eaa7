//! Agent - the query/parse/dispatch step loop
//!
//! Each step optionally runs the thinking tool, sends the current prompt to the
//! LLM, and either ends the run or dispatches the requested tool and feeds its
//! output back as the next prompt. A tool result that carries an approval
//! request suspends the loop until `Agent::resume` is called.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::parser::parse_tool_call;
use super::transcript::{Speaker, Transcript};
use crate::config::{AgentConfig, LlmConfig};
use crate::events::{LogEntry, NullSessionLog, SessionLog, StepEvent, Termination, word_chunks};
use crate::llm::{CompletionRequest, LlmClient, Message};
use crate::prompts::{default_system_prompt, embedded};
use crate::tools::{ApprovalDecision, ApprovalRequest, ToolContext, ToolRegistry, ToolResult};

/// Name of the tool that runs before every query when registered
pub const THINKING_TOOL: &str = "thinking";

/// Misuse of the agent API
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AgentError {
    #[error("An approval is pending; resolve it with resume before running again")]
    ApprovalPending,

    #[error("No approval is pending")]
    NoPendingApproval,
}

/// Where a call to `run` or `resume` stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run is over
    Terminated(Termination),
    /// A change needs review; call `resume` with a decision
    AwaitingApproval(ApprovalRequest),
    /// The LLM client failed
    Failed(String),
}

impl RunOutcome {
    pub fn termination(&self) -> Option<&Termination> {
        match self {
            RunOutcome::Terminated(t) => Some(t),
            _ => None,
        }
    }
}

/// One operator session: transcript, step budget, tools, and LLM client
pub struct Agent {
    llm: Box<dyn LlmClient>,
    registry: ToolRegistry,
    system_prompt: String,
    max_tokens: u32,
    ctx: ToolContext,
    transcript: Transcript,
    steps_remaining: u32,
    steps_taken: u32,
    pending: Option<ApprovalRequest>,
    log: Box<dyn SessionLog>,
    log_open: bool,
}

impl Agent {
    /// Create an agent with the embedded system prompt and no session log
    pub fn new(llm: Box<dyn LlmClient>, registry: ToolRegistry, config: AgentConfig) -> Self {
        let session_id = uuid::Uuid::now_v7().to_string();
        debug!(%session_id, step_budget = config.step_budget, tools = registry.len(), "Agent::new: called");

        let system_prompt = default_system_prompt(&registry, config.step_budget, config.working_dir.as_deref())
            .unwrap_or_else(|e| {
                warn!(error = %e, "Agent::new: falling back to the raw system template");
                embedded::SYSTEM.to_string()
            });

        let ctx = ToolContext::new(config.working_dir.clone(), session_id)
            .with_command_timeout(config.command_timeout_ms.map(Duration::from_millis));

        Self {
            llm,
            registry,
            system_prompt,
            max_tokens: LlmConfig::default().max_tokens,
            ctx,
            transcript: Transcript::new(),
            steps_remaining: config.step_budget,
            steps_taken: 0,
            pending: None,
            log: Box::new(NullSessionLog),
            log_open: false,
        }
    }

    /// Builder method to replace the system prompt
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Builder method to record the session somewhere
    pub fn with_session_log(mut self, log: Box<dyn SessionLog>) -> Self {
        self.log = log;
        self
    }

    /// Builder method to cap tokens per completion
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.ctx.session_id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn steps_remaining(&self) -> u32 {
        self.steps_remaining
    }

    pub fn pending_approval(&self) -> Option<&ApprovalRequest> {
        self.pending.as_ref()
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Start a run from an operator prompt
    pub async fn run<F>(&mut self, prompt: &str, on_event: &mut F) -> Result<RunOutcome, AgentError>
    where
        F: FnMut(StepEvent),
    {
        debug!(session_id = %self.session_id(), prompt_len = prompt.len(), "Agent::run: called");
        if self.pending.is_some() {
            debug!("Agent::run: approval pending");
            return Err(AgentError::ApprovalPending);
        }

        self.open_log();
        self.record(LogEntry::new(
            "session_started",
            json!({
                "session_id": self.session_id(),
                "prompt": prompt,
                "steps_remaining": self.steps_remaining,
            }),
        ));
        info!(session_id = %self.session_id(), steps = self.steps_remaining, "Agent run started");

        self.transcript.push(Speaker::User, prompt);
        Ok(self.step_loop(prompt.to_string(), on_event).await)
    }

    /// Resolve the pending approval and continue with the remaining budget
    pub async fn resume<F>(&mut self, decision: ApprovalDecision, on_event: &mut F) -> Result<RunOutcome, AgentError>
    where
        F: FnMut(StepEvent),
    {
        debug!(?decision, "Agent::resume: called");
        let Some(request) = self.pending.take() else {
            debug!("Agent::resume: nothing pending");
            return Err(AgentError::NoPendingApproval);
        };

        let prompt = decision.to_prompt(&request);
        info!(tool = %request.tool, decision = decision.label(), "Approval resolved");
        self.record(LogEntry::new(
            "approval_decision",
            json!({ "tool": request.tool, "decision": decision.label() }),
        ));
        self.transcript.push(Speaker::Approval, prompt.clone());

        Ok(self.step_loop(prompt, on_event).await)
    }

    async fn step_loop<F>(&mut self, mut prompt: String, on_event: &mut F) -> RunOutcome
    where
        F: FnMut(StepEvent),
    {
        loop {
            if self.steps_remaining == 0 {
                debug!("step_loop: budget exhausted");
                return self.finish(Termination::StepLimitReached, on_event);
            }
            self.steps_remaining -= 1;
            self.steps_taken += 1;
            let step = self.steps_taken;
            debug!(%step, remaining = self.steps_remaining, "step_loop: step start");

            // Thinking
            let thought = match self.registry.lookup(THINKING_TOOL) {
                Some(tool) => {
                    let args = json!({ "step": step, "rethink": false, "content": prompt, "summary": "" });
                    Some(tool.execute(args, &self.ctx).await)
                }
                None => None,
            };
            if let Some(thought) = thought {
                self.emit(StepEvent::Thinking(thought.content), on_event);
            }

            // Querying
            let request = CompletionRequest {
                system_prompt: self.system_prompt.clone(),
                messages: vec![Message::user(prompt.as_str())],
                tools: self.registry.definitions(),
                max_tokens: self.max_tokens,
            };
            let reply = match self.llm.complete(request).await {
                Ok(response) => {
                    debug!(
                        %step,
                        input_tokens = response.usage.input_tokens,
                        output_tokens = response.usage.output_tokens,
                        "step_loop: LLM response received"
                    );
                    response.content
                }
                Err(e) => {
                    warn!(%step, error = %e, "LLM request failed");
                    return self.fail(format!("LLM request failed: {}", e), on_event);
                }
            };

            // Parsing
            for chunk in word_chunks(&reply) {
                on_event(StepEvent::Text(chunk));
            }
            self.record(LogEntry::new("assistant", json!(reply)));
            self.transcript.push(Speaker::Assistant, reply.as_str());

            let call = match parse_tool_call(&reply) {
                Ok(Some(call)) => call,
                Ok(None) => return self.finish(Termination::FinalAnswer(reply), on_event),
                Err(e) => return self.finish(Termination::MalformedToolCall(e.to_string()), on_event),
            };

            // Dispatching
            self.record(LogEntry::new(
                "tool_usage",
                json!({ "step": step, "tool": call.name, "arguments": call.arguments }),
            ));
            on_event(StepEvent::ToolUsage {
                step,
                tool: call.name.clone(),
            });
            let (result, terminal) = match self.registry.lookup(&call.name) {
                Some(tool) => (tool.execute(call.arguments_value(), &self.ctx).await, tool.is_terminal()),
                None => return self.finish(Termination::ToolNotFound(call.name), on_event),
            };
            let ToolResult {
                content,
                error,
                approval,
                ..
            } = result;
            self.transcript.push(Speaker::Tool(call.name.clone()), content.as_str());

            if let Some(request) = approval {
                info!(tool = %call.name, "Awaiting approval");
                self.pending = Some(request.clone());
                self.emit(StepEvent::ApprovalRequest(request.clone()), on_event);
                return RunOutcome::AwaitingApproval(request);
            }

            // The terminal tool ends the run even when its arguments were bad
            if terminal {
                if let Some(ref message) = error {
                    warn!(tool = %call.name, %message, "Terminal tool failed; ending run");
                }
                return self.finish(Termination::Done(content), on_event);
            }

            if let Some(ref message) = error {
                debug!(tool = %call.name, %message, "step_loop: tool reported an error");
            }
            self.emit(
                StepEvent::ToolResult {
                    tool: call.name,
                    content: content.clone(),
                    is_error: error.is_some(),
                },
                on_event,
            );
            prompt = content;
        }
    }

    fn emit<F>(&mut self, event: StepEvent, on_event: &mut F)
    where
        F: FnMut(StepEvent),
    {
        self.record(LogEntry::from_step(&event));
        on_event(event);
    }

    fn finish<F>(&mut self, termination: Termination, on_event: &mut F) -> RunOutcome
    where
        F: FnMut(StepEvent),
    {
        info!(session_id = %self.session_id(), %termination, steps = self.steps_taken, "Agent run finished");
        self.emit(StepEvent::Terminal(termination.clone()), on_event);
        self.close_log();
        RunOutcome::Terminated(termination)
    }

    fn fail<F>(&mut self, message: String, on_event: &mut F) -> RunOutcome
    where
        F: FnMut(StepEvent),
    {
        self.emit(StepEvent::Failure(message.clone()), on_event);
        self.close_log();
        RunOutcome::Failed(message)
    }

    fn open_log(&mut self) {
        if self.log_open {
            return;
        }
        let session_id = self.ctx.session_id.clone();
        match self.log.open(&session_id) {
            Ok(()) => self.log_open = true,
            Err(e) => warn!(%session_id, error = %e, "Failed to open session log"),
        }
    }

    fn close_log(&mut self) {
        if self.log_open {
            self.log.close();
            self.log_open = false;
        }
    }

    fn record(&mut self, entry: LogEntry) {
        if !self.log_open {
            return;
        }
        if let Err(e) = self.log.record(&entry) {
            warn!(event = %entry.event, error = %e, "Failed to write session log entry");
        }
    }
}

/// Run one session from a prompt with a fresh agent
///
/// Returns the agent too, so a caller can `resume` after an approval.
pub async fn run_session<F>(
    prompt: &str,
    registry: ToolRegistry,
    step_budget: u32,
    working_dir: Option<PathBuf>,
    llm: Box<dyn LlmClient>,
    mut on_event: F,
) -> (Agent, Result<RunOutcome, AgentError>)
where
    F: FnMut(StepEvent),
{
    debug!(%step_budget, ?working_dir, "run_session: called");
    let config = AgentConfig {
        step_budget,
        working_dir,
        ..AgentConfig::default()
    };
    let mut agent = Agent::new(llm, registry, config);
    let outcome = agent.run(prompt, &mut on_event).await;
    (agent, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::JsonlSessionLog;
    use crate::llm::mock::MockLlmClient;
    use crate::tools::builtin::{BashTool, DoneTool, ModifierTool};
    use std::sync::atomic::Ordering;
    use tempfile::tempdir;

    fn fence(name: &str, arguments: serde_json::Value) -> String {
        format!("```json\n{}\n```", json!({ "name": name, "arguments": arguments }))
    }

    fn config(step_budget: u32) -> AgentConfig {
        AgentConfig {
            step_budget,
            ..AgentConfig::default()
        }
    }

    fn registry_without_thinking() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(BashTool)).unwrap();
        registry.register(Box::new(ModifierTool)).unwrap();
        registry.register(Box::new(DoneTool)).unwrap();
        registry
    }

    async fn run_collect(agent: &mut Agent, prompt: &str) -> (RunOutcome, Vec<StepEvent>) {
        let mut events = Vec::new();
        let outcome = agent.run(prompt, &mut |e| events.push(e)).await.unwrap();
        (outcome, events)
    }

    #[tokio::test]
    async fn test_final_answer_without_tool_call() {
        let llm = MockLlmClient::new(vec!["The answer is 42."]);
        let mut agent = Agent::new(Box::new(llm), registry_without_thinking(), config(5));

        let (outcome, events) = run_collect(&mut agent, "question").await;

        assert_eq!(
            outcome,
            RunOutcome::Terminated(Termination::FinalAnswer("The answer is 42.".to_string()))
        );
        let text: String = events
            .iter()
            .filter_map(|e| match e {
                StepEvent::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "The answer is 42.");
        assert_eq!(events.iter().filter(|e| e.is_final()).count(), 1);
        assert_eq!(agent.steps_remaining(), 4);
    }

    #[tokio::test]
    async fn test_done_message_verbatim() {
        let message = "Finished:\n  * one\n  * two  ";
        let reply = fence("done", json!({ "message": message }));
        let llm = MockLlmClient::new(vec![reply.as_str()]);
        let mut agent = Agent::new(Box::new(llm), registry_without_thinking(), config(5));

        let (outcome, events) = run_collect(&mut agent, "go").await;

        assert_eq!(outcome, RunOutcome::Terminated(Termination::Done(message.to_string())));
        assert!(events.contains(&StepEvent::ToolUsage {
            step: 1,
            tool: "done".to_string()
        }));
    }

    #[tokio::test]
    async fn test_failing_done_still_terminates() {
        let reply = fence("done", json!({ "msg": "oops" }));
        let llm = MockLlmClient::new(vec![reply.as_str(); 3]);
        let calls = llm.call_counter();
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(DoneTool)).unwrap();
        let mut agent = Agent::new(Box::new(llm), registry, config(3));

        let (outcome, events) = run_collect(&mut agent, "finish up").await;

        let RunOutcome::Terminated(Termination::Done(content)) = outcome else {
            panic!("expected Done, got {outcome:?}");
        };
        assert!(content.starts_with("Error: "), "got: {content}");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(events.iter().filter(|e| e.is_final()).count(), 1);
        assert!(!events.iter().any(|e| matches!(e, StepEvent::ToolResult { .. })));
    }

    #[tokio::test]
    async fn test_failing_modifier_skips_approval_and_continues() {
        let bad_insert = fence(
            "modifier",
            json!({ "operation": "insert", "input": "hello", "index": 99, "replacement": "X" }),
        );
        let finish = fence("done", json!({ "message": "gave up on the insert" }));
        let llm = MockLlmClient::new(vec![bad_insert.as_str(), finish.as_str()]);
        let requests = llm.request_log();
        let mut agent = Agent::new(Box::new(llm), registry_without_thinking(), config(5));

        let (outcome, events) = run_collect(&mut agent, "insert something").await;

        assert_eq!(
            outcome,
            RunOutcome::Terminated(Termination::Done("gave up on the insert".to_string()))
        );
        assert!(!events.iter().any(|e| matches!(e, StepEvent::ApprovalRequest(_))));
        assert!(events.iter().any(|e| matches!(e, StepEvent::ToolResult { is_error: true, .. })));
        assert!(agent.pending_approval().is_none());

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].messages[0].content.contains("invalid index"));
    }

    #[tokio::test]
    async fn test_step_limit_after_exactly_budget_iterations() {
        let reply = fence("bash", json!({ "command": "echo again" }));
        let llm = MockLlmClient::new(vec![reply.as_str(); 10]);
        let calls = llm.call_counter();
        let mut agent = Agent::new(Box::new(llm), registry_without_thinking(), config(3));

        let (outcome, events) = run_collect(&mut agent, "loop forever").await;

        assert_eq!(outcome, RunOutcome::Terminated(Termination::StepLimitReached));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(agent.steps_remaining(), 0);
        let usages = events.iter().filter(|e| matches!(e, StepEvent::ToolUsage { .. })).count();
        assert_eq!(usages, 3);
    }

    #[tokio::test]
    async fn test_tool_output_becomes_next_prompt() {
        let temp = tempdir().unwrap();
        let first = fence("bash", json!({ "command": "echo from-tool" }));
        let llm = MockLlmClient::new(vec![first.as_str(), "ok"]);
        let requests = llm.request_log();
        let cfg = AgentConfig {
            working_dir: Some(temp.path().to_path_buf()),
            ..config(5)
        };
        let mut agent = Agent::new(Box::new(llm), registry_without_thinking(), cfg);

        let (outcome, _) = run_collect(&mut agent, "start").await;

        assert!(matches!(outcome, RunOutcome::Terminated(Termination::FinalAnswer(_))));
        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(requests[0].messages[0].content, "start");
        assert_eq!(requests[1].messages.len(), 1);
        assert_eq!(requests[1].messages[0].content, "from-tool\n");
        assert_eq!(requests[1].tools.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_tool_terminates() {
        let reply = fence("grep", json!({}));
        let llm = MockLlmClient::new(vec![reply.as_str()]);
        let mut agent = Agent::new(Box::new(llm), registry_without_thinking(), config(5));

        let (outcome, events) = run_collect(&mut agent, "go").await;

        assert_eq!(outcome, RunOutcome::Terminated(Termination::ToolNotFound("grep".to_string())));
        assert!(matches!(events.last(), Some(StepEvent::Terminal(_))));
    }

    #[tokio::test]
    async fn test_malformed_call_terminates() {
        let llm = MockLlmClient::new(vec!["```json\n{\"name\": \"bash\"\n"]);
        let mut agent = Agent::new(Box::new(llm), registry_without_thinking(), config(5));

        let (outcome, _) = run_collect(&mut agent, "go").await;

        assert!(matches!(
            outcome,
            RunOutcome::Terminated(Termination::MalformedToolCall(_))
        ));
    }

    #[tokio::test]
    async fn test_llm_failure() {
        let llm = MockLlmClient::new(vec![]).then_fail("connection reset");
        let mut agent = Agent::new(Box::new(llm), registry_without_thinking(), config(5));

        let (outcome, events) = run_collect(&mut agent, "go").await;

        let RunOutcome::Failed(message) = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert!(message.contains("connection reset"));
        assert!(matches!(events.last(), Some(StepEvent::Failure(_))));
    }

    #[tokio::test]
    async fn test_approval_suspends_and_resumes() {
        let modify = fence(
            "modifier",
            json!({ "operation": "insert", "input": "hello", "index": 2, "replacement": "XX" }),
        );
        let finish = fence("done", json!({ "message": "edited" }));
        let llm = MockLlmClient::new(vec![modify.as_str(), finish.as_str()]);
        let calls = llm.call_counter();
        let requests = llm.request_log();
        let mut agent = Agent::new(Box::new(llm), registry_without_thinking(), config(5));

        let (outcome, events) = run_collect(&mut agent, "edit it").await;

        let RunOutcome::AwaitingApproval(request) = outcome else {
            panic!("expected approval, got {outcome:?}");
        };
        assert_eq!(request.after, "heXXllo");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(events.last(), Some(StepEvent::ApprovalRequest(_))));
        assert_eq!(agent.run("again", &mut |_| {}).await, Err(AgentError::ApprovalPending));

        let outcome = agent.resume(ApprovalDecision::Accept, &mut |_| {}).await.unwrap();

        assert_eq!(outcome, RunOutcome::Terminated(Termination::Done("edited".to_string())));
        assert!(requests.lock().unwrap()[1].messages[0].content.contains("heXXllo"));
        assert!(agent.pending_approval().is_none());
        let speakers: Vec<String> = agent.transcript().entries().iter().map(|e| e.speaker.to_string()).collect();
        assert_eq!(
            speakers,
            vec!["[User]", "[Assistant]", "[Tool modifier]", "[Approval]", "[Assistant]", "[Tool done]"]
        );
    }

    #[tokio::test]
    async fn test_resume_without_pending() {
        let llm = MockLlmClient::new(vec![]);
        let mut agent = Agent::new(Box::new(llm), registry_without_thinking(), config(5));
        let result = agent.resume(ApprovalDecision::Decline(None), &mut |_| {}).await;
        assert_eq!(result, Err(AgentError::NoPendingApproval));
    }

    #[tokio::test]
    async fn test_thinking_runs_before_query() {
        let llm = MockLlmClient::new(vec!["final"]);
        let mut agent = Agent::new(Box::new(llm), ToolRegistry::standard(), config(5));

        let (_, events) = run_collect(&mut agent, "ponder this").await;

        assert_eq!(events[0], StepEvent::Thinking("ponder this".to_string()));
    }

    #[tokio::test]
    async fn test_session_log_written() {
        let temp = tempdir().unwrap();
        let llm = MockLlmClient::new(vec!["bye"]);
        let mut agent = Agent::new(Box::new(llm), registry_without_thinking(), config(2))
            .with_session_log(Box::new(JsonlSessionLog::new(temp.path())));

        run_collect(&mut agent, "hi").await;

        let entries = crate::events::read_session_log(temp.path(), agent.session_id()).unwrap();
        let kinds: Vec<&str> = entries.iter().map(|e| e.event.as_str()).collect();
        assert_eq!(kinds, vec!["session_started", "assistant", "terminal"]);
    }

    #[tokio::test]
    async fn test_tool_usage_log_records_arguments() {
        let temp = tempdir().unwrap();
        let reply = fence("done", json!({ "message": "bye" }));
        let llm = MockLlmClient::new(vec![reply.as_str()]);
        let mut agent = Agent::new(Box::new(llm), registry_without_thinking(), config(2))
            .with_session_log(Box::new(JsonlSessionLog::new(temp.path())));

        run_collect(&mut agent, "hi").await;

        let entries = crate::events::read_session_log(temp.path(), agent.session_id()).unwrap();
        let usage = entries.iter().find(|e| e.event == "tool_usage").unwrap();
        assert_eq!(usage.data["step"], 1);
        assert_eq!(usage.data["tool"], "done");
        assert_eq!(usage.data["arguments"], json!({ "message": "bye" }));
    }

    #[tokio::test]
    async fn test_run_session_helper() {
        let llm = MockLlmClient::new(vec!["plain"]);
        let mut seen = 0;
        let (agent, outcome) = run_session("q", registry_without_thinking(), 1, None, Box::new(llm), |_| seen += 1).await;

        assert!(matches!(outcome, Ok(RunOutcome::Terminated(Termination::FinalAnswer(_)))));
        assert!(seen > 0);
        assert_eq!(agent.steps_remaining(), 0);
    }
}
