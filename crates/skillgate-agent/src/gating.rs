// ABOUTME: Tool-call gating: once a sub-agent proposes its terminal tool, later tool proposals are dropped.
// ABOUTME: ToolGate is the per-instance state machine; ToolGatingMiddleware applies it to every model response.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::config::GatingConfig;
use crate::message::{ModelRequest, ModelResponse, ProposesToolCalls, ToolCallRequest, ToolOutput};
use crate::middleware::AgentMiddleware;
use crate::runtime::{AgentError, ModelHandler, ToolHandler};
use crate::state::SessionState;

/// Whether tool proposals are still allowed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Open,
    Closed,
}

/// What the gate did with one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Gate open and the response did not trigger it.
    PassedThrough,
    /// The response led with the terminal tool; it passes and the gate closes.
    Triggered,
    /// Gate already closed; this many proposed calls were removed.
    Suppressed { dropped: usize },
    /// The response has no tool-call list to inspect; left untouched.
    Unrecognised,
}

/// The gating state machine. `Open` moves to `Closed` exactly once, when
/// the first proposed call of a response names the terminal tool. The
/// triggering response itself is not modified.
#[derive(Debug)]
pub struct ToolGate {
    terminal_tool: String,
    closed: AtomicBool,
}

impl ToolGate {
    pub fn new(terminal_tool: impl Into<String>) -> Self {
        Self {
            terminal_tool: terminal_tool.into(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn terminal_tool(&self) -> &str {
        &self.terminal_tool
    }

    pub fn state(&self) -> GateState {
        if self.closed.load(Ordering::SeqCst) {
            GateState::Closed
        } else {
            GateState::Open
        }
    }

    /// Apply the gate to one model response.
    pub fn apply<R: ProposesToolCalls + ?Sized>(&self, response: &mut R) -> GateOutcome {
        let Some(calls) = response.proposed_tool_calls_mut() else {
            return GateOutcome::Unrecognised;
        };

        if self.closed.load(Ordering::SeqCst) {
            let dropped = calls.len();
            calls.clear();
            return GateOutcome::Suppressed { dropped };
        }

        match calls.first() {
            Some(first) if first.name == self.terminal_tool => {
                self.closed.store(true, Ordering::SeqCst);
                GateOutcome::Triggered
            }
            _ => GateOutcome::PassedThrough,
        }
    }
}

/// Middleware that runs every model response through its own `ToolGate`.
/// Each gated sub-agent gets a fresh instance; gates are never shared.
#[derive(Debug)]
pub struct ToolGatingMiddleware {
    agent_name: String,
    gate: ToolGate,
    calls: AtomicUsize,
}

impl ToolGatingMiddleware {
    pub fn new(agent_name: impl Into<String>, config: &GatingConfig) -> Self {
        Self {
            agent_name: agent_name.into(),
            gate: ToolGate::new(config.terminal_tool.clone()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn gate(&self) -> &ToolGate {
        &self.gate
    }

    /// Model calls seen so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentMiddleware for ToolGatingMiddleware {
    fn name(&self) -> &str {
        &self.agent_name
    }

    async fn before_agent(&self, _state: &mut SessionState) {
        tracing::info!(agent = %self.agent_name, terminal_tool = %self.gate.terminal_tool, "gated agent starting");
    }

    async fn wrap_model_call(
        &self,
        request: ModelRequest,
        next: &dyn ModelHandler,
    ) -> Result<ModelResponse, AgentError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(agent = %self.agent_name, call, gate = ?self.gate.state(), "model call");
        tracing::debug!(agent = %self.agent_name, messages = request.messages.len(), "model request");

        let mut response = next.call(request).await?;

        match self.gate.apply(&mut response) {
            GateOutcome::Triggered => {
                tracing::info!(agent = %self.agent_name, tool = %self.gate.terminal_tool, "terminal tool proposed, closing gate");
            }
            GateOutcome::Suppressed { dropped } if dropped > 0 => {
                tracing::info!(agent = %self.agent_name, dropped, "gate closed, dropped proposed tool calls");
            }
            GateOutcome::Unrecognised => {
                tracing::debug!(agent = %self.agent_name, "response carries no tool-call list, passing through");
            }
            _ => {}
        }

        Ok(response)
    }

    async fn after_model(&self, state: &SessionState) {
        log_last_tool_calls(&self.agent_name, state);
    }

    async fn wrap_tool_call(
        &self,
        request: ToolCallRequest,
        next: &dyn ToolHandler,
    ) -> Result<ToolOutput, AgentError> {
        log_tool_call(&self.agent_name, request, next).await
    }

    async fn after_agent(&self, _state: &mut SessionState) {
        tracing::info!(agent = %self.agent_name, calls = self.call_count(), gate = ?self.gate.state(), "gated agent finished");
    }
}

/// Log the tool calls proposed by the most recent message in `state`.
pub(crate) fn log_last_tool_calls(agent: &str, state: &SessionState) {
    tracing::info!(agent, messages = state.messages.len(), "after model");
    if let Some(last) = state.last_message().filter(|m| m.has_tool_calls()) {
        let calls: Vec<String> = last
            .tool_calls
            .iter()
            .map(|c| format!("{}({})", c.name, c.args))
            .collect();
        tracing::info!(agent, tool_calls = ?calls, "model proposed tool calls");
    }
}

/// Dispatch one tool call through `next`, logging before and after.
pub(crate) async fn log_tool_call(
    agent: &str,
    request: ToolCallRequest,
    next: &dyn ToolHandler,
) -> Result<ToolOutput, AgentError> {
    let tool = request.tool_call.name.clone();
    tracing::info!(agent, tool = %tool, "tool call");
    tracing::debug!(agent, tool = %tool, args = %request.tool_call.args, "tool arguments");

    let result = next.call(request).await;

    match &result {
        Ok(output) => {
            tracing::info!(agent, tool = %tool, "tool finished");
            tracing::debug!(agent, tool = %tool, result = %output.content, "tool result");
        }
        Err(e) => tracing::warn!(agent, tool = %tool, error = %e, "tool failed"),
    }
    result
}
