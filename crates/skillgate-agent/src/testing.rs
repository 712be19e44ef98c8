// ABOUTME: Test utilities for skillgate-agent: a scripted model and a recording tool handler.
// ABOUTME: Used in tests to drive sessions and middleware without real LLM or tool calls.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use crate::message::{Message, ModelRequest, ModelResponse, ToolCall, ToolCallRequest, ToolOutput};
use crate::runtime::{AgentError, ModelHandler, ToolHandler};

/// Lock a mutex, recovering the data if a panicking test poisoned it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A model that replays a fixed list of responses in order and records
/// every request it receives.
///
/// Once the script runs out it answers "Done." with no tool calls, so a
/// session loop always terminates.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<ModelResponse>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<ModelResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A model that answers once with the given text, then "Done."
    pub fn text(content: &str) -> Self {
        Self::new(vec![ModelResponse::text(content)])
    }

    /// Script one response per entry, each proposing tool calls with the
    /// given names. An empty entry yields a plain-text reply.
    pub fn with_tool_sequence(sequence: &[&[&str]]) -> Self {
        let responses = sequence
            .iter()
            .enumerate()
            .map(|(i, names)| tool_response(&format!("turn {i}"), names))
            .collect();
        Self::new(responses)
    }

    /// Every request seen so far, in order.
    pub fn requests(&self) -> Vec<ModelRequest> {
        lock(&self.requests).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl ModelHandler for ScriptedModel {
    async fn call(&self, request: ModelRequest) -> Result<ModelResponse, AgentError> {
        lock(&self.requests).push(request);
        let next = lock(&self.responses).pop_front();
        Ok(next.unwrap_or_else(|| ModelResponse::text("Done.")))
    }
}

/// Build a response whose assistant message proposes the named tools.
pub fn tool_response(content: &str, names: &[&str]) -> ModelResponse {
    let calls = names
        .iter()
        .map(|name| ToolCall::new(*name, Value::Object(Default::default())))
        .collect();
    ModelResponse::from_message(Message::assistant_with_tools(content, calls))
}

/// A tool handler that records calls and answers "ok: <tool name>".
#[derive(Debug, Default)]
pub struct RecordingToolHandler {
    calls: Mutex<Vec<ToolCall>>,
}

impl RecordingToolHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        lock(&self.calls).clone()
    }

    pub fn call_names(&self) -> Vec<String> {
        lock(&self.calls).iter().map(|c| c.name.clone()).collect()
    }
}

#[async_trait]
impl ToolHandler for RecordingToolHandler {
    async fn call(&self, request: ToolCallRequest) -> Result<ToolOutput, AgentError> {
        let output = ToolOutput {
            tool_call_id: request.tool_call.id.clone(),
            content: format!("ok: {}", request.tool_call.name),
        };
        lock(&self.calls).push(request.tool_call);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ProposesToolCalls;
    use crate::state::SessionState;

    fn request() -> ModelRequest {
        ModelRequest::new(None, Vec::new(), SessionState::new())
    }

    #[tokio::test]
    async fn scripted_model_replays_then_finishes() {
        let model = ScriptedModel::with_tool_sequence(&[&[], &["read_file"]]);

        let first = model.call(request()).await.unwrap();
        assert!(first.proposed_tool_calls().unwrap().is_empty());

        let second = model.call(request()).await.unwrap();
        assert_eq!(second.first_message().unwrap().tool_call_names(), vec!["read_file"]);

        let third = model.call(request()).await.unwrap();
        assert_eq!(third.first_message().unwrap().content, "Done.");
        assert_eq!(model.call_count(), 3);
    }

    #[tokio::test]
    async fn recording_tool_handler_echoes_call_id() {
        let tools = RecordingToolHandler::new();
        let call = ToolCall::new("write_file", Value::Null);
        let id = call.id.clone();

        let output = tools.call(ToolCallRequest { tool_call: call }).await.unwrap();
        assert_eq!(output.tool_call_id, id);
        assert_eq!(output.content, "ok: write_file");
        assert_eq!(tools.call_names(), vec!["write_file"]);
    }
}
