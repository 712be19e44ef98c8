// ABOUTME: Conversation, request, and response types exchanged between the session and the model.
// ABOUTME: Also defines the narrow capability traits the middlewares depend on instead of full types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

use crate::state::SessionState;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

/// A tool invocation proposed by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

impl ToolCall {
    /// Create a call with a fresh id.
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            id: format!("call_{}", Ulid::new()),
            name: name.into(),
            args,
        }
    }
}

/// One entry in the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::assistant(content)
        }
    }

    /// A tool result answering the call with `tool_call_id`.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Names of the proposed tool calls, in order.
    pub fn tool_call_names(&self) -> Vec<&str> {
        self.tool_calls.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Everything handed to the model for one invocation.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub system_prompt: Option<String>,
    pub messages: Vec<Message>,
    /// Read-only view of the session state at the time of the call.
    pub state: SessionState,
}

impl ModelRequest {
    pub fn new(system_prompt: Option<String>, messages: Vec<Message>, state: SessionState) -> Self {
        Self {
            system_prompt,
            messages,
            state,
        }
    }

    /// Return a copy of this request with a different system prompt.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

/// What the model returned. The first message is the assistant reply the
/// session acts on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub result: Vec<Message>,
}

impl ModelResponse {
    pub fn new(result: Vec<Message>) -> Self {
        Self { result }
    }

    /// A response carrying a single assistant message.
    pub fn from_message(message: Message) -> Self {
        Self {
            result: vec![message],
        }
    }

    /// Plain-text assistant reply with no tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self::from_message(Message::assistant(content))
    }

    pub fn first_message(&self) -> Option<&Message> {
        self.result.first()
    }
}

/// A single tool call routed through the tool middleware stack.
#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    pub tool_call: ToolCall,
}

/// The result of running one tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub content: String,
}

/// Something that carries a list of tool calls proposed by the model.
///
/// Returns `None` when the value does not have the expected shape (for
/// example a response with no messages); callers leave such values alone.
pub trait ProposesToolCalls {
    fn proposed_tool_calls(&self) -> Option<&[ToolCall]>;
    fn proposed_tool_calls_mut(&mut self) -> Option<&mut Vec<ToolCall>>;
}

impl ProposesToolCalls for Message {
    fn proposed_tool_calls(&self) -> Option<&[ToolCall]> {
        Some(&self.tool_calls)
    }

    fn proposed_tool_calls_mut(&mut self) -> Option<&mut Vec<ToolCall>> {
        Some(&mut self.tool_calls)
    }
}

impl ProposesToolCalls for ModelResponse {
    fn proposed_tool_calls(&self) -> Option<&[ToolCall]> {
        self.result.first().map(|m| m.tool_calls.as_slice())
    }

    fn proposed_tool_calls_mut(&mut self) -> Option<&mut Vec<ToolCall>> {
        self.result.first_mut().map(|m| &mut m.tool_calls)
    }
}

/// A request whose system prompt can be read and replaced, and which
/// exposes the session state.
pub trait PromptTarget {
    fn system_prompt(&self) -> Option<&str>;
    fn set_system_prompt(&mut self, prompt: String);
    fn session_state(&self) -> &SessionState;
}

impl PromptTarget for ModelRequest {
    fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    fn set_system_prompt(&mut self, prompt: String) {
        self.system_prompt = Some(prompt);
    }

    fn session_state(&self) -> &SessionState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_exposes_first_message_tool_calls() {
        let mut response = ModelResponse::new(vec![
            Message::assistant_with_tools("reading", vec![ToolCall::new("read_file", json!({"path": "a"}))]),
            Message::assistant_with_tools("ignored", vec![ToolCall::new("write_file", json!({}))]),
        ]);

        let names: Vec<_> = response
            .proposed_tool_calls()
            .unwrap()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(names, vec!["read_file"]);

        response.proposed_tool_calls_mut().unwrap().clear();
        assert!(response.result[0].tool_calls.is_empty());
        assert_eq!(response.result[1].tool_calls.len(), 1);
    }

    #[test]
    fn empty_response_has_no_tool_call_shape() {
        let mut response = ModelResponse::default();
        assert!(response.proposed_tool_calls().is_none());
        assert!(response.proposed_tool_calls_mut().is_none());
    }

    #[test]
    fn tool_call_ids_are_unique() {
        let a = ToolCall::new("x", Value::Null);
        let b = ToolCall::new("x", Value::Null);
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("call_"));
    }

    #[test]
    fn message_serializes_without_empty_fields() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json, json!({"role": "user", "content": "hi"}));

        let tool = serde_json::to_value(Message::tool("call_1", "done")).unwrap();
        assert_eq!(tool["tool_call_id"], "call_1");
    }

    #[test]
    fn request_prompt_target_round_trip() {
        let mut request = ModelRequest::new(None, Vec::new(), SessionState::new());
        assert!(PromptTarget::system_prompt(&request).is_none());
        request.set_system_prompt("hello".to_string());
        assert_eq!(PromptTarget::system_prompt(&request), Some("hello"));
    }
}
