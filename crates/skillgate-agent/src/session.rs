// ABOUTME: AgentSession drives one conversation: session hooks, model calls, and tool dispatch through a middleware stack.
// ABOUTME: It loops model and tools until the model stops proposing tool calls or the recursion limit is hit.

use std::sync::Arc;

use crate::config::SessionLimits;
use crate::message::{Message, ModelRequest, ToolCallRequest};
use crate::middleware::{AgentMiddleware, MiddlewareStack};
use crate::runtime::{AgentError, ModelHandler, ToolHandler};
use crate::state::SessionState;

/// One agent conversation with its own state and middleware instances.
pub struct AgentSession {
    name: String,
    system_prompt: Option<String>,
    stack: MiddlewareStack,
    model: Arc<dyn ModelHandler>,
    tools: Arc<dyn ToolHandler>,
    limits: SessionLimits,
    state: SessionState,
    started: bool,
}

impl AgentSession {
    pub fn new(
        name: impl Into<String>,
        model: Arc<dyn ModelHandler>,
        tools: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: None,
            stack: MiddlewareStack::new(),
            model,
            tools,
            limits: SessionLimits::default(),
            state: SessionState::new(),
            started: false,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Add a middleware after the ones already registered.
    pub fn with_middleware(mut self, middleware: impl AgentMiddleware + 'static) -> Self {
        self.stack = self.stack.with(middleware);
        self
    }

    pub fn with_stack(mut self, stack: MiddlewareStack) -> Self {
        self.stack = stack;
        self
    }

    pub fn with_limits(mut self, limits: SessionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn stack(&self) -> &MiddlewareStack {
        &self.stack
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Run every middleware's session-start hook. Idempotent.
    pub async fn start(&mut self) {
        if self.started {
            return;
        }
        tracing::info!(agent = %self.name, session = %self.state.session_id, "session starting");
        self.stack.before_agent(&mut self.state).await;
        self.started = true;
    }

    /// One model call followed by dispatch of every tool call it proposes.
    /// Returns the assistant message as recorded.
    pub async fn step(&mut self) -> Result<Message, AgentError> {
        if !self.started {
            return Err(AgentError::NotStarted);
        }

        let request = ModelRequest::new(
            self.system_prompt.clone(),
            self.state.messages.clone(),
            self.state.clone(),
        );
        let response = self
            .stack
            .call_model(request, self.model.as_ref())
            .await?;

        let message = response
            .result
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::InvalidResponse("model returned no messages".to_string()))?;

        self.state.messages.push(message.clone());
        self.stack.after_model(&self.state).await;

        for call in &message.tool_calls {
            let request = ToolCallRequest {
                tool_call: call.clone(),
            };
            let reply = match self.stack.call_tool(request, self.tools.as_ref()).await {
                Ok(output) => Message::tool(output.tool_call_id, output.content),
                Err(e) => {
                    tracing::warn!(agent = %self.name, tool = %call.name, error = %e, "tool call failed");
                    Message::tool(call.id.clone(), format!("Error: {e}"))
                }
            };
            self.state.messages.push(reply);
        }

        Ok(message)
    }

    /// Add a user message and step until the model answers without tool
    /// calls. Returns that final assistant message.
    pub async fn run(&mut self, input: impl Into<String>) -> Result<Message, AgentError> {
        if !self.started {
            return Err(AgentError::NotStarted);
        }

        self.state.messages.push(Message::user(input));

        for _ in 0..self.limits.recursion_limit {
            let message = self.step().await?;
            if !message.has_tool_calls() {
                return Ok(message);
            }
        }

        tracing::warn!(agent = %self.name, limit = self.limits.recursion_limit, "recursion limit reached");
        Err(AgentError::RecursionLimit(self.limits.recursion_limit))
    }

    /// Run every middleware's session-end hook. The session must be
    /// started again before further steps.
    pub async fn finish(&mut self) {
        if !self.started {
            return;
        }
        self.stack.after_agent(&mut self.state).await;
        self.started = false;
        tracing::info!(agent = %self.name, messages = self.state.messages.len(), "session finished");
    }
}

impl std::fmt::Debug for AgentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSession")
            .field("name", &self.name)
            .field("stack", &self.stack)
            .field("limits", &self.limits)
            .field("started", &self.started)
            .field("session_id", &self.state.session_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatingConfig;
    use crate::gating::ToolGatingMiddleware;
    use crate::message::{Role, ToolOutput};
    use crate::testing::{RecordingToolHandler, ScriptedModel, tool_response};
    use async_trait::async_trait;

    struct FailingTools;

    #[async_trait]
    impl ToolHandler for FailingTools {
        async fn call(&self, request: ToolCallRequest) -> Result<ToolOutput, AgentError> {
            Err(AgentError::ToolError(format!("{} is unavailable", request.tool_call.name)))
        }
    }

    #[tokio::test]
    async fn step_before_start_is_rejected() {
        let mut session = AgentSession::new(
            "idle",
            Arc::new(ScriptedModel::text("hi")),
            Arc::new(RecordingToolHandler::new()),
        );

        assert!(matches!(session.step().await, Err(AgentError::NotStarted)));
        assert!(matches!(session.run("hello").await, Err(AgentError::NotStarted)));
    }

    #[tokio::test]
    async fn run_dispatches_tools_until_plain_answer() {
        let model = Arc::new(ScriptedModel::new(vec![
            tool_response("looking", &["read_file"]),
            tool_response("found it", &[]),
        ]));
        let tools = Arc::new(RecordingToolHandler::new());
        let mut session = AgentSession::new("worker", model.clone(), tools.clone())
            .with_system_prompt("Be helpful.");

        session.start().await;
        let answer = session.run("find the config").await.unwrap();
        session.finish().await;

        assert_eq!(answer.content, "found it");
        assert_eq!(tools.call_names(), vec!["read_file"]);
        assert_eq!(model.call_count(), 2);

        let roles: Vec<Role> = session.state().messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]);
        assert_eq!(model.requests()[1].messages.len(), 3);
        assert_eq!(model.requests()[0].system_prompt.as_deref(), Some("Be helpful."));
    }

    #[tokio::test]
    async fn gated_session_stops_after_terminal_tool() {
        let model = Arc::new(ScriptedModel::with_tool_sequence(&[
            &["read_file"],
            &["write_file"],
            &["write_file"],
            &["read_file"],
        ]));
        let tools = Arc::new(RecordingToolHandler::new());
        let mut session = AgentSession::new("extractor", model.clone(), tools.clone())
            .with_middleware(ToolGatingMiddleware::new("extractor", &GatingConfig::default()));

        session.start().await;
        let answer = session.run("extract").await.unwrap();

        assert_eq!(answer.content, "turn 2");
        assert!(answer.tool_calls.is_empty());
        assert_eq!(tools.call_names(), vec!["read_file", "write_file"]);
        assert_eq!(model.call_count(), 3);
    }

    #[tokio::test]
    async fn recursion_limit_is_enforced() {
        let model = Arc::new(ScriptedModel::with_tool_sequence(&[&["ls"], &["ls"], &["ls"], &["ls"]]));
        let mut session = AgentSession::new("looper", model.clone(), Arc::new(RecordingToolHandler::new()))
            .with_limits(SessionLimits { recursion_limit: 3 });

        session.start().await;
        let result = session.run("go").await;

        assert!(matches!(result, Err(AgentError::RecursionLimit(3))));
        assert_eq!(model.call_count(), 3);
    }

    #[tokio::test]
    async fn tool_errors_become_tool_messages() {
        let model = Arc::new(ScriptedModel::new(vec![tool_response("try", &["write_file"])]));
        let mut session = AgentSession::new("writer", model, Arc::new(FailingTools));

        session.start().await;
        let answer = session.run("save").await.unwrap();

        assert_eq!(answer.content, "Done.");
        let tool_message = &session.state().messages[2];
        assert_eq!(tool_message.role, Role::Tool);
        assert!(tool_message.content.contains("write_file is unavailable"));
    }

    #[tokio::test]
    async fn empty_model_response_is_invalid() {
        let model = Arc::new(ScriptedModel::new(vec![crate::message::ModelResponse::default()]));
        let mut session = AgentSession::new("empty", model, Arc::new(RecordingToolHandler::new()));

        session.start().await;
        assert!(matches!(session.run("hi").await, Err(AgentError::InvalidResponse(_))));
    }
}
