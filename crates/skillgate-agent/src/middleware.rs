// ABOUTME: The AgentMiddleware trait with session, model-call, and tool-call hooks.
// ABOUTME: MiddlewareStack composes middlewares around a model or tool handler, first registered outermost.

use std::sync::Arc;

use async_trait::async_trait;

use crate::message::{ModelRequest, ModelResponse, ToolCallRequest, ToolOutput};
use crate::runtime::{AgentError, ModelHandler, ToolHandler};
use crate::state::SessionState;

/// Hooks a middleware can implement. Every hook has a pass-through default,
/// so implementors override only what they need.
///
/// `before_agent` runs once per session before any model call.
/// `wrap_model_call` and `wrap_tool_call` wrap every invocation and must
/// call `next` to continue the chain. `after_model` sees the state after
/// each assistant reply is recorded; `after_agent` runs when the session
/// finishes.
#[async_trait]
pub trait AgentMiddleware: Send + Sync {
    /// Middleware name for logging.
    fn name(&self) -> &str;

    async fn before_agent(&self, _state: &mut SessionState) {}

    async fn wrap_model_call(
        &self,
        request: ModelRequest,
        next: &dyn ModelHandler,
    ) -> Result<ModelResponse, AgentError> {
        next.call(request).await
    }

    async fn after_model(&self, _state: &SessionState) {}

    async fn wrap_tool_call(
        &self,
        request: ToolCallRequest,
        next: &dyn ToolHandler,
    ) -> Result<ToolOutput, AgentError> {
        next.call(request).await
    }

    async fn after_agent(&self, _state: &mut SessionState) {}
}

/// An ordered list of middlewares. The first one added sees the request
/// first and the response last.
#[derive(Clone, Default)]
pub struct MiddlewareStack {
    layers: Vec<Arc<dyn AgentMiddleware>>,
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style push.
    pub fn with(mut self, middleware: impl AgentMiddleware + 'static) -> Self {
        self.push(Arc::new(middleware));
        self
    }

    pub fn push(&mut self, middleware: Arc<dyn AgentMiddleware>) {
        self.layers.push(middleware);
    }

    pub fn layers(&self) -> &[Arc<dyn AgentMiddleware>] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub async fn before_agent(&self, state: &mut SessionState) {
        for layer in &self.layers {
            layer.before_agent(state).await;
        }
    }

    /// Run `request` through every layer and finally `handler`.
    pub async fn call_model(
        &self,
        request: ModelRequest,
        handler: &dyn ModelHandler,
    ) -> Result<ModelResponse, AgentError> {
        ModelChain {
            layers: &self.layers,
            handler,
        }
        .call(request)
        .await
    }

    pub async fn after_model(&self, state: &SessionState) {
        for layer in &self.layers {
            layer.after_model(state).await;
        }
    }

    /// Run one tool call through every layer and finally `handler`.
    pub async fn call_tool(
        &self,
        request: ToolCallRequest,
        handler: &dyn ToolHandler,
    ) -> Result<ToolOutput, AgentError> {
        ToolChain {
            layers: &self.layers,
            handler,
        }
        .call(request)
        .await
    }

    pub async fn after_agent(&self, state: &mut SessionState) {
        for layer in &self.layers {
            layer.after_agent(state).await;
        }
    }
}

impl std::fmt::Debug for MiddlewareStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.layers.iter().map(|l| l.name()))
            .finish()
    }
}

/// The remainder of a model-call chain, handed to each layer as `next`.
struct ModelChain<'a> {
    layers: &'a [Arc<dyn AgentMiddleware>],
    handler: &'a dyn ModelHandler,
}

#[async_trait]
impl ModelHandler for ModelChain<'_> {
    async fn call(&self, request: ModelRequest) -> Result<ModelResponse, AgentError> {
        match self.layers.split_first() {
            Some((layer, rest)) => {
                let next = ModelChain {
                    layers: rest,
                    handler: self.handler,
                };
                layer.wrap_model_call(request, &next).await
            }
            None => self.handler.call(request).await,
        }
    }
}

struct ToolChain<'a> {
    layers: &'a [Arc<dyn AgentMiddleware>],
    handler: &'a dyn ToolHandler,
}

#[async_trait]
impl ToolHandler for ToolChain<'_> {
    async fn call(&self, request: ToolCallRequest) -> Result<ToolOutput, AgentError> {
        match self.layers.split_first() {
            Some((layer, rest)) => {
                let next = ToolChain {
                    layers: rest,
                    handler: self.handler,
                };
                layer.wrap_tool_call(request, &next).await
            }
            None => self.handler.call(request).await,
        }
    }
}
