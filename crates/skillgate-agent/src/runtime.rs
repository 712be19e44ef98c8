// ABOUTME: Defines the ModelHandler and ToolHandler traits the host runtime implements.
// ABOUTME: Also defines AgentError, the error type flowing through model and tool calls.

use async_trait::async_trait;

use crate::message::{ModelRequest, ModelResponse, ToolCallRequest, ToolOutput};

/// Errors that can occur while driving a model or tool call.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Tool error: {0}")]
    ToolError(String),

    #[error("Recursion limit of {0} model calls reached")]
    RecursionLimit(usize),

    #[error("Session has not been started")]
    NotStarted,
}

/// Invokes the model. The host's LLM client implements this; inside a
/// middleware stack it is also implemented by the "rest of the chain".
#[async_trait]
pub trait ModelHandler: Send + Sync {
    async fn call(&self, request: ModelRequest) -> Result<ModelResponse, AgentError>;
}

/// Executes one tool call.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, request: ToolCallRequest) -> Result<ToolOutput, AgentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_error_display() {
        let errors = vec![
            AgentError::ProviderError("connection timeout".to_string()),
            AgentError::InvalidResponse("no messages".to_string()),
            AgentError::ToolError("write failed".to_string()),
            AgentError::RecursionLimit(25),
            AgentError::NotStarted,
        ];

        for err in &errors {
            assert!(!err.to_string().is_empty());
        }

        assert!(
            AgentError::ProviderError("test".to_string())
                .to_string()
                .contains("test")
        );
        assert!(AgentError::RecursionLimit(25).to_string().contains("25"));
    }
}
