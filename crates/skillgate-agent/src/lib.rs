// ABOUTME: Agent-side middleware for skillgate, sitting between a host agent loop and its model.
// ABOUTME: Injects the skills catalog into system prompts and gates tool calls after a terminal action.

pub mod config;
pub mod gating;
pub mod message;
pub mod middleware;
pub mod prompt;
pub mod runtime;
pub mod session;
pub mod skills;
pub mod state;
pub mod subagent;
pub mod testing;

pub use config::{ConfigError, GatingConfig, SessionLimits, SkillsConfig};
pub use gating::{GateOutcome, GateState, ToolGate, ToolGatingMiddleware};
pub use message::{
    Message, ModelRequest, ModelResponse, PromptTarget, ProposesToolCalls, Role, ToolCall,
    ToolCallRequest, ToolOutput,
};
pub use middleware::{AgentMiddleware, MiddlewareStack};
pub use prompt::SkillsPrompt;
pub use runtime::{AgentError, ModelHandler, ToolHandler};
pub use session::AgentSession;
pub use skills::SkillsMiddleware;
pub use state::{SKILLS_METADATA_KEY, SKILLS_REJECTED_KEY, SessionState};
pub use subagent::{SubAgentDefinition, load_view_prompt};
