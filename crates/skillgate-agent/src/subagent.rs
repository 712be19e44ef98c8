// ABOUTME: Sub-agent definitions and per-view prompt loading from a skill's directory.
// ABOUTME: Each definition builds its own gated session so gate state is never shared between sub-agents.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{GatingConfig, SessionLimits};
use crate::gating::ToolGatingMiddleware;
use crate::runtime::{ModelHandler, ToolHandler};
use crate::session::AgentSession;

/// A named sub-agent the host can delegate to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubAgentDefinition {
    pub name: String,
    pub description: String,
    pub system_prompt: String,
}

impl SubAgentDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            system_prompt: system_prompt.into(),
        }
    }

    /// A sub-agent whose prompt is read from `<skills_dir>/<skill>/<view>_prompt.md`.
    pub fn for_view(
        skills_dir: &Path,
        skill: &str,
        view: &str,
        description: impl Into<String>,
    ) -> Self {
        Self::new(
            format!("{view}-extractor"),
            description,
            load_view_prompt(skills_dir, skill, view),
        )
    }

    /// A fresh gating middleware for this sub-agent.
    pub fn gating_middleware(&self, gating: &GatingConfig) -> ToolGatingMiddleware {
        ToolGatingMiddleware::new(self.name.clone(), gating)
    }

    /// A session for this sub-agent with its own tool gate.
    pub fn gated_session(
        &self,
        model: Arc<dyn ModelHandler>,
        tools: Arc<dyn ToolHandler>,
        gating: &GatingConfig,
        limits: SessionLimits,
    ) -> AgentSession {
        AgentSession::new(self.name.clone(), model, tools)
            .with_system_prompt(self.system_prompt.clone())
            .with_middleware(self.gating_middleware(gating))
            .with_limits(limits)
    }
}

/// Read the prompt for one view of a skill, falling back to a one-line
/// prompt naming the view when the file cannot be read.
pub fn load_view_prompt(skills_dir: &Path, skill: &str, view: &str) -> String {
    let path = skills_dir.join(skill).join(format!("{view}_prompt.md"));
    match std::fs::read_to_string(&path) {
        Ok(prompt) => prompt,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to load view prompt, using default");
            format!("You are the {view} view information extractor.")
        }
    }
}
