// ABOUTME: SkillsMiddleware scans skill roots once per session and injects the catalog into every model call.
// ABOUTME: The catalog is cached in session state; each call renders it and appends it to the system prompt.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use skillgate_store::{CatalogScan, SkillStore};

use crate::config::SkillsConfig;
use crate::gating::{log_last_tool_calls, log_tool_call};
use crate::message::{ModelRequest, ModelResponse, PromptTarget, ToolCallRequest, ToolOutput};
use crate::middleware::AgentMiddleware;
use crate::prompt::{SkillsPrompt, append_section};
use crate::runtime::{AgentError, ModelHandler, ToolHandler};
use crate::state::SessionState;

/// Progressive-disclosure skills middleware. One instance per agent; each
/// instance carries its own directory configuration.
#[derive(Debug)]
pub struct SkillsMiddleware {
    config: SkillsConfig,
    prompt: SkillsPrompt,
    store: SkillStore,
    calls: AtomicUsize,
}

impl SkillsMiddleware {
    pub fn new(config: SkillsConfig) -> Self {
        let prompt = SkillsPrompt::from_config(&config);
        let store = SkillStore::new(config.user_dir.clone(), config.project_dir.clone());
        Self {
            config,
            prompt,
            store,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &SkillsConfig {
        &self.config
    }

    /// Model calls seen so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Scan both skill roots off the async runtime. A scan that does not
    /// complete yields an empty catalog, never a partial one.
    pub async fn scan(&self) -> CatalogScan {
        let store = self.store.clone();
        match tokio::task::spawn_blocking(move || store.scan()).await {
            Ok(scan) => scan,
            Err(e) => {
                tracing::warn!(agent = %self.config.agent_name, error = %e, "skill scan did not complete, continuing without skills");
                CatalogScan::default()
            }
        }
    }

    /// Render the documentation block for whatever catalog `state` holds.
    pub fn render_section(&self, state: &SessionState) -> String {
        self.prompt
            .render(&state.skills_catalog(), &state.rejected_skills())
    }

    /// Append the skills block to the request's existing system prompt.
    pub fn inject<T: PromptTarget + ?Sized>(&self, target: &mut T) {
        let section = self.render_section(target.session_state());
        let prompt = append_section(target.system_prompt(), &section);
        target.set_system_prompt(prompt);
    }
}

#[async_trait]
impl AgentMiddleware for SkillsMiddleware {
    fn name(&self) -> &str {
        &self.config.agent_name
    }

    async fn before_agent(&self, state: &mut SessionState) {
        let agent = &self.config.agent_name;
        tracing::info!(agent = %agent, session = %state.session_id, "loading skills");

        let scan = self.scan().await;
        tracing::info!(agent = %agent, skills = scan.catalog.len(), "skill scan complete");
        if !scan.catalog.is_empty() {
            tracing::debug!(agent = %agent, skills = ?scan.catalog.names(), "skills found");
        }

        for rejected in &scan.rejected {
            if self.config.strict_descriptors {
                tracing::warn!(agent = %agent, dir = %rejected.dir.display(), tier = %rejected.source, reason = %rejected.reason, "skill skipped");
            } else {
                tracing::debug!(agent = %agent, dir = %rejected.dir.display(), reason = %rejected.reason, "skill skipped");
            }
        }

        state.set_skills_catalog(&scan.catalog);
        if self.config.strict_descriptors {
            state.set_rejected_skills(&scan.rejected);
        }
    }

    async fn wrap_model_call(
        &self,
        mut request: ModelRequest,
        next: &dyn ModelHandler,
    ) -> Result<ModelResponse, AgentError> {
        let agent = &self.config.agent_name;
        tracing::info!(agent = %agent, "injecting skills into system prompt");
        tracing::debug!(agent = %agent, locations = %self.prompt.render_locations(), "skill locations");

        self.inject(&mut request);

        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(agent = %agent, call, "model call");
        tracing::debug!(agent = %agent, messages = request.messages.len(), "model request");

        let response = next.call(request).await;
        match &response {
            Ok(r) => {
                tracing::info!(agent = %agent, "model response received");
                tracing::debug!(agent = %agent, response = ?r, "model response");
            }
            Err(e) => tracing::warn!(agent = %agent, error = %e, "model call failed"),
        }
        response
    }

    async fn after_model(&self, state: &SessionState) {
        log_last_tool_calls(&self.config.agent_name, state);
    }

    async fn wrap_tool_call(
        &self,
        request: ToolCallRequest,
        next: &dyn ToolHandler,
    ) -> Result<ToolOutput, AgentError> {
        log_tool_call(&self.config.agent_name, request, next).await
    }

    async fn after_agent(&self, _state: &mut SessionState) {
        tracing::info!(agent = %self.config.agent_name, calls = self.call_count(), "skills agent finished");
    }
}
