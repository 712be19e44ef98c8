// ABOUTME: Configuration for the skills and gating middlewares and the session driver.
// ABOUTME: Reads SKILLGATE_* environment variables with defaults, plus builder methods for code.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Tool name whose first use closes the gate, unless configured otherwise.
pub const DEFAULT_TERMINAL_TOOL: &str = "write_file";

/// Maximum model calls per `AgentSession::run`, unless configured otherwise.
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid {expected}: {value:?}")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Read an env var and return `Some(value)` only if it is non-empty after trimming.
fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() { None } else { Some(trimmed) }
    })
}

fn env_flag(key: &str) -> bool {
    non_empty_env(key)
        .map(|v| v == "true" || v == "1" || v == "yes")
        .unwrap_or(false)
}

fn home_dir() -> Option<PathBuf> {
    non_empty_env("HOME").map(PathBuf::from)
}

/// Replace a leading `~` with the home directory.
pub fn expand_tilde(path: impl Into<PathBuf>) -> PathBuf {
    let path = path.into();
    let Some(home) = home_dir() else {
        return path;
    };
    match path.strip_prefix("~") {
        Ok(rest) if path.starts_with("~") => home.join(rest),
        _ => path,
    }
}

/// Render a path for display, abbreviating the home directory to `~`.
pub fn contract_home(path: &Path) -> String {
    if let Some(home) = home_dir() {
        if let Ok(rest) = path.strip_prefix(&home) {
            if rest.as_os_str().is_empty() {
                return "~".to_string();
            }
            return format!("~/{}", rest.display());
        }
    }
    path.display().to_string()
}

/// Where a skills-enabled agent looks for skills and how it reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillsConfig {
    pub user_dir: PathBuf,
    pub project_dir: Option<PathBuf>,
    pub assistant_id: String,
    /// Name used in log lines.
    pub agent_name: String,
    /// Overrides the user location shown in the prompt.
    pub user_display: Option<String>,
    /// Surface descriptor errors instead of silently skipping them.
    pub strict_descriptors: bool,
}

impl SkillsConfig {
    /// A configuration with the given user skills root and no project root.
    pub fn new(user_dir: impl Into<PathBuf>) -> Self {
        Self {
            user_dir: expand_tilde(user_dir),
            project_dir: None,
            assistant_id: "agent".to_string(),
            agent_name: "agent".to_string(),
            user_display: None,
            strict_descriptors: false,
        }
    }

    pub fn with_project_dir(mut self, project_dir: impl Into<PathBuf>) -> Self {
        self.project_dir = Some(expand_tilde(project_dir));
        self
    }

    pub fn with_assistant_id(mut self, assistant_id: impl Into<String>) -> Self {
        self.assistant_id = assistant_id.into();
        self
    }

    pub fn with_agent_name(mut self, agent_name: impl Into<String>) -> Self {
        self.agent_name = agent_name.into();
        self
    }

    pub fn with_user_display(mut self, display: impl Into<String>) -> Self {
        self.user_display = Some(display.into());
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_descriptors = strict;
        self
    }

    /// Default per-assistant user skills root: `$HOME/.deepagents/<id>/skills`.
    pub fn default_user_dir(assistant_id: &str) -> PathBuf {
        home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".deepagents")
            .join(assistant_id)
            .join("skills")
    }

    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - SKILLGATE_ASSISTANT_ID: assistant identifier (default: agent)
    /// - SKILLGATE_USER_SKILLS_DIR: user skills root (default: ~/.deepagents/<assistant_id>/skills)
    /// - SKILLGATE_PROJECT_SKILLS_DIR: project skills root (optional)
    /// - SKILLGATE_STRICT_DESCRIPTORS: report broken descriptors (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        let assistant_id =
            non_empty_env("SKILLGATE_ASSISTANT_ID").unwrap_or_else(|| "agent".to_string());

        let user_dir = non_empty_env("SKILLGATE_USER_SKILLS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::default_user_dir(&assistant_id));

        let mut config = Self::new(user_dir)
            .with_agent_name(assistant_id.clone())
            .with_assistant_id(assistant_id)
            .strict(env_flag("SKILLGATE_STRICT_DESCRIPTORS"));

        if let Some(project_dir) = non_empty_env("SKILLGATE_PROJECT_SKILLS_DIR") {
            config = config.with_project_dir(project_dir);
        }

        Ok(config)
    }

    /// The user skills location as shown to the model.
    pub fn user_display(&self) -> String {
        self.user_display
            .clone()
            .unwrap_or_else(|| contract_home(&self.user_dir))
    }

    /// The project skills location as shown to the model.
    pub fn project_display(&self) -> Option<String> {
        self.project_dir.as_ref().map(|p| p.display().to_string())
    }
}

/// Settings for a tool-gated sub-agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatingConfig {
    pub terminal_tool: String,
}

impl GatingConfig {
    pub fn new(terminal_tool: impl Into<String>) -> Self {
        Self {
            terminal_tool: terminal_tool.into(),
        }
    }

    /// Reads SKILLGATE_TERMINAL_TOOL (default: write_file).
    pub fn from_env() -> Self {
        Self::new(
            non_empty_env("SKILLGATE_TERMINAL_TOOL")
                .unwrap_or_else(|| DEFAULT_TERMINAL_TOOL.to_string()),
        )
    }
}

impl Default for GatingConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TERMINAL_TOOL)
    }
}

/// Bounds on a session's model/tool loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub recursion_limit: usize,
}

impl SessionLimits {
    /// Reads SKILLGATE_RECURSION_LIMIT (default: 25, must be a positive integer).
    pub fn from_env() -> Result<Self, ConfigError> {
        let Some(raw) = non_empty_env("SKILLGATE_RECURSION_LIMIT") else {
            return Ok(Self::default());
        };
        match raw.parse::<usize>() {
            Ok(limit) if limit > 0 => Ok(Self {
                recursion_limit: limit,
            }),
            _ => Err(ConfigError::InvalidValue {
                var: "SKILLGATE_RECURSION_LIMIT",
                value: raw,
                expected: "positive integer",
            }),
        }
    }
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    /// Serialize all tests that read/write env vars to prevent race conditions.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// All env var names that tests may read or mutate.
    const ENV_VARS: &[&str] = &[
        "HOME",
        "SKILLGATE_ASSISTANT_ID",
        "SKILLGATE_USER_SKILLS_DIR",
        "SKILLGATE_PROJECT_SKILLS_DIR",
        "SKILLGATE_STRICT_DESCRIPTORS",
        "SKILLGATE_TERMINAL_TOOL",
        "SKILLGATE_RECURSION_LIMIT",
    ];

    /// Save the current values of all env vars we touch, returning a snapshot.
    fn save_env() -> Vec<(&'static str, Option<String>)> {
        ENV_VARS.iter().map(|&k| (k, env::var(k).ok())).collect()
    }

    /// Restore env vars to a previously captured snapshot.
    fn restore_env(snapshot: &[(&str, Option<String>)]) {
        for &(key, ref val) in snapshot {
            match val {
                Some(v) => unsafe { env::set_var(key, v) },
                None => unsafe { env::remove_var(key) },
            }
        }
    }

    /// Clear every SKILLGATE_* variable and pin HOME.
    fn reset_env(home: &str) {
        for key in ENV_VARS {
            unsafe { env::remove_var(key) };
        }
        unsafe { env::set_var("HOME", home) };
    }

    #[test]
    fn skills_config_loads_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = save_env();
        reset_env("/home/tester");

        let config = SkillsConfig::from_env();
        restore_env(&saved);

        let config = config.unwrap();
        assert_eq!(config.assistant_id, "agent");
        assert_eq!(
            config.user_dir,
            PathBuf::from("/home/tester/.deepagents/agent/skills")
        );
        assert!(config.project_dir.is_none());
        assert!(!config.strict_descriptors);
    }

    #[test]
    fn skills_config_reads_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = save_env();
        reset_env("/home/tester");
        unsafe {
            env::set_var("SKILLGATE_ASSISTANT_ID", "extractor");
            env::set_var("SKILLGATE_PROJECT_SKILLS_DIR", "~/repo/skills");
            env::set_var("SKILLGATE_STRICT_DESCRIPTORS", "yes");
        }

        let config = SkillsConfig::from_env();
        restore_env(&saved);

        let config = config.unwrap();
        assert_eq!(config.assistant_id, "extractor");
        assert_eq!(config.agent_name, "extractor");
        assert_eq!(
            config.user_dir,
            PathBuf::from("/home/tester/.deepagents/extractor/skills")
        );
        assert_eq!(
            config.project_dir,
            Some(PathBuf::from("/home/tester/repo/skills"))
        );
        assert!(config.strict_descriptors);
    }

    #[test]
    fn user_display_contracts_home() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = save_env();
        reset_env("/home/tester");

        let inside = SkillsConfig::new("/home/tester/.deepagents/agent/skills").user_display();
        let outside = SkillsConfig::new("/srv/skills").user_display();
        let overridden = SkillsConfig::new("/srv/skills")
            .with_user_display("shared skills")
            .user_display();
        restore_env(&saved);

        assert_eq!(inside, "~/.deepagents/agent/skills");
        assert_eq!(outside, "/srv/skills");
        assert_eq!(overridden, "shared skills");
    }

    #[test]
    fn gating_config_defaults_to_write_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = save_env();
        reset_env("/home/tester");

        let default = GatingConfig::from_env();
        unsafe { env::set_var("SKILLGATE_TERMINAL_TOOL", "save_report") };
        let custom = GatingConfig::from_env();
        restore_env(&saved);

        assert_eq!(default.terminal_tool, "write_file");
        assert_eq!(custom.terminal_tool, "save_report");
    }

    #[test]
    fn recursion_limit_parses_and_rejects_garbage() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = save_env();
        reset_env("/home/tester");

        let default = SessionLimits::from_env();
        unsafe { env::set_var("SKILLGATE_RECURSION_LIMIT", "7") };
        let seven = SessionLimits::from_env();
        unsafe { env::set_var("SKILLGATE_RECURSION_LIMIT", "0") };
        let zero = SessionLimits::from_env();
        unsafe { env::set_var("SKILLGATE_RECURSION_LIMIT", "lots") };
        let garbage = SessionLimits::from_env();
        restore_env(&saved);

        assert_eq!(default.unwrap().recursion_limit, 25);
        assert_eq!(seven.unwrap().recursion_limit, 7);
        assert!(zero.is_err());
        let err = garbage.unwrap_err();
        assert!(
            err.to_string().contains("SKILLGATE_RECURSION_LIMIT"),
            "error should name the variable: {}",
            err
        );
    }
}
