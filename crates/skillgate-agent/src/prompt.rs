// ABOUTME: Renders a SkillCatalog into the skills documentation block appended to system prompts.
// ABOUTME: Output depends only on the catalog and the configured location strings, so it is deterministic.

use skillgate_core::catalog::SkillCatalog;
use skillgate_core::skill::{SkillMetadata, SkillSource};
use skillgate_store::RejectedSkill;

use crate::config::SkillsConfig;

/// Fixed guidance that follows the skill list.
const USAGE_GUIDE: &str = "**How to Use Skills (Progressive Disclosure):**\n\n\
Only the name and description of each skill are listed above. Read the full instructions when a skill becomes relevant:\n\n\
1. **Recognize when a skill applies**: compare the user's task with each skill's description\n\
2. **Read the skill's full instructions**: open the SKILL.md path shown in the list with read_file\n\
3. **Follow the skill's instructions**: SKILL.md holds the workflow, conventions, and examples\n\
4. **Access supporting files**: skills may ship scripts, configs, or reference docs next to SKILL.md; use absolute paths\n\n\
**When to Use Skills:**\n\
- The user's request falls inside a skill's domain\n\
- The task needs specialized knowledge or a structured workflow\n\n\
**Skills are Self-Documenting:**\n\
- Each SKILL.md states what the skill does and how to use it\n\
- The list above gives the full path of every SKILL.md\n\n\
**Executing Skill Scripts:**\n\
Skills may contain scripts or other executables. Always invoke them by the absolute paths derived from the skill list.\n\n\
**Example Workflow:**\n\n\
User: \"Can you research the latest developments in quantum computing?\"\n\n\
1. Check the list above and find a \"web-research\" skill with its path\n\
2. Read that SKILL.md\n\
3. Follow its research workflow\n\
4. Run any helper scripts by absolute path\n\n\
When in doubt, check whether a skill exists for the task before starting from scratch.";

/// Renders the skills section for one configured pair of skill roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillsPrompt {
    user_display: String,
    project_display: Option<String>,
}

impl SkillsPrompt {
    pub fn new(user_display: impl Into<String>, project_display: Option<String>) -> Self {
        Self {
            user_display: user_display.into(),
            project_display,
        }
    }

    pub fn from_config(config: &SkillsConfig) -> Self {
        Self::new(config.user_display(), config.project_display())
    }

    /// One line per configured skill root.
    pub fn render_locations(&self) -> String {
        let mut lines = vec![format!("**User Skills**: `{}`", self.user_display)];
        if let Some(project) = &self.project_display {
            lines.push(format!(
                "**Project Skills**: `{project}` (overrides user skills)"
            ));
        }
        lines.join("\n")
    }

    /// The grouped skill list, or guidance on where to create skills when
    /// the catalog is empty.
    pub fn render_list(&self, catalog: &SkillCatalog, rejected: &[RejectedSkill]) -> String {
        let mut out = if catalog.is_empty() {
            self.render_empty()
        } else {
            render_groups(catalog)
        };

        if !rejected.is_empty() {
            out.push_str("\n\n**Skills skipped due to descriptor errors:**\n");
            let lines: Vec<String> = rejected
                .iter()
                .map(|r| format!("- `{}` ({}): {}", r.dir.display(), r.source, r.reason))
                .collect();
            out.push_str(&lines.join("\n"));
        }

        out
    }

    /// The complete documentation block.
    pub fn render(&self, catalog: &SkillCatalog, rejected: &[RejectedSkill]) -> String {
        skills_section(
            &self.render_locations(),
            &self.render_list(catalog, rejected),
        )
    }

    fn render_empty(&self) -> String {
        let mut locations = vec![format!("{}/", self.user_display)];
        if let Some(project) = &self.project_display {
            locations.push(format!("{project}/"));
        }
        format!(
            "(No skills available yet. You can create skills in {})",
            locations.join(" or ")
        )
    }
}

fn render_groups(catalog: &SkillCatalog) -> String {
    let mut lines = Vec::new();

    let user: Vec<&SkillMetadata> = catalog.by_source(SkillSource::User).collect();
    if !user.is_empty() {
        lines.push("**User Skills:**".to_string());
        push_entries(&mut lines, &user);
        lines.push(String::new());
    }

    let project: Vec<&SkillMetadata> = catalog.by_source(SkillSource::Project).collect();
    if !project.is_empty() {
        lines.push("**Project Skills:**".to_string());
        push_entries(&mut lines, &project);
    }

    lines.join("\n")
}

fn push_entries(lines: &mut Vec<String>, skills: &[&SkillMetadata]) {
    for skill in skills {
        lines.push(format!("- **{}**: {}", skill.name, skill.description));
        lines.push(format!(
            "  → Read `{}` for full instructions",
            skill.path.display()
        ));
    }
}

fn skills_section(locations: &str, list: &str) -> String {
    format!(
        "## Skills System\n\n\
         You have access to a skills library that provides specialized capabilities and domain knowledge.\n\n\
         {locations}\n\n\
         **Available Skills:**\n\n\
         {list}\n\n\
         {USAGE_GUIDE}\n"
    )
}

/// Append `section` to an existing system prompt, separated by a blank line.
pub fn append_section(existing: Option<&str>, section: &str) -> String {
    match existing {
        Some(prompt) if !prompt.is_empty() => format!("{prompt}\n\n{section}"),
        _ => section.to_string(),
    }
}
