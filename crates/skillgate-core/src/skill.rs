// ABOUTME: Defines SkillMetadata, the listing record for one discovered skill.
// ABOUTME: Also defines SkillSource, the precedence tier (user or project) a skill was found in.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The precedence tier a skill was loaded from. Project skills override
/// user skills that declare the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillSource {
    User,
    Project,
}

impl SkillSource {
    /// Return the lowercase label for this tier.
    pub fn label(&self) -> &'static str {
        match self {
            SkillSource::User => "user",
            SkillSource::Project => "project",
        }
    }
}

impl std::fmt::Display for SkillSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Name, description, and location of a skill. This is everything the model
/// sees up front; the full instructions stay in the descriptor file at `path`
/// until the model decides to read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillMetadata {
    pub name: String,
    pub description: String,
    /// Absolute path to the descriptor file itself, not its directory.
    pub path: PathBuf,
    pub source: SkillSource,
}

impl SkillMetadata {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        path: impl Into<PathBuf>,
        source: SkillSource,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            path: path.into(),
            source,
        }
    }

    /// Directory that holds the descriptor and any supporting files.
    pub fn skill_dir(&self) -> Option<&Path> {
        self.path.parent()
    }
}
