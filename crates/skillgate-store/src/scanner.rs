// ABOUTME: Scans the user and project skill roots and merges them into one SkillCatalog.
// ABOUTME: Missing roots and broken skill directories are skipped; rejections are reported, never raised.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use skillgate_core::catalog::SkillCatalog;
use skillgate_core::skill::{SkillMetadata, SkillSource};

use crate::loader::load_skill;

/// A skill directory that was found but left out of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedSkill {
    pub dir: PathBuf,
    pub source: SkillSource,
    pub reason: String,
}

/// The result of scanning both tiers: the merged catalog plus every
/// directory that was skipped along the way.
#[derive(Debug, Clone, Default)]
pub struct CatalogScan {
    pub catalog: SkillCatalog,
    pub rejected: Vec<RejectedSkill>,
}

/// The two skill roots an agent discovers skills from. Scanning reads the
/// filesystem every time; callers cache the result per session.
#[derive(Debug, Clone)]
pub struct SkillStore {
    user_dir: PathBuf,
    project_dir: Option<PathBuf>,
}

impl SkillStore {
    pub fn new(user_dir: impl Into<PathBuf>, project_dir: Option<PathBuf>) -> Self {
        Self {
            user_dir: user_dir.into(),
            project_dir,
        }
    }

    pub fn user_dir(&self) -> &Path {
        &self.user_dir
    }

    pub fn project_dir(&self) -> Option<&Path> {
        self.project_dir.as_deref()
    }

    /// Scan both tiers. User records go in first; project records then
    /// replace same-named user records in place or append.
    pub fn scan(&self) -> CatalogScan {
        let mut rejected = Vec::new();

        let user = scan_tier(&self.user_dir, SkillSource::User, &mut rejected);
        let project = match &self.project_dir {
            Some(dir) => scan_tier(dir, SkillSource::Project, &mut rejected),
            None => Vec::new(),
        };

        let catalog = SkillCatalog::from_tiers(user, project);
        tracing::debug!(
            skills = catalog.len(),
            rejected = rejected.len(),
            user_dir = %self.user_dir.display(),
            "skill scan complete"
        );

        CatalogScan { catalog, rejected }
    }

    /// Scan both tiers and keep only the catalog.
    pub fn build(&self) -> SkillCatalog {
        self.scan().catalog
    }
}

/// Scan `user_dir` and optionally `project_dir` into a catalog with diagnostics.
pub fn scan_catalog(user_dir: &Path, project_dir: Option<&Path>) -> CatalogScan {
    SkillStore::new(user_dir, project_dir.map(Path::to_path_buf)).scan()
}

/// Scan `user_dir` and optionally `project_dir` into a catalog.
pub fn build_catalog(user_dir: &Path, project_dir: Option<&Path>) -> SkillCatalog {
    scan_catalog(user_dir, project_dir).catalog
}

/// Immediate subdirectories of `root`, sorted by file name. A root that does
/// not exist yields an empty list.
pub fn list_skill_dirs(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(dirs)
}

/// Load every skill under one tier root, pushing failures onto `rejected`.
fn scan_tier(
    root: &Path,
    source: SkillSource,
    rejected: &mut Vec<RejectedSkill>,
) -> Vec<SkillMetadata> {
    let dirs = match list_skill_dirs(root) {
        Ok(dirs) => dirs,
        Err(e) => {
            tracing::warn!(root = %root.display(), tier = %source, "failed to read skills root: {}", e);
            return Vec::new();
        }
    };

    let mut skills = Vec::with_capacity(dirs.len());
    for dir in dirs {
        match load_skill(&dir, root, source) {
            Ok(skill) => {
                tracing::debug!(skill = %skill.name, tier = %source, path = %skill.path.display(), "loaded skill");
                skills.push(skill);
            }
            Err(e) => {
                tracing::debug!(dir = %dir.display(), tier = %source, "skipping skill directory: {}", e);
                rejected.push(RejectedSkill {
                    dir,
                    source,
                    reason: e.to_string(),
                });
            }
        }
    }
    skills
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillgate_core::descriptor::DESCRIPTOR_FILE_NAME;
    use tempfile::TempDir;

    fn write_skill(root: &Path, dir_name: &str, name: &str, description: &str) {
        let dir = root.join(dir_name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(DESCRIPTOR_FILE_NAME),
            format!("---\nname: {name}\ndescription: {description}\n---\n\n# {name}\n"),
        )
        .unwrap();
    }

    #[test]
    fn missing_roots_yield_empty_catalog() {
        let tmp = TempDir::new().unwrap();
        let scan = scan_catalog(
            &tmp.path().join("nope"),
            Some(&tmp.path().join("also-nope")),
        );
        assert!(scan.catalog.is_empty());
        assert!(scan.rejected.is_empty());
    }

    #[test]
    fn no_project_dir_means_user_only() {
        let user = TempDir::new().unwrap();
        write_skill(user.path(), "a", "a", "A");

        let catalog = build_catalog(user.path(), None);
        assert_eq!(catalog.names(), vec!["a"]);
        assert_eq!(catalog.get("a").unwrap().source, SkillSource::User);
    }

    #[test]
    fn subdirectories_are_scanned_in_name_order() {
        let user = TempDir::new().unwrap();
        write_skill(user.path(), "zeta", "zeta", "Z");
        write_skill(user.path(), "alpha", "alpha", "A");
        write_skill(user.path(), "mid", "mid", "M");

        let catalog = build_catalog(user.path(), None);
        assert_eq!(catalog.names(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn files_at_root_are_ignored() {
        let user = TempDir::new().unwrap();
        write_skill(user.path(), "real", "real", "R");
        fs::write(user.path().join("README.md"), "not a skill").unwrap();

        let scan = scan_catalog(user.path(), None);
        assert_eq!(scan.catalog.names(), vec!["real"]);
        assert!(scan.rejected.is_empty());
    }

    #[test]
    fn project_overrides_user_and_appends_new() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write_skill(user.path(), "A", "A", "desc A");
        write_skill(project.path(), "A", "A", "desc A2");
        write_skill(project.path(), "B", "B", "desc B");

        let catalog = build_catalog(user.path(), Some(project.path()));
        let entries: Vec<_> = catalog.iter().collect();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "A");
        assert_eq!(entries[0].source, SkillSource::Project);
        assert_eq!(entries[0].description, "desc A2");
        assert!(entries[0].path.starts_with(project.path().canonicalize().unwrap()));
        assert_eq!(entries[1].name, "B");
        assert_eq!(entries[1].source, SkillSource::Project);
    }

    #[test]
    fn override_matches_on_declared_name_not_directory() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write_skill(user.path(), "user-folder", "shared", "from user");
        write_skill(project.path(), "project-folder", "shared", "from project");

        let catalog = build_catalog(user.path(), Some(project.path()));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("shared").unwrap().description, "from project");
    }

    #[test]
    fn broken_skills_are_reported_and_others_survive() {
        let user = TempDir::new().unwrap();
        write_skill(user.path(), "good", "good", "works");
        fs::create_dir_all(user.path().join("no-descriptor")).unwrap();
        let bad = user.path().join("bad-header");
        fs::create_dir_all(&bad).unwrap();
        fs::write(bad.join(DESCRIPTOR_FILE_NAME), "# no header\n").unwrap();

        let scan = scan_catalog(user.path(), None);
        assert_eq!(scan.catalog.names(), vec!["good"]);
        assert_eq!(scan.rejected.len(), 2);
        assert!(scan.rejected.iter().all(|r| r.source == SkillSource::User));
        assert!(scan.rejected.iter().any(|r| r.dir.ends_with("no-descriptor")));
        assert!(scan.rejected.iter().any(|r| r.dir.ends_with("bad-header")));
    }

    #[test]
    fn repeated_scans_are_identical() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        for name in ["c", "a", "b"] {
            write_skill(user.path(), name, name, "user");
        }
        write_skill(project.path(), "b", "b", "project");

        let store = SkillStore::new(user.path(), Some(project.path().to_path_buf()));
        let first = serde_json::to_string(&store.build()).unwrap();
        let second = serde_json::to_string(&store.build()).unwrap();
        assert_eq!(first, second);
    }
}
