// ABOUTME: Filesystem layer for skillgate, turning skill directories on disk into a SkillCatalog.
// ABOUTME: Provides per-directory descriptor loading and the two-tier catalog scan.

pub mod loader;
pub mod scanner;

pub use loader::{LoadError, MAX_DESCRIPTOR_BYTES, load_skill};
pub use scanner::{CatalogScan, RejectedSkill, SkillStore, build_catalog, list_skill_dirs, scan_catalog};
