// ABOUTME: Core library for skillgate, containing the skill data model and descriptor parsing.
// ABOUTME: This crate is pure: it never touches the filesystem, so every type here is easy to test.

pub mod catalog;
pub mod descriptor;
pub mod skill;

pub use catalog::SkillCatalog;
pub use descriptor::{DESCRIPTOR_FILE_NAME, DescriptorError, SkillDescriptor, parse_descriptor};
pub use skill::{SkillMetadata, SkillSource};
