// ABOUTME: SkillCatalog is the ordered, name-unique set of skills shown to an agent.
// ABOUTME: Merging a later tier replaces same-named entries in place and appends new ones.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::skill::{SkillMetadata, SkillSource};

/// An insertion-ordered collection of skills keyed by declared name.
///
/// Inserting a skill whose name already exists replaces the old record
/// entirely but keeps its position, so a project skill overriding a user
/// skill shows up where the user skill used to be. Serializes as a plain
/// list of records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<SkillMetadata>", into = "Vec<SkillMetadata>")]
pub struct SkillCatalog {
    entries: IndexMap<String, SkillMetadata>,
}

impl SkillCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge user-tier records first, then project-tier records on top.
    pub fn from_tiers(
        user: impl IntoIterator<Item = SkillMetadata>,
        project: impl IntoIterator<Item = SkillMetadata>,
    ) -> Self {
        let mut catalog = Self::new();
        catalog.merge(user);
        catalog.merge(project);
        catalog
    }

    /// Insert a single record. Returns the record it replaced, if any.
    pub fn insert(&mut self, skill: SkillMetadata) -> Option<SkillMetadata> {
        self.entries.insert(skill.name.clone(), skill)
    }

    /// Insert every record in order; later records win on name collisions.
    pub fn merge(&mut self, skills: impl IntoIterator<Item = SkillMetadata>) {
        for skill in skills {
            self.insert(skill);
        }
    }

    pub fn get(&self, name: &str) -> Option<&SkillMetadata> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &SkillMetadata> {
        self.entries.values()
    }

    /// Iterate over the entries from one tier, preserving catalog order.
    pub fn by_source(&self, source: SkillSource) -> impl Iterator<Item = &SkillMetadata> {
        self.entries.values().filter(move |s| s.source == source)
    }

    /// Declared names in catalog order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn into_vec(self) -> Vec<SkillMetadata> {
        self.entries.into_values().collect()
    }
}

impl From<Vec<SkillMetadata>> for SkillCatalog {
    fn from(skills: Vec<SkillMetadata>) -> Self {
        let mut catalog = Self::new();
        catalog.merge(skills);
        catalog
    }
}

impl From<SkillCatalog> for Vec<SkillMetadata> {
    fn from(catalog: SkillCatalog) -> Self {
        catalog.into_vec()
    }
}

impl<'a> IntoIterator for &'a SkillCatalog {
    type Item = &'a SkillMetadata;
    type IntoIter = indexmap::map::Values<'a, String, SkillMetadata>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}
