// ABOUTME: SessionState holds the per-session conversation and a keyed value map for middleware data.
// ABOUTME: The skills catalog lives under a reserved key, written once at session start and read every call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use skillgate_core::catalog::SkillCatalog;
use skillgate_store::RejectedSkill;
use ulid::Ulid;

use crate::message::Message;

/// Key under which the session's skill catalog is stored.
pub const SKILLS_METADATA_KEY: &str = "skills_metadata";

/// Key under which skipped skill directories are stored in strict mode.
pub const SKILLS_REJECTED_KEY: &str = "skills_rejected";

/// Mutable state scoped to one agent session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: Ulid,
    pub messages: Vec<Message>,
    #[serde(default)]
    values: BTreeMap<String, Value>,
}

impl SessionState {
    /// Create empty state with a fresh session id.
    pub fn new() -> Self {
        Self {
            session_id: Ulid::new(),
            messages: Vec::new(),
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// The catalog stored at session start. A missing or undecodable entry
    /// reads as an empty catalog.
    pub fn skills_catalog(&self) -> SkillCatalog {
        self.decode_or_default(SKILLS_METADATA_KEY)
    }

    pub fn set_skills_catalog(&mut self, catalog: &SkillCatalog) {
        let value = serde_json::to_value(catalog).unwrap_or(Value::Null);
        self.insert(SKILLS_METADATA_KEY, value);
    }

    /// Skill directories skipped at session start, if any were recorded.
    pub fn rejected_skills(&self) -> Vec<RejectedSkill> {
        self.decode_or_default(SKILLS_REJECTED_KEY)
    }

    pub fn set_rejected_skills(&mut self, rejected: &[RejectedSkill]) {
        let value = serde_json::to_value(rejected).unwrap_or(Value::Null);
        self.insert(SKILLS_REJECTED_KEY, value);
    }

    /// The most recent message, if any.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    fn decode_or_default<T>(&self, key: &str) -> T
    where
        T: Default + for<'de> Deserialize<'de>,
    {
        let Some(value) = self.values.get(key) else {
            return T::default();
        };
        match T::deserialize(value) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!(key, error = %e, "session state value could not be decoded, using default");
                T::default()
            }
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
