//! Skill catalog - the registered set of skill ids
//!
//! Skill ids take the form `category.skill` (e.g. `biology.genetics`).
//! The catalog is derived from the curriculum's required skills and is the
//! single source of truth for which skills a learner can have state for.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;

use crate::error::TutorError;

/// Validated `category.skill` identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SkillId(String);

impl SkillId {
    /// Parse and validate a skill id
    pub fn parse(raw: &str) -> Result<Self, TutorError> {
        let trimmed = raw.trim();
        let mut parts = trimmed.splitn(2, '.');
        let category = parts.next().unwrap_or_default();
        let skill = parts.next().unwrap_or_default();

        let valid_part = |s: &str| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        };

        if valid_part(category) && valid_part(skill) && !category.contains('.') {
            Ok(Self(trimmed.to_lowercase()))
        } else {
            Err(TutorError::MalformedSkillId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `category` half of the id
    pub fn category(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }
}

impl Borrow<str> for SkillId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SkillId {
    type Error = TutorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SkillId> for String {
    fn from(value: SkillId) -> Self {
        value.0
    }
}

impl std::fmt::Display for SkillId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registered skills, grouped by category
#[derive(Debug, Clone, Default)]
pub struct SkillCatalog {
    skills: BTreeSet<SkillId>,
}

impl SkillCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_skills<I: IntoIterator<Item = SkillId>>(skills: I) -> Self {
        Self {
            skills: skills.into_iter().collect(),
        }
    }

    pub fn register(&mut self, skill: SkillId) -> bool {
        self.skills.insert(skill)
    }

    pub fn contains(&self, skill_id: &str) -> bool {
        self.skills.contains(skill_id)
    }

    /// Resolve a raw id against the catalog, rejecting unknown or malformed ids
    pub fn resolve(&self, raw: &str) -> Result<SkillId, TutorError> {
        let id = SkillId::parse(raw)?;
        if self.skills.contains(&id) {
            Ok(id)
        } else {
            Err(TutorError::UnknownSkill(raw.to_string()))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillId> {
        self.skills.iter()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
