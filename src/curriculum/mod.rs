//! Curriculum Module
//!
//! Provides:
//! - Topic definitions (prerequisites, required skills, difficulty, duration)
//! - A registered skill catalog derived from the curriculum
//! - Cycle-safe prerequisite resolution over the topic graph
//! - Loading curricula from TOML/JSON files or the built-in sample

pub mod catalog;
pub mod graph;
pub mod loader;

use serde::{Deserialize, Serialize};

use crate::types::Difficulty;

pub use catalog::{SkillCatalog, SkillId};
pub use graph::{CurriculumGraph, GraphIssue};
pub use loader::{load_curriculum, load_from_path, sample_curriculum, CurriculumFile};

/// A unit of study. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// Unique topic id
    pub id: String,
    /// Display name
    pub name: String,
    /// Topic ids that must be studied first, in order
    #[serde(default)]
    pub prerequisites: Vec<String>,
    /// Skills exercised by this topic
    #[serde(default)]
    pub required_skills: Vec<SkillId>,
    /// Difficulty 1-5
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Estimated study time in minutes
    pub estimated_minutes: u32,
    /// Learning objectives, in order
    #[serde(default)]
    pub learning_objectives: Vec<String>,
    /// Subject domain; defaults to the category of the first required skill
    #[serde(default)]
    pub domain: Option<String>,
    /// Short description used as the concept definition by the reasoner
    #[serde(default)]
    pub description: Option<String>,
}

impl Topic {
    pub fn new(id: &str, name: &str, difficulty: Difficulty, estimated_minutes: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            prerequisites: Vec::new(),
            required_skills: Vec::new(),
            difficulty,
            estimated_minutes,
            learning_objectives: Vec::new(),
            domain: None,
            description: None,
        }
    }

    pub fn with_prerequisites(mut self, prerequisites: Vec<String>) -> Self {
        self.prerequisites = prerequisites;
        self
    }

    pub fn with_skills(mut self, skills: Vec<SkillId>) -> Self {
        self.required_skills = skills;
        self
    }

    pub fn with_objectives(mut self, objectives: Vec<String>) -> Self {
        self.learning_objectives = objectives;
        self
    }

    pub fn with_domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Effective domain of the topic
    pub fn domain(&self) -> &str {
        self.domain.as_deref()
            .or_else(|| self.required_skills.first().map(|s| s.category()))
            .unwrap_or("general")
    }
}
