//! Transient knowledge base built per reasoning request
//!
//! Content arrives as a tagged [`ContentDescriptor`] (curriculum topic or
//! freeform concept), is validated on ingestion, and is flattened into
//! [`Concept`]s plus typed [`Relationship`] edges. The learner's current
//! level for every concept is snapshotted from the [`UserModel`] at build time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::curriculum::{SkillId, Topic};
use crate::error::TutorError;
use crate::mastery::UserModel;
use crate::types::{mean, Difficulty};

use super::rules::InferenceResult;

/// Strength of edges declared explicitly by the content
const PREREQUISITE_EDGE_STRENGTH: f64 = 1.0;
const RELATED_EDGE_STRENGTH: f64 = 0.7;

/// A concept that does not come from the curriculum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreeformConcept {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub domain: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub related: Vec<String>,
    #[serde(default)]
    pub skills: Vec<SkillId>,
}

/// Content handed to the reasoner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentDescriptor {
    Topic(Topic),
    Concept(FreeformConcept),
}

impl ContentDescriptor {
    /// Reject content the knowledge base cannot represent
    pub fn validate(&self) -> Result<(), TutorError> {
        let (id, name) = match self {
            ContentDescriptor::Topic(t) => (&t.id, &t.name),
            ContentDescriptor::Concept(c) => (&c.id, &c.name),
        };
        if id.trim().is_empty() || name.trim().is_empty() {
            return Err(TutorError::Curriculum(format!(
                "content entry must have an id and a name (got id '{}')",
                id
            )));
        }
        Ok(())
    }

    fn into_concept(self) -> Concept {
        match self {
            ContentDescriptor::Topic(topic) => Concept {
                domain: topic.domain().to_string(),
                definition: topic.description.clone()
                    .unwrap_or_else(|| topic.learning_objectives.join("; ")),
                id: topic.id,
                name: topic.name,
                difficulty: topic.difficulty,
                prerequisites: topic.prerequisites,
                related: Vec::new(),
                skills: topic.required_skills,
            },
            ContentDescriptor::Concept(c) => Concept {
                id: c.id,
                name: c.name,
                definition: c.definition,
                difficulty: c.difficulty,
                domain: c.domain,
                prerequisites: c.prerequisites,
                related: c.related,
                skills: c.skills,
            },
        }
    }
}

/// A node in the knowledge base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub name: String,
    pub definition: String,
    pub difficulty: Difficulty,
    pub domain: String,
    pub prerequisites: Vec<String>,
    pub related: Vec<String>,
    pub skills: Vec<SkillId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Prerequisite,
    Related,
    DomainRelated,
    DifficultyRelated,
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationshipKind::Prerequisite => write!(f, "prerequisite"),
            RelationshipKind::Related => write!(f, "related"),
            RelationshipKind::DomainRelated => write!(f, "domain_related"),
            RelationshipKind::DifficultyRelated => write!(f, "difficulty_related"),
        }
    }
}

/// Typed, weighted edge between two concepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    pub kind: RelationshipKind,
    pub strength: f64,
    /// Added by an inference rule rather than declared by the content
    pub inferred: bool,
}

/// Concepts, edges and inference results for one reasoning request
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    concepts: Vec<Concept>,
    index: HashMap<String, usize>,
    relationships: Vec<Relationship>,
    learner_levels: HashMap<String, f64>,
    pub inferences: Vec<InferenceResult>,
}

impl KnowledgeBase {
    /// Build from content and a learner snapshot. Invalid or duplicate
    /// entries are skipped with a warning.
    pub fn build(contents: Vec<ContentDescriptor>, model: &UserModel) -> Self {
        let mut kb = Self::default();

        for content in contents {
            if let Err(e) = content.validate() {
                warn!("Skipping content: {}", e);
                continue;
            }
            let concept = content.into_concept();
            if kb.index.contains_key(&concept.id) {
                warn!("Skipping duplicate concept '{}'", concept.id);
                continue;
            }
            kb.index.insert(concept.id.clone(), kb.concepts.len());
            kb.concepts.push(concept);
        }

        for concept in &kb.concepts {
            kb.learner_levels.insert(concept.id.clone(), Self::learner_level_for(concept, model));
        }

        let mut declared = Vec::new();
        for concept in &kb.concepts {
            for prereq in &concept.prerequisites {
                if kb.index.contains_key(prereq) {
                    declared.push(Relationship {
                        source: prereq.clone(),
                        target: concept.id.clone(),
                        kind: RelationshipKind::Prerequisite,
                        strength: PREREQUISITE_EDGE_STRENGTH,
                        inferred: false,
                    });
                }
            }
            for related in &concept.related {
                if kb.index.contains_key(related) {
                    declared.push(Relationship {
                        source: concept.id.clone(),
                        target: related.clone(),
                        kind: RelationshipKind::Related,
                        strength: RELATED_EDGE_STRENGTH,
                        inferred: false,
                    });
                }
            }
        }
        for edge in declared {
            kb.add_relationship(edge);
        }

        kb
    }

    /// Mean mastery of the concept's skills, falling back to the learner's
    /// skills in the same category, then to overall ability
    fn learner_level_for(concept: &Concept, model: &UserModel) -> f64 {
        if let Some(level) = model.average_mastery(concept.skills.iter()) {
            return level;
        }

        let domain_levels: Vec<f64> = model.skills.iter()
            .filter(|(id, _)| id.category() == concept.domain)
            .map(|(_, s)| s.current)
            .collect();

        mean(&domain_levels).unwrap_or(model.aggregates.overall_ability)
    }

    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    pub fn concept(&self, id: &str) -> Option<&Concept> {
        self.index.get(id).map(|&i| &self.concepts[i])
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Learner mastery for a concept; concepts outside the base read as 0.0
    pub fn learner_level(&self, concept_id: &str) -> f64 {
        self.learner_levels.get(concept_id).copied().unwrap_or(0.0)
    }

    /// Whether any edge joins the two concepts, in either direction
    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        self.relationships.iter().any(|r| {
            (r.source == a && r.target == b) || (r.source == b && r.target == a)
        })
    }

    /// Add an edge unless an identical one (same endpoints and kind) exists
    pub fn add_relationship(&mut self, edge: Relationship) -> bool {
        let duplicate = self.relationships.iter().any(|r| {
            r.kind == edge.kind && r.source == edge.source && r.target == edge.target
        });
        if duplicate {
            return false;
        }
        self.relationships.push(edge);
        true
    }

    /// Edges of one kind
    pub fn relationships_of(&self, kind: RelationshipKind) -> Vec<&Relationship> {
        self.relationships.iter().filter(|r| r.kind == kind).collect()
    }

    /// Concepts joined to `id` by any edge
    pub fn neighbours(&self, id: &str) -> Vec<&str> {
        self.relationships.iter()
            .filter_map(|r| {
                if r.source == id {
                    Some(r.target.as_str())
                } else if r.target == id {
                    Some(r.source.as_str())
                } else {
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use crate::curriculum::SkillCatalog;

    fn concept(id: &str, domain: &str, prereqs: &[&str]) -> ContentDescriptor {
        ContentDescriptor::Concept(FreeformConcept {
            id: id.to_string(),
            name: id.to_string(),
            definition: String::new(),
            difficulty: Difficulty::default(),
            domain: domain.to_string(),
            prerequisites: prereqs.iter().map(|s| s.to_string()).collect(),
            related: Vec::new(),
            skills: Vec::new(),
        })
    }

    fn model() -> UserModel {
        let catalog = SkillCatalog::from_skills(vec![SkillId::parse("biology.cells").unwrap()]);
        UserModel::new("u", &catalog, &TrackerConfig::default())
    }

    #[test]
    fn test_build_adds_declared_prerequisite_edges() {
        let kb = KnowledgeBase::build(
            vec![concept("cells", "biology", &[]), concept("dna", "biology", &["cells", "ghost"])],
            &model(),
        );
        assert_eq!(kb.len(), 2);
        assert_eq!(kb.relationships().len(), 1);
        assert!(kb.has_edge("dna", "cells"));
        assert_eq!(kb.neighbours("cells"), vec!["dna"]);
    }

    #[test]
    fn test_invalid_and_duplicate_content_skipped() {
        let kb = KnowledgeBase::build(
            vec![concept("", "biology", &[]), concept("a", "x", &[]), concept("a", "y", &[])],
            &model(),
        );
        assert_eq!(kb.len(), 1);
        assert_eq!(kb.concept("a").unwrap().domain, "x");
    }

    #[test]
    fn test_learner_level_falls_back_to_domain() {
        let kb = KnowledgeBase::build(vec![concept("cells", "biology", &[])], &model());
        assert!((kb.learner_level("cells") - 0.5).abs() < 1e-12);
        assert_eq!(kb.learner_level("unknown"), 0.0);
    }

    #[test]
    fn test_descriptor_is_tagged() {
        let json = serde_json::json!({
            "kind": "concept",
            "id": "osmosis",
            "name": "Osmosis",
            "domain": "biology"
        });
        let parsed: ContentDescriptor = serde_json::from_value(json).unwrap();
        assert!(matches!(parsed, ContentDescriptor::Concept(_)));
    }
}
