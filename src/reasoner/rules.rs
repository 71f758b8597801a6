//! Forward-chaining inference rules
//!
//! Each rule is a (condition, action) pair evaluated against every concept
//! in the knowledge base. Actions return [`Inference`]s; the reasoner folds
//! inferred relationships back into the base before the next rule runs.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::knowledge_base::{Concept, KnowledgeBase, Relationship, RelationshipKind};
use crate::types::Difficulty;

/// Mastery at which a prerequisite counts as satisfied
pub const PREREQUISITE_SATISFIED: f64 = 0.7;

/// A derived fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inference {
    /// Full prerequisite chain of a concept, nearest first
    PrerequisiteChain { concept_id: String, chain: Vec<String> },
    /// Concept difficulty is far from the learner's level
    DifficultyAdjustment {
        concept_id: String,
        difficulty: Difficulty,
        learner_level: f64,
        recommended: Difficulty,
    },
    /// Edge added by inference
    InferredRelationship(Relationship),
    /// Study order that front-loads satisfied prerequisites and alternates difficulty
    OptimizedPath { sequence: Vec<String> },
}

impl Inference {
    /// Whether this inference is about the given concept
    pub fn concerns(&self, concept_id: &str) -> bool {
        match self {
            Inference::PrerequisiteChain { concept_id: id, chain } => {
                id == concept_id || chain.iter().any(|c| c == concept_id)
            }
            Inference::DifficultyAdjustment { concept_id: id, .. } => id == concept_id,
            Inference::InferredRelationship(r) => r.source == concept_id || r.target == concept_id,
            Inference::OptimizedPath { sequence } => sequence.iter().any(|c| c == concept_id),
        }
    }

    /// Short machine-readable evidence tag
    pub fn tag(&self) -> String {
        match self {
            Inference::PrerequisiteChain { concept_id, .. } => format!("prerequisite_chain:{}", concept_id),
            Inference::DifficultyAdjustment { concept_id, recommended, .. } => {
                format!("difficulty_adjustment:{}:{}", concept_id, recommended)
            }
            Inference::InferredRelationship(r) => format!("{}:{}-{}", r.kind, r.source, r.target),
            Inference::OptimizedPath { sequence } => format!("optimized_path:{}", sequence.len()),
        }
    }
}

/// An inference together with the rule that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub rule: String,
    pub confidence: f64,
    pub inference: Inference,
}

pub trait InferenceRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fixed confidence attached to everything this rule derives
    fn confidence(&self) -> f64;

    fn condition(&self, kb: &KnowledgeBase, concept: &Concept) -> bool;

    fn action(&self, kb: &KnowledgeBase, concept: &Concept) -> Vec<Inference>;

    /// Evaluate against every concept
    fn evaluate(&self, kb: &KnowledgeBase) -> Vec<Inference> {
        kb.concepts().iter()
            .filter(|c| self.condition(kb, c))
            .flat_map(|c| self.action(kb, c))
            .collect()
    }
}

/// Rule 1: expand the full prerequisite chain of concepts that have one
pub struct PrerequisiteInference;

impl PrerequisiteInference {
    /// Worklist expansion with a local visited set; never revisits a concept
    pub fn chain(kb: &KnowledgeBase, concept: &Concept) -> Vec<String> {
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(concept.id.as_str());
        let mut chain = Vec::new();
        let mut stack: Vec<&str> = concept.prerequisites.iter().rev().map(String::as_str).collect();

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            chain.push(current.to_string());
            if let Some(next) = kb.concept(current) {
                stack.extend(next.prerequisites.iter().rev().map(String::as_str));
            }
        }

        chain
    }
}

impl InferenceRule for PrerequisiteInference {
    fn name(&self) -> &'static str {
        "prerequisite_inference"
    }

    fn confidence(&self) -> f64 {
        0.9
    }

    fn condition(&self, _kb: &KnowledgeBase, concept: &Concept) -> bool {
        !concept.prerequisites.is_empty()
    }

    fn action(&self, kb: &KnowledgeBase, concept: &Concept) -> Vec<Inference> {
        vec![Inference::PrerequisiteChain {
            concept_id: concept.id.clone(),
            chain: Self::chain(kb, concept),
        }]
    }
}

/// Rule 2: recommend a difficulty closer to the learner's level
pub struct DifficultyProgression {
    /// Gap (in difficulty levels) that triggers a recommendation
    pub gap: f64,
}

impl DifficultyProgression {
    /// floor(level * 5) + 1, clamped to 1..=5
    pub fn recommended_for(learner_level: f64) -> Difficulty {
        Difficulty::saturating((learner_level * 5.0).floor() as i64 + 1)
    }
}

impl InferenceRule for DifficultyProgression {
    fn name(&self) -> &'static str {
        "difficulty_progression"
    }

    fn confidence(&self) -> f64 {
        0.8
    }

    fn condition(&self, kb: &KnowledgeBase, concept: &Concept) -> bool {
        (concept.difficulty.as_f64() - kb.learner_level(&concept.id) * 5.0).abs() > self.gap
    }

    fn action(&self, kb: &KnowledgeBase, concept: &Concept) -> Vec<Inference> {
        let learner_level = kb.learner_level(&concept.id);
        vec![Inference::DifficultyAdjustment {
            concept_id: concept.id.clone(),
            difficulty: concept.difficulty,
            learner_level,
            recommended: Self::recommended_for(learner_level),
        }]
    }
}

/// Rule 3: link concepts of the same domain that have no edge yet
pub struct ConceptRelationships {
    pub weight: f64,
}

impl ConceptRelationships {
    /// Concepts after `concept` (in base order) sharing its domain with no edge
    fn unlinked_peers<'a>(&self, kb: &'a KnowledgeBase, concept: &Concept) -> Vec<&'a Concept> {
        kb.concepts().iter()
            .skip_while(|c| c.id != concept.id)
            .skip(1)
            .filter(|c| c.domain == concept.domain && !kb.has_edge(&concept.id, &c.id))
            .collect()
    }
}

impl InferenceRule for ConceptRelationships {
    fn name(&self) -> &'static str {
        "concept_relationships"
    }

    fn confidence(&self) -> f64 {
        0.7
    }

    fn condition(&self, kb: &KnowledgeBase, concept: &Concept) -> bool {
        !self.unlinked_peers(kb, concept).is_empty()
    }

    fn action(&self, kb: &KnowledgeBase, concept: &Concept) -> Vec<Inference> {
        self.unlinked_peers(kb, concept)
            .into_iter()
            .map(|peer| {
                Inference::InferredRelationship(Relationship {
                    source: concept.id.clone(),
                    target: peer.id.clone(),
                    kind: RelationshipKind::DomainRelated,
                    strength: self.weight,
                    inferred: true,
                })
            })
            .collect()
    }
}

/// Rule 4: order concepts by unsatisfied prerequisites, then interleave
/// difficulty buckets so hard concepts are not front-loaded
pub struct PathOptimization;

impl PathOptimization {
    pub const MIN_CONCEPTS: usize = 3;

    fn unsatisfied(kb: &KnowledgeBase, concept: &Concept) -> usize {
        concept.prerequisites.iter()
            .filter(|p| kb.learner_level(p) < PREREQUISITE_SATISFIED)
            .count()
    }

    /// Round-robin over difficulty buckets 1..=5, each bucket in input order
    pub fn interleave(ordered: Vec<&Concept>) -> Vec<String> {
        let mut buckets: Vec<Vec<&Concept>> = vec![Vec::new(); Difficulty::MAX as usize];
        for concept in ordered {
            buckets[(concept.difficulty.level() - 1) as usize].push(concept);
        }

        let rounds = buckets.iter().map(Vec::len).max().unwrap_or(0);
        let mut sequence = Vec::new();
        for round in 0..rounds {
            for bucket in &buckets {
                if let Some(concept) = bucket.get(round) {
                    sequence.push(concept.id.clone());
                }
            }
        }
        sequence
    }
}

impl InferenceRule for PathOptimization {
    fn name(&self) -> &'static str {
        "path_optimization"
    }

    fn confidence(&self) -> f64 {
        0.75
    }

    fn condition(&self, kb: &KnowledgeBase, _concept: &Concept) -> bool {
        kb.len() >= Self::MIN_CONCEPTS
    }

    fn action(&self, kb: &KnowledgeBase, _concept: &Concept) -> Vec<Inference> {
        let mut ordered: Vec<&Concept> = kb.concepts().iter().collect();
        // stable: ties keep base order
        ordered.sort_by_key(|c| Self::unsatisfied(kb, c));
        vec![Inference::OptimizedPath {
            sequence: Self::interleave(ordered),
        }]
    }

    /// Path optimization looks at the whole base, so it fires once
    fn evaluate(&self, kb: &KnowledgeBase) -> Vec<Inference> {
        match kb.concepts().first() {
            Some(first) if self.condition(kb, first) => self.action(kb, first),
            _ => Vec::new(),
        }
    }
}

/// The four standard rules in evaluation order
pub fn default_rules(gap: f64, domain_weight: f64) -> Vec<Box<dyn InferenceRule>> {
    vec![
        Box::new(PrerequisiteInference),
        Box::new(DifficultyProgression { gap }),
        Box::new(ConceptRelationships { weight: domain_weight }),
        Box::new(PathOptimization),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use crate::curriculum::SkillCatalog;
    use crate::mastery::UserModel;
    use crate::reasoner::knowledge_base::{ContentDescriptor, FreeformConcept};

    fn concept(id: &str, level: u8, prereqs: &[&str]) -> ContentDescriptor {
        ContentDescriptor::Concept(FreeformConcept {
            id: id.to_string(),
            name: id.to_string(),
            definition: String::new(),
            difficulty: Difficulty::new(level).unwrap(),
            domain: "general".to_string(),
            prerequisites: prereqs.iter().map(|s| s.to_string()).collect(),
            related: Vec::new(),
            skills: Vec::new(),
        })
    }

    fn base(contents: Vec<ContentDescriptor>) -> KnowledgeBase {
        let model = UserModel::new("u", &SkillCatalog::new(), &TrackerConfig::default());
        KnowledgeBase::build(contents, &model)
    }

    #[test]
    fn test_prerequisite_chain_survives_cycle() {
        let kb = base(vec![concept("a", 3, &["b"]), concept("b", 3, &["a"])]);

        let chains: Vec<(String, Vec<String>)> = PrerequisiteInference.evaluate(&kb)
            .into_iter()
            .filter_map(|i| match i {
                Inference::PrerequisiteChain { concept_id, chain } => Some((concept_id, chain)),
                _ => None,
            })
            .collect();

        assert_eq!(
            chains,
            vec![
                ("a".to_string(), vec!["b".to_string()]),
                ("b".to_string(), vec!["a".to_string()]),
            ]
        );
    }

    #[test]
    fn test_path_orders_by_unsatisfied_then_interleaves_difficulty() {
        let kb = base(vec![
            concept("a", 5, &["b"]),
            concept("b", 5, &["a"]),
            concept("e", 1, &[]),
            concept("f", 1, &[]),
            concept("g", 3, &[]),
        ]);

        let inferences = PathOptimization.evaluate(&kb);
        assert_eq!(inferences.len(), 1);
        match &inferences[0] {
            Inference::OptimizedPath { sequence } => assert_eq!(sequence, &["e", "g", "a", "f", "b"]),
            other => panic!("unexpected inference {:?}", other),
        }
    }

    #[test]
    fn test_path_needs_three_concepts() {
        let kb = base(vec![concept("e", 1, &[]), concept("f", 2, &[])]);
        assert!(PathOptimization.evaluate(&kb).is_empty());
    }

    #[test]
    fn test_recommended_difficulty() {
        assert_eq!(DifficultyProgression::recommended_for(0.0).level(), 1);
        assert_eq!(DifficultyProgression::recommended_for(0.5).level(), 3);
        assert_eq!(DifficultyProgression::recommended_for(0.99).level(), 5);
        assert_eq!(DifficultyProgression::recommended_for(1.0).level(), 5);
    }

    #[test]
    fn test_inference_concerns() {
        let chain = Inference::PrerequisiteChain {
            concept_id: "genetics".into(),
            chain: vec!["cells".into()],
        };
        assert!(chain.concerns("genetics"));
        assert!(chain.concerns("cells"));
        assert!(!chain.concerns("ecology"));
        assert_eq!(chain.tag(), "prerequisite_chain:genetics");
    }
}
