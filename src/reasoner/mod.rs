//! Knowledge reasoning
//!
//! Builds a transient knowledge base from content plus a learner snapshot
//! and runs a small forward-chaining rule set over it:
//! - prerequisite chains
//! - difficulty recommendations
//! - inferred same-domain relationships
//! - an interleaved study path
//!
//! Ad-hoc questions are answered by scoring concepts against the query and
//! collecting the inferences that concern them.

pub mod knowledge_base;
pub mod rules;
pub mod query;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ReasonerConfig;
use crate::curriculum::CurriculumGraph;
use crate::mastery::UserModel;

pub use knowledge_base::{Concept, ContentDescriptor, FreeformConcept, KnowledgeBase, Relationship, RelationshipKind};
pub use query::{ParsedQuery, QuestionType};
pub use rules::{default_rules, Inference, InferenceResult, InferenceRule};

/// Confidence reported when nothing supports the answer
const NO_EVIDENCE_CONFIDENCE: f64 = 0.1;
/// Bonus per supporting inference
const EVIDENCE_BONUS: f64 = 0.1;

/// Answer to an ad-hoc reasoning query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConclusion {
    pub query: String,
    pub question_type: QuestionType,
    pub answer: String,
    /// Concepts matched by the query, most relevant first
    pub relevant_concepts: Vec<String>,
    /// Evidence tags of the supporting inferences
    pub evidence: Vec<String>,
    /// Heuristic, monotone in the amount of supporting evidence
    pub confidence: f64,
}

pub struct KnowledgeReasoner {
    config: ReasonerConfig,
    rules: Vec<Box<dyn InferenceRule>>,
}

impl KnowledgeReasoner {
    pub fn new(config: ReasonerConfig) -> Self {
        let rules = default_rules(config.difficulty_gap, config.domain_edge_weight);
        Self { config, rules }
    }

    /// Replace the rule set
    pub fn with_rules(mut self, rules: Vec<Box<dyn InferenceRule>>) -> Self {
        self.rules = rules;
        self
    }

    /// Knowledge base over every curriculum topic
    pub fn build_from_curriculum(&self, graph: &CurriculumGraph, model: &UserModel) -> KnowledgeBase {
        let contents = graph.topics().iter()
            .cloned()
            .map(ContentDescriptor::Topic)
            .collect();
        KnowledgeBase::build(contents, model)
    }

    /// Run every rule in order. Inferred relationships are folded into the
    /// base before the next rule runs. Returns the new results.
    pub fn infer(&self, kb: &mut KnowledgeBase) -> Vec<InferenceResult> {
        let mut produced = Vec::new();

        for rule in &self.rules {
            let inferences = rule.evaluate(kb);
            debug!("Rule {} produced {} inferences", rule.name(), inferences.len());

            for inference in inferences {
                if let Inference::InferredRelationship(edge) = &inference {
                    if !kb.add_relationship(edge.clone()) {
                        continue;
                    }
                }
                produced.push(InferenceResult {
                    rule: rule.name().to_string(),
                    confidence: rule.confidence(),
                    inference,
                });
            }
        }

        kb.inferences.extend(produced.iter().cloned());
        produced
    }

    /// Answer a free-text question against the knowledge base.
    ///
    /// parse -> classify -> score concepts -> run rules (once per base) ->
    /// collect inferences about the matched concepts -> conclude.
    pub fn perform_logical_reasoning(&self, query: &str, kb: &mut KnowledgeBase) -> ReasoningConclusion {
        let parsed = ParsedQuery::parse(query);
        let relevant: Vec<String> = query::score_concepts(&parsed, kb)
            .into_iter()
            .map(|(id, _)| id)
            .collect();

        if kb.inferences.is_empty() {
            self.infer(kb);
        }

        let preferred = parsed.question_type.preferred_rule();
        let mut supporting: Vec<&InferenceResult> = kb.inferences.iter()
            .filter(|r| relevant.iter().any(|id| r.inference.concerns(id)))
            .collect();
        // preferred rule first, otherwise base order
        supporting.sort_by_key(|r| Some(r.rule.as_str()) != preferred);

        let confidence = if supporting.is_empty() {
            NO_EVIDENCE_CONFIDENCE
        } else {
            let mean = supporting.iter().map(|r| r.confidence).sum::<f64>() / supporting.len() as f64;
            (mean + EVIDENCE_BONUS * supporting.len() as f64).min(self.config.max_confidence)
        };

        let answer = self.compose_answer(parsed.question_type, &relevant, &supporting, kb);

        ReasoningConclusion {
            query: parsed.raw,
            question_type: parsed.question_type,
            answer,
            evidence: supporting.iter().map(|r| r.inference.tag()).collect(),
            relevant_concepts: relevant,
            confidence,
        }
    }

    fn compose_answer(
        &self,
        question_type: QuestionType,
        relevant: &[String],
        supporting: &[&InferenceResult],
        kb: &KnowledgeBase,
    ) -> String {
        let Some(focus) = relevant.first() else {
            return "No matching concepts found.".to_string();
        };
        let name = |id: &str| kb.concept(id).map(|c| c.name.clone()).unwrap_or_else(|| id.to_string());
        let focus_name = name(focus.as_str());
        let inferences: Vec<&Inference> = supporting.iter().map(|r| &r.inference).collect();

        match question_type {
            QuestionType::Prerequisite => {
                let chain = inferences.iter().find_map(|i| match i {
                    Inference::PrerequisiteChain { concept_id, chain } if concept_id == focus => Some(chain),
                    _ => None,
                });
                match chain {
                    Some(chain) => format!(
                        "Before {}, study: {}.",
                        focus_name,
                        chain.iter().map(|id| name(id.as_str())).collect::<Vec<_>>().join(", ")
                    ),
                    None => format!("{} has no prerequisites.", focus_name),
                }
            }
            QuestionType::Difficulty => {
                let adjustment = inferences.iter().find_map(|i| match i {
                    Inference::DifficultyAdjustment { concept_id, difficulty, recommended, .. }
                        if concept_id == focus => Some((*difficulty, *recommended)),
                    _ => None,
                });
                match adjustment {
                    Some((difficulty, recommended)) => {
                        let verdict = if recommended < difficulty { "likely too hard" } else { "likely too easy" };
                        format!(
                            "{} (difficulty {}) is {} right now; work at difficulty {} first.",
                            focus_name, difficulty, verdict, recommended
                        )
                    }
                    None => format!("{} matches your current level.", focus_name),
                }
            }
            QuestionType::Relationship => {
                let mut linked: Vec<String> = kb.neighbours(focus).into_iter().map(name).collect();
                linked.sort();
                linked.dedup();
                if linked.is_empty() {
                    format!("{} has no known relationships.", focus_name)
                } else {
                    format!("{} relates to: {}.", focus_name, linked.join(", "))
                }
            }
            QuestionType::Recommendation => {
                let path = inferences.iter().find_map(|i| match i {
                    Inference::OptimizedPath { sequence } => Some(sequence),
                    _ => None,
                });
                match path {
                    Some(sequence) => format!(
                        "Suggested order: {}.",
                        sequence.iter().map(|id| name(id.as_str())).collect::<Vec<_>>().join(" -> ")
                    ),
                    None => format!("Start with {}.", focus_name),
                }
            }
            QuestionType::General => format!(
                "Most relevant concept: {} ({} supporting inferences).",
                focus_name,
                supporting.len()
            ),
        }
    }
}
