//! Learning Path Planner
//!
//! Provides:
//! - Topic suitability and study ordering
//! - Greedy time-budget selection
//! - Shortest-path and constraint-satisfaction strategies
//! - Plan scoring, selection and adaptive elements

pub mod ordering;
pub mod plan;
pub mod scoring;
pub mod session;
pub mod strategy;

use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::PlannerConfig;
use crate::curriculum::{CurriculumGraph, Topic};
use crate::error::TutorError;
use crate::mastery::UserModel;
use crate::reasoner::{Inference, KnowledgeBase};
use crate::types::Difficulty;

pub use ordering::{
    is_topic_suitable, optimize_for_time, sort_topics_by_optimal_order, TimeSelection,
};
pub use plan::{Activity, ActivityKind, AdaptiveElements, Milestone, Personalization, Plan, PlanState, Session};
pub use scoring::score_plan;
pub use session::difficulty_adjusted_duration;
pub use strategy::{ConstraintSatisfactionStrategy, PlanningStrategy, ShortestPathStrategy};

/// Everything a strategy reads while planning for one learner
pub struct PlanningContext<'a> {
    pub graph: &'a CurriculumGraph,
    pub model: &'a UserModel,
    pub config: &'a PlannerConfig,
    recommended: HashMap<String, Difficulty>,
}

impl<'a> PlanningContext<'a> {
    pub fn new(graph: &'a CurriculumGraph, model: &'a UserModel, config: &'a PlannerConfig) -> Self {
        Self {
            graph,
            model,
            config,
            recommended: HashMap::new(),
        }
    }

    /// Take difficulty recommendations from a reasoned knowledge base
    pub fn with_reasoning(mut self, kb: &KnowledgeBase) -> Self {
        for result in &kb.inferences {
            if let Inference::DifficultyAdjustment { concept_id, recommended, .. } = &result.inference {
                self.recommended.insert(concept_id.clone(), *recommended);
            }
        }
        self
    }

    pub fn budget(&self) -> u32 {
        self.config.weekly_budget()
    }

    /// Learner level on a topic, falling back to overall ability
    pub fn topic_level(&self, topic: &Topic) -> f64 {
        self.model.average_mastery(topic.required_skills.iter())
            .unwrap_or(self.model.aggregates.overall_ability)
    }

    pub fn is_mastered(&self, topic: &Topic) -> bool {
        ordering::skills_at_least(topic, self.model, self.config.mastered_threshold)
    }

    pub fn recommended_difficulty(&self, topic_id: &str) -> Option<Difficulty> {
        self.recommended.get(topic_id).copied()
    }
}

/// The winning plan plus the candidates that lost
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub selected: Plan,
    pub discarded: Vec<Plan>,
}

pub struct LearningPathPlanner {
    strategies: Vec<Box<dyn PlanningStrategy>>,
}

impl Default for LearningPathPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl LearningPathPlanner {
    pub fn new() -> Self {
        Self {
            strategies: vec![Box::new(ShortestPathStrategy), Box::new(ConstraintSatisfactionStrategy)],
        }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn PlanningStrategy>>) -> Self {
        Self { strategies }
    }

    /// Suitable topics in study order
    pub fn ready_topics<'a>(&self, ctx: &PlanningContext<'a>) -> Vec<&'a Topic> {
        let suitable: Vec<&Topic> = ctx.graph.topics().iter()
            .filter(|t| is_topic_suitable(t, ctx.graph, ctx.model, ctx.config))
            .collect();
        sort_topics_by_optimal_order(&suitable, ctx.model)
    }

    /// Build and score one draft per strategy
    pub fn evaluate(&self, ctx: &PlanningContext<'_>) -> Result<Vec<Plan>, TutorError> {
        let mut plans = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            let mut plan = strategy.build(ctx);
            plan.confidence = scoring::plan_confidence(&plan, ctx.graph, ctx.model);
            plan.weakness_coverage = scoring::weakness_coverage(&plan, ctx.graph, ctx.model);
            plan.score = Some(score_plan(&plan));
            plan.transition_to(PlanState::Scored)?;

            debug!(
                "Strategy {} -> {} sessions, {} of {} min, score {:.2}",
                plan.strategy,
                plan.sessions.len(),
                plan.total_time,
                plan.budget,
                plan.score.unwrap_or_default()
            );
            plans.push(plan);
        }
        Ok(plans)
    }

    /// Run every strategy, keep the highest score (first on ties), discard
    /// the rest and attach adaptive elements to the winner
    pub fn create_learning_plan(&self, ctx: &PlanningContext<'_>) -> Result<PlanOutcome, TutorError> {
        let mut plans = self.evaluate(ctx)?;
        if plans.is_empty() {
            let mut empty = Plan::new(&ctx.model.user_id, "none", ctx.budget());
            empty.score = Some(score_plan(&empty));
            empty.transition_to(PlanState::Scored)?;
            plans.push(empty);
        }

        let mut best = 0;
        for (i, plan) in plans.iter().enumerate() {
            if plan.score.unwrap_or_default() > plans[best].score.unwrap_or_default() {
                best = i;
            }
        }

        let mut selected = plans.remove(best);
        selected.transition_to(PlanState::Selected)?;
        selected.adaptive = Some(Self::adaptive_elements(ctx));

        let mut discarded = plans;
        for plan in &mut discarded {
            plan.transition_to(PlanState::Discarded)?;
        }

        info!(
            "Selected {} plan for {}: {} sessions, {} min",
            selected.strategy,
            selected.user_id,
            selected.sessions.len(),
            selected.total_time
        );

        Ok(PlanOutcome { selected, discarded })
    }

    fn adaptive_elements(ctx: &PlanningContext<'_>) -> AdaptiveElements {
        AdaptiveElements {
            checkpoint_every_sessions: 1,
            increase_difficulty_above: 0.8,
            decrease_difficulty_below: 0.6,
            personalization: Personalization {
                learning_style: ctx.config.learning_style,
                focus_weaknesses: !ctx.model.aggregates.weaknesses.is_empty(),
                reinforce_strengths: !ctx.model.aggregates.strengths.is_empty(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use crate::curriculum::sample_curriculum;

    #[test]
    fn test_create_plan_selects_one_and_discards_rest() {
        let graph = sample_curriculum();
        let model = UserModel::new("learner", graph.catalog(), &TrackerConfig::default());
        let config = PlannerConfig::default();
        let ctx = PlanningContext::new(&graph, &model, &config);

        let outcome = LearningPathPlanner::new().create_learning_plan(&ctx).unwrap();
        assert_eq!(outcome.selected.state, PlanState::Selected);
        assert!(outcome.selected.adaptive.is_some());
        assert_eq!(outcome.discarded.len(), 1);
        assert!(outcome.discarded.iter().all(|p| p.state == PlanState::Discarded));
        assert!(outcome.discarded.iter().all(|p| p.score <= outcome.selected.score));
    }

    #[test]
    fn test_ready_topics_for_new_learner_are_foundational() {
        let graph = sample_curriculum();
        let model = UserModel::new("learner", graph.catalog(), &TrackerConfig::default());
        let config = PlannerConfig::default();
        let ctx = PlanningContext::new(&graph, &model, &config);

        let ready: Vec<&str> = LearningPathPlanner::new().ready_topics(&ctx)
            .into_iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ready, vec!["cell_biology", "basic_probability"]);
    }

    #[test]
    fn test_reasoning_marks_review() {
        let graph = sample_curriculum();
        let model = UserModel::new("learner", graph.catalog(), &TrackerConfig::default());
        let config = PlannerConfig::default();
        let mut kb = KnowledgeBase::default();
        kb.inferences.push(crate::reasoner::InferenceResult {
            rule: "difficulty_progression".into(),
            confidence: 0.8,
            inference: Inference::DifficultyAdjustment {
                concept_id: "cell_biology".into(),
                difficulty: Difficulty::new(2).unwrap(),
                learner_level: 0.0,
                recommended: Difficulty::new(1).unwrap(),
            },
        });
        let ctx = PlanningContext::new(&graph, &model, &config).with_reasoning(&kb);
        let topic = graph.get("cell_biology").unwrap();
        let session = session::build_session(&ctx, topic);
        assert_eq!(session.activities[0].kind, ActivityKind::Review);
    }
}
