//! Planning strategies
//!
//! Each strategy turns a [`PlanningContext`] into a draft [`Plan`] that fits
//! the weekly budget. The planner runs all of them and keeps the best.

use std::collections::HashSet;
use tracing::debug;

use crate::curriculum::Topic;
use crate::types::{clamp_unit, LearningStyle};

use super::ordering::{optimize_for_time, sort_topics_by_optimal_order};
use super::plan::Plan;
use super::session::build_session;
use super::PlanningContext;

pub trait PlanningStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn build(&self, ctx: &PlanningContext<'_>) -> Plan;
}

/// Remediate weaknesses first, then lay foundations. Each target pulls in
/// its unmastered prerequisites (deepest first) and sessions are packed in
/// that order until the budget runs out.
pub struct ShortestPathStrategy;

impl ShortestPathStrategy {
    /// Targets in priority order: topics exercising a weak skill (weakest
    /// first), then foundational topics, then the rest in study order
    pub fn critical_path<'a>(ctx: &PlanningContext<'a>) -> Vec<&'a Topic> {
        let weaknesses: HashSet<&str> = ctx.model.aggregates.weaknesses.iter()
            .map(|id| id.as_str())
            .collect();

        let mut remedial: Vec<(&Topic, f64)> = ctx.graph.topics().iter()
            .filter(|t| t.required_skills.iter().any(|s| weaknesses.contains(s.as_str())))
            .map(|t| {
                let weakest = t.required_skills.iter()
                    .map(|s| ctx.model.mastery(s.as_str()))
                    .fold(f64::INFINITY, f64::min);
                (t, weakest)
            })
            .collect();
        remedial.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut path: Vec<&Topic> = remedial.into_iter().map(|(t, _)| t).collect();
        for topic in ctx.graph.foundational() {
            if !path.iter().any(|t| t.id == topic.id) {
                path.push(topic);
            }
        }
        let rest: Vec<&Topic> = ctx.graph.topics().iter()
            .filter(|t| !path.iter().any(|p| p.id == t.id))
            .collect();
        path.extend(sort_topics_by_optimal_order(&rest, ctx.model));
        path
    }
}

impl PlanningStrategy for ShortestPathStrategy {
    fn name(&self) -> &'static str {
        "shortest_path"
    }

    fn build(&self, ctx: &PlanningContext<'_>) -> Plan {
        let mut plan = Plan::new(&ctx.model.user_id, self.name(), ctx.budget());

        for target in Self::critical_path(ctx) {
            if plan.remaining() == 0 {
                break;
            }
            for id in ctx.graph.learning_order(&target.id) {
                if plan.contains(&id) {
                    continue;
                }
                let Some(topic) = ctx.graph.get(&id) else {
                    continue;
                };
                if ctx.is_mastered(topic) {
                    continue;
                }
                // a prerequisite that does not fit blocks the rest of the chain
                if !plan.try_push(build_session(ctx, topic)) {
                    debug!("shortest_path: {} does not fit, dropping chain of {}", id, target.id);
                    break;
                }
            }
        }

        plan
    }
}

/// Hard constraints filter candidates; a soft score decides acceptance
pub struct ConstraintSatisfactionStrategy;

impl ConstraintSatisfactionStrategy {
    /// Every direct prerequisite is planned already or its skills average at
    /// least the constraint threshold
    fn prerequisites_hold(ctx: &PlanningContext<'_>, plan: &Plan, topic: &Topic) -> bool {
        topic.prerequisites.iter().all(|id| {
            if plan.contains(id) {
                return true;
            }
            match ctx.graph.get(id) {
                Some(prereq) => match ctx.model.average_mastery(prereq.required_skills.iter()) {
                    Some(level) => level >= ctx.config.constraint_prerequisite_threshold,
                    None => true,
                },
                None => true,
            }
        })
    }

    /// Mean of difficulty match, engagement and learning-style fit
    pub fn soft_score(ctx: &PlanningContext<'_>, topic: &Topic) -> f64 {
        let ideal = (ctx.topic_level(topic) * 5.0 + 1.0).min(5.0);
        let difficulty_match = clamp_unit(1.0 - (topic.difficulty.as_f64() - ideal).abs() / 4.0);
        let engagement = 0.5 + 0.5 * ctx.model.aggregates.engagement_score;
        let level = topic.difficulty.level();
        let style_fit = match ctx.config.learning_style {
            LearningStyle::Balanced => 0.8,
            LearningStyle::Visual | LearningStyle::Reading => if level <= 3 { 1.0 } else { 0.7 },
            LearningStyle::HandsOn => if level >= 3 { 1.0 } else { 0.7 },
        };
        (difficulty_match + engagement + style_fit) / 3.0
    }
}

impl PlanningStrategy for ConstraintSatisfactionStrategy {
    fn name(&self) -> &'static str {
        "constraint_satisfaction"
    }

    fn build(&self, ctx: &PlanningContext<'_>) -> Plan {
        let mut plan = Plan::new(&ctx.model.user_id, self.name(), ctx.budget());

        let unmastered: Vec<&Topic> = ctx.graph.topics().iter()
            .filter(|t| !ctx.is_mastered(t))
            .collect();

        // shortlist by importance per minute before checking constraints
        let shortlist = optimize_for_time(&unmastered, ctx.graph, ctx.budget());
        if !shortlist.rejected.is_empty() {
            debug!("constraint_satisfaction: {} topics outside the time shortlist", shortlist.rejected.len());
        }
        let candidates: Vec<&Topic> = unmastered.into_iter()
            .filter(|t| shortlist.selected.contains(&t.id))
            .collect();

        for topic in sort_topics_by_optimal_order(&candidates, ctx.model) {
            let session = build_session(ctx, topic);
            if session.duration_minutes > plan.remaining() {
                continue;
            }
            if !Self::prerequisites_hold(ctx, &plan, topic) {
                continue;
            }
            let soft = Self::soft_score(ctx, topic);
            if soft < ctx.config.soft_constraint_min {
                debug!("constraint_satisfaction: {} rejected (soft score {:.2})", topic.id, soft);
                continue;
            }
            plan.try_push(session);
        }

        plan
    }
}
