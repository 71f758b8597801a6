//! Plan scoring used to pick between strategies

use std::collections::HashSet;

use crate::curriculum::CurriculumGraph;
use crate::mastery::UserModel;
use crate::types::mean;

use super::plan::Plan;

const IMPROVEMENT_WEIGHT: f64 = 10.0;
const SLACK_WEIGHT: f64 = 5.0;
const CONFIDENCE_WEIGHT: f64 = 3.0;
const COVERAGE_WEIGHT: f64 = 4.0;

/// Skills exercised by the plan's sessions
fn planned_skills<'a>(plan: &Plan, graph: &'a CurriculumGraph) -> HashSet<&'a str> {
    plan.sessions.iter()
        .filter_map(|s| graph.get(&s.topic_id))
        .flat_map(|t| t.required_skills.iter().map(|id| id.as_str()))
        .collect()
}

/// Share of the learner's weaknesses exercised by some session. An empty
/// plan covers nothing; a learner with no weaknesses is fully covered.
pub fn weakness_coverage(plan: &Plan, graph: &CurriculumGraph, model: &UserModel) -> f64 {
    if plan.sessions.is_empty() {
        return 0.0;
    }
    let weaknesses = &model.aggregates.weaknesses;
    if weaknesses.is_empty() {
        return 1.0;
    }
    let skills = planned_skills(plan, graph);
    let covered = weaknesses.iter().filter(|w| skills.contains(w.as_str())).count();
    covered as f64 / weaknesses.len() as f64
}

/// Mean confidence of the planned skills the learner has state for
pub fn plan_confidence(plan: &Plan, graph: &CurriculumGraph, model: &UserModel) -> f64 {
    if plan.sessions.is_empty() {
        return 0.0;
    }
    let confidences: Vec<f64> = planned_skills(plan, graph).into_iter()
        .filter_map(|id| model.skill(id).map(|s| s.confidence))
        .collect();
    mean(&confidences).unwrap_or(0.5)
}

/// 10 x mean expected improvement + 5 x unused budget share
/// + 3 x confidence + 4 x weakness coverage
pub fn score_plan(plan: &Plan) -> f64 {
    IMPROVEMENT_WEIGHT * plan.mean_expected_improvement()
        + SLACK_WEIGHT * (1.0 - plan.time_utilization()).max(0.0)
        + CONFIDENCE_WEIGHT * plan.confidence
        + COVERAGE_WEIGHT * plan.weakness_coverage
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_plan_scores_only_slack() {
        let plan = Plan::new("u", "none", 100);
        assert!((score_plan(&plan) - SLACK_WEIGHT).abs() < 1e-12);
    }
}
