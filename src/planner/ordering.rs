//! Topic suitability, ordering and time-budget selection

use std::cmp::Ordering;

use crate::config::PlannerConfig;
use crate::curriculum::{CurriculumGraph, Topic};
use crate::mastery::UserModel;

/// Mean mastery of a topic's required skills (0.0 when it has none)
pub fn topic_skill_level(topic: &Topic, model: &UserModel) -> f64 {
    model.average_mastery(topic.required_skills.iter()).unwrap_or(0.0)
}

/// Every required skill at or above `threshold`. A topic with no required
/// skills is never considered mastered.
pub fn skills_at_least(topic: &Topic, model: &UserModel, threshold: f64) -> bool {
    !topic.required_skills.is_empty()
        && topic.required_skills.iter().all(|s| model.mastery(s.as_str()) >= threshold)
}

/// Ready to study: each direct prerequisite topic has all of its required
/// skills at the prerequisite threshold, and the topic itself is not
/// already mastered. Prerequisites missing from the curriculum impose
/// nothing.
pub fn is_topic_suitable(topic: &Topic, graph: &CurriculumGraph, model: &UserModel, config: &PlannerConfig) -> bool {
    let prerequisites_met = topic.prerequisites.iter()
        .filter_map(|id| graph.get(id))
        .all(|prereq| {
            prereq.required_skills.iter()
                .all(|s| model.mastery(s.as_str()) >= config.prerequisite_threshold)
        });

    prerequisites_met && !skills_at_least(topic, model, config.mastered_threshold)
}

/// Difficulty decides only when the levels differ by more than one; otherwise
/// the topic the learner is stronger in comes first.
fn compare_for_study(a: &Topic, b: &Topic, model: &UserModel) -> Ordering {
    let gap = a.difficulty.level() as i16 - b.difficulty.level() as i16;
    if gap.abs() > 1 {
        return a.difficulty.cmp(&b.difficulty);
    }
    topic_skill_level(b, model)
        .partial_cmp(&topic_skill_level(a, model))
        .unwrap_or(Ordering::Equal)
}

/// Stable sort by [`compare_for_study`].
///
/// The comparator is not transitive (difficulty is only decisive past a
/// gap), so this is a plain insertion sort that swaps only on a strict
/// `Greater`. Equal topics keep their input order.
pub fn sort_topics_by_optimal_order<'a>(topics: &[&'a Topic], model: &UserModel) -> Vec<&'a Topic> {
    let mut sorted: Vec<&Topic> = topics.to_vec();
    for i in 1..sorted.len() {
        let mut j = i;
        while j > 0 && compare_for_study(sorted[j - 1], sorted[j], model) == Ordering::Greater {
            sorted.swap(j - 1, j);
            j -= 1;
        }
    }
    sorted
}

/// Outcome of greedy time-budget selection
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSelection {
    pub selected: Vec<String>,
    pub rejected: Vec<String>,
    pub total_time: u32,
}

/// Importance of a topic: ten per dependent plus its difficulty
pub fn topic_importance(topic: &Topic, graph: &CurriculumGraph) -> f64 {
    (graph.dependent_count(&topic.id) * 10) as f64 + topic.difficulty.as_f64()
}

/// Greedy by descending importance per minute. A topic that does not fit
/// the remaining budget is rejected and scanning continues, so every
/// rejected topic would overflow the final total.
pub fn optimize_for_time(candidates: &[&Topic], graph: &CurriculumGraph, budget: u32) -> TimeSelection {
    let mut ranked: Vec<(&Topic, f64)> = candidates.iter()
        .map(|&t| {
            let ratio = if t.estimated_minutes == 0 {
                f64::INFINITY
            } else {
                topic_importance(t, graph) / t.estimated_minutes as f64
            };
            (t, ratio)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut selection = TimeSelection {
        selected: Vec::new(),
        rejected: Vec::new(),
        total_time: 0,
    };

    for (topic, _) in ranked {
        match selection.total_time.checked_add(topic.estimated_minutes) {
            Some(total) if total <= budget => {
                selection.total_time = total;
                selection.selected.push(topic.id.clone());
            }
            _ => selection.rejected.push(topic.id.clone()),
        }
    }

    selection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use crate::curriculum::{SkillCatalog, SkillId};
    use crate::types::Difficulty;

    fn topic(id: &str, level: u8, minutes: u32, skills: &[&str]) -> Topic {
        Topic::new(id, id, Difficulty::new(level).unwrap(), minutes)
            .with_skills(skills.iter().map(|s| SkillId::parse(s).unwrap()).collect())
    }

    fn model_with(levels: &[(&str, f64)]) -> UserModel {
        let catalog = SkillCatalog::from_skills(levels.iter().map(|(s, _)| SkillId::parse(s).unwrap()));
        let mut model = UserModel::new("u", &catalog, &TrackerConfig::default());
        for (skill, level) in levels {
            if let Some(state) = model.skills.get_mut(*skill) {
                state.set_current(*level);
            }
        }
        model
    }

    #[test]
    fn test_difficulty_only_decisive_past_one_level() {
        let model = model_with(&[("a.x", 0.2), ("a.y", 0.9)]);
        let easy_weak = topic("easy_weak", 2, 30, &["a.x"]);
        let hard_strong = topic("hard_strong", 3, 30, &["a.y"]);
        let hardest = topic("hardest", 5, 30, &["a.y"]);

        let sorted = sort_topics_by_optimal_order(&[&easy_weak, &hardest, &hard_strong], &model);
        let ids: Vec<&str> = sorted.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["hard_strong", "easy_weak", "hardest"]);
    }

    #[test]
    fn test_mastered_topic_not_suitable() {
        let graph = CurriculumGraph::new(vec![topic("t", 2, 30, &["a.x"])]);
        let model = model_with(&[("a.x", 0.85)]);
        let config = PlannerConfig::default();
        assert!(!is_topic_suitable(graph.get("t").unwrap(), &graph, &model, &config));
    }

    #[test]
    fn test_optimize_skips_and_continues() {
        let graph = CurriculumGraph::new(vec![
            topic("long", 3, 50, &[]),
            topic("short", 1, 10, &[]),
            topic("mid", 3, 30, &[]),
        ]);
        let candidates: Vec<&Topic> = graph.topics().iter().collect();
        let selection = optimize_for_time(&candidates, &graph, 45);

        assert_eq!(selection.selected, vec!["short", "mid"]);
        assert_eq!(selection.rejected, vec!["long"]);
        assert_eq!(selection.total_time, 40);
    }
}
