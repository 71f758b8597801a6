//! Session construction: duration, activities and expected improvement

use crate::curriculum::Topic;
use crate::mastery::UserModel;
use crate::types::{clamp_unit, mean, Difficulty, LearningStyle};

use super::plan::{Activity, ActivityKind, Session};
use super::PlanningContext;

/// Estimated minutes scaled by how far the topic sits above (or below) the
/// learner: ten percent per difficulty level of gap, kept within half and
/// double the estimate.
pub fn difficulty_adjusted_duration(topic: &Topic, learner_level: f64) -> u32 {
    let estimate = topic.estimated_minutes as f64;
    let gap = topic.difficulty.as_f64() - learner_level * 5.0;
    let adjusted = (estimate * (1.0 + gap * 0.1)).clamp(estimate * 0.5, estimate * 2.0);
    adjusted.round() as u32
}

/// Heuristic gain from one session: the mean remaining gap to target on the
/// topic's skills, scaled up for harder material
pub fn expected_improvement(topic: &Topic, model: &UserModel) -> f64 {
    let gaps: Vec<f64> = topic.required_skills.iter()
        .map(|id| match model.skill(id.as_str()) {
            Some(state) => state.gap(),
            None => 0.5,
        })
        .collect();
    let gap = mean(&gaps).unwrap_or(0.5);
    clamp_unit(gap * (0.5 + topic.difficulty.as_f64() / 10.0))
}

/// Activity mix for a session. Lead-in follows the learning style; quizzes
/// always close the session; harder topics add a project.
pub fn activities_for(difficulty: Difficulty, style: LearningStyle, needs_review: bool, minutes: u32) -> Vec<Activity> {
    let mut kinds = Vec::new();
    if needs_review {
        kinds.push(ActivityKind::Review);
    }
    match style {
        LearningStyle::Visual => kinds.push(ActivityKind::VisualOverview),
        LearningStyle::Reading => kinds.push(ActivityKind::Reading),
        LearningStyle::HandsOn => {}
        LearningStyle::Balanced => {
            kinds.push(ActivityKind::Reading);
            kinds.push(ActivityKind::VisualOverview);
        }
    }
    kinds.push(ActivityKind::Practice);
    if difficulty.level() >= 4 {
        kinds.push(ActivityKind::Project);
    }
    kinds.push(ActivityKind::Quiz);

    // split evenly, remainder to the first activity
    let share = minutes / kinds.len() as u32;
    let remainder = minutes % kinds.len() as u32;
    kinds.into_iter()
        .enumerate()
        .map(|(i, kind)| Activity {
            kind,
            minutes: if i == 0 { share + remainder } else { share },
        })
        .collect()
}

pub fn build_session(ctx: &PlanningContext<'_>, topic: &Topic) -> Session {
    let level = ctx.topic_level(topic);
    let duration = difficulty_adjusted_duration(topic, level);
    let needs_review = ctx.recommended_difficulty(&topic.id)
        .is_some_and(|recommended| recommended < topic.difficulty);

    Session {
        topic_id: topic.id.clone(),
        topic_name: topic.name.clone(),
        activities: activities_for(topic.difficulty, ctx.config.learning_style, needs_review, duration),
        prerequisites: topic.prerequisites.clone(),
        objectives: topic.learning_objectives.clone(),
        duration_minutes: duration,
        difficulty: topic.difficulty,
        expected_improvement: expected_improvement(topic, ctx.model),
        scheduled_for: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_scales_with_gap() {
        let topic = Topic::new("t", "t", Difficulty::new(4).unwrap(), 60);
        // level 0.5 -> gap 1.5 -> x1.15
        assert_eq!(difficulty_adjusted_duration(&topic, 0.5), 69);
        // level 1.0 -> gap -1 -> x0.9
        assert_eq!(difficulty_adjusted_duration(&topic, 1.0), 54);
        // level 0 -> gap 4 -> x1.4
        assert_eq!(difficulty_adjusted_duration(&topic, 0.0), 84);
    }

    #[test]
    fn test_activities_fill_duration() {
        let activities = activities_for(Difficulty::new(5).unwrap(), LearningStyle::Balanced, true, 61);
        let total: u32 = activities.iter().map(|a| a.minutes).sum();
        assert_eq!(total, 61);
        assert_eq!(activities.first().map(|a| a.kind), Some(ActivityKind::Review));
        assert!(activities.iter().any(|a| a.kind == ActivityKind::Project));
        assert_eq!(activities.last().map(|a| a.kind), Some(ActivityKind::Quiz));
    }
}
