//! Learning path planner: suitability, ordering, time budgeting and selection

use adaptive_tutor::config::{PlannerConfig, TrackerConfig};
use adaptive_tutor::curriculum::{sample_curriculum, CurriculumGraph, SkillId, Topic};
use adaptive_tutor::mastery::UserModel;
use adaptive_tutor::planner::{
    is_topic_suitable, optimize_for_time, sort_topics_by_optimal_order, LearningPathPlanner, PlanState,
    PlanningContext, PlanningStrategy, ShortestPathStrategy,
};
use adaptive_tutor::types::Difficulty;

fn fresh_model(graph: &CurriculumGraph) -> UserModel {
    UserModel::new("learner", graph.catalog(), &TrackerConfig::default())
}

fn set_mastery(model: &mut UserModel, skill: &str, value: f64) {
    model.skills.get_mut(skill).expect("skill in catalog").set_current(value);
    model.refresh_aggregates(chrono::Utc::now());
}

/// Small deterministic generator so the property checks need no extra crates
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u32) -> u32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) % bound as u64) as u32
    }
}

#[test]
fn test_genetics_suitable_once_cell_biology_skills_strong() {
    let graph = sample_curriculum();
    let mut model = fresh_model(&graph);
    let config = PlannerConfig::default();
    let genetics = graph.get("genetics").unwrap();

    assert!(!is_topic_suitable(genetics, &graph, &model, &config));

    for skill in ["biology.cell_structure", "biology.organelles", "biology.cell_function"] {
        set_mastery(&mut model, skill, 0.9);
    }
    assert!(is_topic_suitable(genetics, &graph, &model, &config));
}

#[test]
fn test_optimize_for_time_respects_budget() {
    let mut rng = Lcg(42);

    for round in 0..200 {
        let count = rng.next(12) + 1;
        let mut topics = Vec::new();
        for i in 0..count {
            let prereqs = if i > 0 && rng.next(2) == 0 {
                vec![format!("t{}", rng.next(i))]
            } else {
                Vec::new()
            };
            topics.push(
                Topic::new(
                    &format!("t{}", i),
                    "topic",
                    Difficulty::new(rng.next(5) as u8 + 1).unwrap(),
                    rng.next(90) + 1,
                )
                .with_prerequisites(prereqs),
            );
        }
        let graph = CurriculumGraph::new(topics);
        let candidates: Vec<&Topic> = graph.topics().iter().collect();
        let budget = rng.next(300);

        let selection = optimize_for_time(&candidates, &graph, budget);

        assert!(selection.total_time <= budget, "round {}", round);
        let selected_time: u32 = selection.selected.iter()
            .map(|id| graph.get(id).unwrap().estimated_minutes)
            .sum();
        assert_eq!(selected_time, selection.total_time);
        assert_eq!(selection.selected.len() + selection.rejected.len(), candidates.len());
        for id in &selection.rejected {
            let minutes = graph.get(id).unwrap().estimated_minutes;
            assert!(selection.total_time + minutes > budget, "round {}: {} would fit", round, id);
        }
    }
}

#[test]
fn test_sort_is_stable_for_equal_topics() {
    let skill = SkillId::parse("math.algebra").unwrap();
    let first = Topic::new("first", "First", Difficulty::new(3).unwrap(), 30).with_skills(vec![skill.clone()]);
    let second = Topic::new("second", "Second", Difficulty::new(3).unwrap(), 45).with_skills(vec![skill]);
    let graph = CurriculumGraph::new(vec![first.clone(), second.clone()]);
    let model = fresh_model(&graph);

    let ids = |sorted: Vec<&Topic>| sorted.iter().map(|t| t.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(sort_topics_by_optimal_order(&[&first, &second], &model)), vec!["first", "second"]);
    assert_eq!(ids(sort_topics_by_optimal_order(&[&second, &first], &model)), vec!["second", "first"]);

    // repeated runs agree
    let again = ids(sort_topics_by_optimal_order(&[&second, &first], &model));
    assert_eq!(again, vec!["second", "first"]);
}

#[test]
fn test_shortest_path_remediates_weakness_through_prerequisites() {
    let graph = sample_curriculum();
    let mut model = fresh_model(&graph);
    set_mastery(&mut model, "biology.genetics", 0.2);
    let config = PlannerConfig::default();
    let ctx = PlanningContext::new(&graph, &model, &config);

    let plan = ShortestPathStrategy.build(&ctx);
    let ids = plan.topic_ids();
    assert_eq!(&ids[..2], &["cell_biology", "genetics"]);
    assert!(plan.total_time <= config.weekly_budget());
}

#[test]
fn test_selected_plan_has_best_score_and_fits_budget() {
    let graph = sample_curriculum();
    let mut model = fresh_model(&graph);
    set_mastery(&mut model, "logic.probability", 0.3);
    let config = PlannerConfig { time_available_minutes: 45, sessions_per_week: 4, ..PlannerConfig::default() };
    let ctx = PlanningContext::new(&graph, &model, &config);

    let outcome = LearningPathPlanner::new().create_learning_plan(&ctx).unwrap();
    let selected = &outcome.selected;
    assert_eq!(selected.state, PlanState::Selected);
    assert!(selected.total_time <= 180);
    assert_eq!(selected.total_time, selected.sessions.iter().map(|s| s.duration_minutes).sum::<u32>());
    for other in &outcome.discarded {
        assert_eq!(other.state, PlanState::Discarded);
        assert!(other.score.unwrap() <= selected.score.unwrap());
    }

    let adaptive = selected.adaptive.as_ref().unwrap();
    assert_eq!(adaptive.checkpoint_every_sessions, 1);
    assert!(adaptive.personalization.focus_weaknesses);
}

#[test]
fn test_mastered_curriculum_yields_empty_plan() {
    let graph = sample_curriculum();
    let mut model = fresh_model(&graph);
    let skills: Vec<String> = model.skills.keys().map(|s| s.as_str().to_string()).collect();
    for skill in &skills {
        set_mastery(&mut model, skill, 0.95);
    }
    let config = PlannerConfig::default();
    let ctx = PlanningContext::new(&graph, &model, &config);

    let outcome = LearningPathPlanner::new().create_learning_plan(&ctx).unwrap();
    assert!(outcome.selected.sessions.is_empty());
    assert_eq!(outcome.selected.total_time, 0);
}
