//! Skill mastery tracker behaviour through the public API

use std::sync::Arc;

use chrono::{Duration, Utc};

use adaptive_tutor::config::TrackerConfig;
use adaptive_tutor::curriculum::{sample_curriculum, SkillCatalog, SkillId};
use adaptive_tutor::mastery::{feature_vector, ActivityEvent, ActivityMeta, SkillTracker, UserModel};
use adaptive_tutor::types::{Difficulty, Trajectory};

fn setup() -> (SkillTracker, UserModel) {
    let graph = sample_curriculum();
    let catalog = Arc::new(graph.catalog().clone());
    let config = TrackerConfig::default();
    let model = UserModel::new("learner", &catalog, &config);
    (SkillTracker::new(config, catalog), model)
}

fn level(n: u8) -> Difficulty {
    Difficulty::new(n).unwrap()
}

#[test]
fn test_mastery_and_confidence_stay_in_range_under_adversarial_updates() {
    let (tracker, mut model) = setup();

    for i in 0..1000 {
        let performance = if i % 2 == 0 { 1.0 } else { 0.0 };
        let difficulty = level((i % 5) as u8 + 1);
        let meta = ActivityMeta::new((i % 7) as f64 * 100.0).with_hints((i % 3) as u32);
        tracker.update_skill(&mut model, "biology.genetics", performance, difficulty, &meta);

        let state = model.skill("biology.genetics").unwrap();
        assert!((0.0..=1.0).contains(&state.current));
        assert!((0.1..=1.0).contains(&state.confidence));
    }

    for performance in [1.0, 0.0] {
        for _ in 0..1000 {
            tracker.update_skill(&mut model, "logic.probability", performance, level(5), &ActivityMeta::new(300.0));
            let state = model.skill("logic.probability").unwrap();
            assert!((0.0..=1.0).contains(&state.current));
            assert!((0.1..=1.0).contains(&state.confidence));
        }
    }
}

#[test]
fn test_history_capped_fifo() {
    let (tracker, mut model) = setup();
    let start = Utc::now();

    for i in 0..25 {
        let meta = ActivityMeta::new(120.0).at(start + Duration::seconds(i));
        tracker.update_skill(&mut model, "biology.genetics", 0.6, level(2), &meta);
    }

    let history = &model.skill("biology.genetics").unwrap().practice_history;
    assert_eq!(history.len(), 20);
    assert_eq!(history.front().unwrap().timestamp, start + Duration::seconds(5));
    assert_eq!(history.back().unwrap().timestamp, start + Duration::seconds(24));
}

#[test]
fn test_optimal_time_bonus_raises_mastery() {
    let (tracker, mut model) = setup();
    assert_eq!(model.mastery("biology.genetics"), 0.5);
    assert_eq!(SkillTracker::optimal_time_secs(level(5)), 300.0);

    let update = tracker
        .update_skill(&mut model, "biology.genetics", 0.9, level(5), &ActivityMeta::new(300.0))
        .unwrap();

    // base 0.1, x1.2 for optimal pacing, x1.1 for no hints
    assert!((update.learning_rate - 0.1 * 1.2 * 1.1).abs() < 1e-12);
    assert!(update.current > 0.5);
    assert_eq!(model.mastery("biology.genetics"), update.current);
}

#[test]
fn test_low_performance_lowers_mastery() {
    let (tracker, mut model) = setup();
    let update = tracker
        .update_skill(&mut model, "biology.genetics", 0.1, level(3), &ActivityMeta::new(180.0))
        .unwrap();
    assert!(update.current < 0.5);
    assert!(update.delta < 0.0);
}

#[test]
fn test_unknown_skill_is_ignored() {
    let (tracker, mut model) = setup();
    let before = model.skills.len();
    let update = tracker.update_skill(&mut model, "music.jazz", 0.9, level(3), &ActivityMeta::new(180.0));
    assert!(update.is_none());
    assert_eq!(model.skills.len(), before);
}

#[test]
fn test_catalog_skill_created_lazily() {
    let catalog = Arc::new(SkillCatalog::from_skills(vec![SkillId::parse("math.algebra").unwrap()]));
    let config = TrackerConfig::default();
    let tracker = SkillTracker::new(config.clone(), catalog);
    let mut model = UserModel::new("learner", &SkillCatalog::new(), &config);

    let update = tracker.update_skill(&mut model, "math.algebra", 0.8, level(2), &ActivityMeta::new(120.0));
    assert!(update.is_some());
    assert!(model.skill("math.algebra").is_some());
}

#[test]
fn test_trajectory_and_confidence_need_history() {
    let (tracker, mut model) = setup();
    let meta = ActivityMeta::new(120.0);

    let first = tracker.update_skill(&mut model, "biology.genetics", 0.5, level(2), &meta).unwrap();
    assert_eq!(first.confidence, None);
    let state = model.skill("biology.genetics").unwrap();
    assert_eq!(state.trajectory, Trajectory::Unknown);
    assert_eq!(state.confidence, 0.5);
    assert!(feature_vector(state).is_none());

    let mut last = None;
    for performance in [0.6, 0.7, 0.8, 0.9] {
        last = tracker.update_skill(&mut model, "biology.genetics", performance, level(2), &meta);
    }
    let state = model.skill("biology.genetics").unwrap();
    assert_eq!(last.and_then(|u| u.confidence), Some(state.confidence));
    assert_eq!(state.trajectory, Trajectory::Improving);
    assert_ne!(state.confidence, 0.5);
    assert_eq!(feature_vector(state).map(|f| f.len()), Some(5));
}

#[test]
fn test_activity_log_truncates() {
    let (tracker, mut model) = setup();
    for _ in 0..1001 {
        let event = ActivityEvent {
            skill_id: "biology.ecosystems".to_string(),
            performance: 0.7,
            difficulty: level(3),
            meta: ActivityMeta::new(180.0),
        };
        tracker.record_activity(&mut model, &event);
    }
    assert_eq!(model.activity_log.len(), 500);
    assert!(model.aggregates.engagement_score > 0.0);
}
