//! Feature extraction for the auxiliary performance predictor
//!
//! Order is fixed: [mean recent performance, mean recent time spent,
//! mean recent difficulty, recent success rate, last delta].

use super::state::SkillState;
use crate::types::mean;

/// Number of recent records the features summarize
pub const FEATURE_WINDOW: usize = 5;
/// Performance at or above this counts as a success
pub const SUCCESS_THRESHOLD: f64 = 0.7;

pub type FeatureVector = [f64; 5];

/// Build the predictor input for one skill.
///
/// Time is expressed in tens of minutes and difficulty divided by 5 so every
/// feature sits roughly in [0, 1]. `None` with fewer than two records, since
/// the last delta is undefined.
pub fn feature_vector(state: &SkillState) -> Option<FeatureVector> {
    let recent = state.recent(FEATURE_WINDOW);
    if recent.len() < 2 {
        return None;
    }

    let performances: Vec<f64> = recent.iter().map(|r| r.performance).collect();
    let times: Vec<f64> = recent.iter().map(|r| r.time_spent_secs / 600.0).collect();
    let difficulties: Vec<f64> = recent.iter().map(|r| r.difficulty.as_f64() / 5.0).collect();
    let successes = performances.iter().filter(|p| **p >= SUCCESS_THRESHOLD).count();

    let last = performances[performances.len() - 1];
    let previous = performances[performances.len() - 2];

    Some([
        mean(&performances)?,
        mean(&times)?,
        mean(&difficulties)?,
        successes as f64 / performances.len() as f64,
        last - previous,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mastery::state::PracticeRecord;
    use crate::types::Difficulty;
    use chrono::Utc;

    fn push(state: &mut SkillState, performance: f64, secs: f64, level: u8) {
        state.push_record(
            PracticeRecord {
                timestamp: Utc::now(),
                performance,
                difficulty: Difficulty::new(level).unwrap(),
                time_spent_secs: secs,
                hints_used: 0,
            },
            20,
        );
    }

    #[test]
    fn test_requires_two_records() {
        let mut state = SkillState::new(0.5, 0.8);
        assert!(feature_vector(&state).is_none());
        push(&mut state, 0.5, 60.0, 1);
        assert!(feature_vector(&state).is_none());
    }

    #[test]
    fn test_feature_order() {
        let mut state = SkillState::new(0.5, 0.8);
        push(&mut state, 0.4, 300.0, 5);
        push(&mut state, 0.8, 900.0, 5);

        let f = feature_vector(&state).unwrap();
        assert!((f[0] - 0.6).abs() < 1e-12);
        assert!((f[1] - 1.0).abs() < 1e-12);
        assert!((f[2] - 1.0).abs() < 1e-12);
        assert!((f[3] - 0.5).abs() < 1e-12);
        assert!((f[4] - 0.4).abs() < 1e-12);
    }
}
