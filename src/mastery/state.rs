//! Per-skill learner state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::types::{clamp_unit, Difficulty, Trajectory};

/// Lowest confidence a skill estimate can carry
pub const CONFIDENCE_FLOOR: f64 = 0.1;

/// One practice attempt on a skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeRecord {
    pub timestamp: DateTime<Utc>,
    /// Score in [0, 1]
    pub performance: f64,
    pub difficulty: Difficulty,
    /// Seconds spent on the activity
    pub time_spent_secs: f64,
    pub hints_used: u32,
}

/// Mastery estimate for one skill of one learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillState {
    /// Mastery estimate in [0, 1]
    pub current: f64,
    /// Mastery goal in [0, 1]
    pub target: f64,
    /// Confidence in the estimate, [0.1, 1]
    pub confidence: f64,
    pub trajectory: Trajectory,
    /// Smoothed signed mastery change per update
    pub learning_velocity: f64,
    /// Most recent practice records, oldest first
    pub practice_history: VecDeque<PracticeRecord>,
    pub last_practiced: Option<DateTime<Utc>>,
}

impl SkillState {
    pub fn new(initial: f64, target: f64) -> Self {
        Self {
            current: clamp_unit(initial),
            target: clamp_unit(target),
            confidence: 0.5,
            trajectory: Trajectory::Unknown,
            learning_velocity: 0.0,
            practice_history: VecDeque::new(),
            last_practiced: None,
        }
    }

    /// Set mastery, saturating into [0, 1]
    pub fn set_current(&mut self, value: f64) {
        self.current = clamp_unit(value);
    }

    /// Set confidence, saturating into [0.1, 1]
    pub fn set_confidence(&mut self, value: f64) {
        self.confidence = if value.is_nan() {
            CONFIDENCE_FLOOR
        } else {
            value.clamp(CONFIDENCE_FLOOR, 1.0)
        };
    }

    /// Append a record, dropping the oldest beyond `cap`
    pub fn push_record(&mut self, record: PracticeRecord, cap: usize) {
        self.last_practiced = Some(record.timestamp);
        self.practice_history.push_back(record);
        while self.practice_history.len() > cap {
            self.practice_history.pop_front();
        }
    }

    /// Up to `n` most recent records, oldest first
    pub fn recent(&self, n: usize) -> Vec<&PracticeRecord> {
        let skip = self.practice_history.len().saturating_sub(n);
        self.practice_history.iter().skip(skip).collect()
    }

    /// Confidence, or `None` while fewer than `min_samples` records back it
    pub fn confidence_estimate(&self, min_samples: usize) -> Option<f64> {
        (self.practice_history.len() >= min_samples).then_some(self.confidence)
    }

    pub fn is_mastered(&self) -> bool {
        self.current >= self.target
    }

    /// Distance still to cover before the target
    pub fn gap(&self) -> f64 {
        (self.target - self.current).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(performance: f64) -> PracticeRecord {
        PracticeRecord {
            timestamp: Utc::now(),
            performance,
            difficulty: Difficulty::default(),
            time_spent_secs: 60.0,
            hints_used: 0,
        }
    }

    #[test]
    fn test_history_is_fifo_capped() {
        let mut state = SkillState::new(0.5, 0.8);
        for i in 0..25 {
            state.push_record(record(i as f64 / 100.0), 20);
        }
        assert_eq!(state.practice_history.len(), 20);
        assert_eq!(state.practice_history.front().unwrap().performance, 0.05);
        assert_eq!(state.practice_history.back().unwrap().performance, 0.24);
    }

    #[test]
    fn test_setters_saturate() {
        let mut state = SkillState::new(2.0, 0.8);
        assert_eq!(state.current, 1.0);
        state.set_current(-1.0);
        assert_eq!(state.current, 0.0);
        state.set_confidence(0.0);
        assert_eq!(state.confidence, CONFIDENCE_FLOOR);
        state.set_confidence(3.0);
        assert_eq!(state.confidence, 1.0);
    }

    #[test]
    fn test_confidence_estimate_needs_samples() {
        let mut state = SkillState::new(0.5, 0.8);
        state.push_record(record(0.5), 20);
        state.push_record(record(0.6), 20);
        assert_eq!(state.confidence_estimate(3), None);

        state.push_record(record(0.7), 20);
        assert_eq!(state.confidence_estimate(3), Some(0.5));
    }

    #[test]
    fn test_recent_returns_tail() {
        let mut state = SkillState::new(0.5, 0.8);
        for p in [0.1, 0.2, 0.3] {
            state.push_record(record(p), 20);
        }
        let recent: Vec<f64> = state.recent(2).iter().map(|r| r.performance).collect();
        assert_eq!(recent, vec![0.2, 0.3]);
        assert_eq!(state.recent(10).len(), 3);
    }
}
