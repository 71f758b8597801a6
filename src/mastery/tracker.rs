//! Skill mastery tracker
//!
//! Applies practice outcomes to a learner's skill states. The update is a
//! directional rule: performance above 0.5 raises mastery, below 0.5 lowers
//! it, scaled by an adaptive learning rate, the activity difficulty and how
//! efficiently the learner used their time. There is no separate
//! guess/slip model.
//!
//! Every numeric step saturates; nothing here returns an error.

use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

use super::model::{ActivityEvent, ActivityMeta, ActivityRecord, UserModel};
use super::state::{PracticeRecord, SkillState};
use crate::config::TrackerConfig;
use crate::curriculum::{SkillCatalog, SkillId};
use crate::types::{clamp_unit, mean, variance, Difficulty, Trajectory};

/// Seconds of optimal practice per difficulty level
const OPTIMAL_SECS_PER_LEVEL: f64 = 60.0;
/// Per-step growth of the recency weights used for confidence
const RECENCY_GROWTH: f64 = 1.2;
/// Smoothing for the learning velocity
const VELOCITY_SMOOTHING: f64 = 0.3;

/// Result of applying one practice outcome
#[derive(Debug, Clone, PartialEq)]
pub struct SkillUpdate {
    pub skill_id: SkillId,
    pub previous: f64,
    pub current: f64,
    pub delta: f64,
    pub learning_rate: f64,
    /// `None` until enough practice records back an estimate
    pub confidence: Option<f64>,
    pub trajectory: Trajectory,
}

/// Owns the mastery update rule; one instance per engine
#[derive(Debug, Clone)]
pub struct SkillTracker {
    config: TrackerConfig,
    catalog: Arc<SkillCatalog>,
}

impl SkillTracker {
    pub fn new(config: TrackerConfig, catalog: Arc<SkillCatalog>) -> Self {
        Self { config, catalog }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Time the activity "should" take at this difficulty
    pub fn optimal_time_secs(difficulty: Difficulty) -> f64 {
        difficulty.as_f64() * OPTIMAL_SECS_PER_LEVEL
    }

    fn time_ratio(difficulty: Difficulty, time_spent_secs: f64) -> f64 {
        let ratio = time_spent_secs.max(0.0) / Self::optimal_time_secs(difficulty);
        if ratio.is_finite() { ratio } else { 0.0 }
    }

    /// Learning rate after the mastery, pacing and hint multipliers
    pub fn adaptive_learning_rate(&self, current: f64, difficulty: Difficulty, meta: &ActivityMeta) -> f64 {
        let mut rate = self.config.base_learning_rate;

        if current < 0.3 {
            rate *= 1.5;
        } else if current > 0.8 {
            rate *= 0.7;
        }

        let ratio = Self::time_ratio(difficulty, meta.time_spent_secs);
        if (0.5..=1.5).contains(&ratio) {
            rate *= 1.2;
        }

        if meta.hints_used == 0 {
            rate *= 1.1;
        }

        rate
    }

    /// Reward for time spent close to the optimal time
    pub fn time_efficiency_factor(difficulty: Difficulty, time_spent_secs: f64) -> f64 {
        let ratio = Self::time_ratio(difficulty, time_spent_secs);
        if (0.7..=1.3).contains(&ratio) {
            1.1
        } else if (0.5..=1.5).contains(&ratio) {
            1.0
        } else if !(0.3..=2.0).contains(&ratio) {
            0.8
        } else {
            0.9
        }
    }

    /// Apply one practice outcome to a skill.
    ///
    /// The id is normalized first, so `Biology.Genetics` and
    /// `biology.genetics` name the same skill. Skills missing from the model
    /// but present in the catalog are created on first reference. Skills unknown to the catalog are ignored and
    /// `None` is returned.
    pub fn update_skill(
        &self,
        model: &mut UserModel,
        skill_id: &str,
        performance: f64,
        difficulty: Difficulty,
        meta: &ActivityMeta,
    ) -> Option<SkillUpdate> {
        let Ok(id) = SkillId::parse(skill_id) else {
            debug!("Ignoring practice on malformed skill id '{}'", skill_id);
            return None;
        };
        if !model.skills.contains_key(&id) {
            if !self.catalog.contains(id.as_str()) {
                debug!("Ignoring practice on unknown skill '{}'", id);
                return None;
            }
            model.skills.insert(
                id.clone(),
                SkillState::new(self.config.initial_mastery, self.config.default_target),
            );
        }

        let performance = clamp_unit(performance);
        let state = model.skills.get_mut(&id)?;
        let previous = state.current;

        let learning_rate = self.adaptive_learning_rate(previous, difficulty, meta);
        let difficulty_factor = difficulty.as_f64() / Difficulty::MAX as f64;
        let efficiency = Self::time_efficiency_factor(difficulty, meta.time_spent_secs);

        let delta = (performance - 0.5) * learning_rate * difficulty_factor * efficiency;
        state.set_current(previous + delta);
        let applied = state.current - previous;
        state.learning_velocity =
            state.learning_velocity * (1.0 - VELOCITY_SMOOTHING) + applied * VELOCITY_SMOOTHING;

        state.push_record(
            PracticeRecord {
                timestamp: meta.timestamp,
                performance,
                difficulty,
                time_spent_secs: meta.time_spent_secs.max(0.0),
                hints_used: meta.hints_used,
            },
            self.config.history_cap,
        );

        if let Some(confidence) = self.compute_confidence(state) {
            state.set_confidence(confidence);
        }
        state.trajectory = self.compute_trajectory(state);

        let update = SkillUpdate {
            skill_id: id,
            previous,
            current: state.current,
            delta: applied,
            learning_rate,
            confidence: state.confidence_estimate(self.config.min_confidence_samples),
            trajectory: state.trajectory,
        };

        model.updated_at = Utc::now();
        model.refresh_aggregates(meta.timestamp.max(model.updated_at));

        debug!(
            "Skill {} updated {:.3} -> {:.3} (rate {:.3}, {})",
            update.skill_id, update.previous, update.current, update.learning_rate, update.trajectory
        );

        Some(update)
    }

    /// Apply an activity event and log it on the model
    pub fn record_activity(&self, model: &mut UserModel, event: &ActivityEvent) -> Option<SkillUpdate> {
        let update = self.update_skill(
            model,
            &event.skill_id,
            event.performance,
            event.difficulty,
            &event.meta,
        )?;

        model.log_activity(
            ActivityRecord {
                id: uuid::Uuid::new_v4().to_string(),
                skill_id: update.skill_id.clone(),
                performance: clamp_unit(event.performance),
                difficulty: event.difficulty,
                time_spent_secs: event.meta.time_spent_secs.max(0.0),
                hints_used: event.meta.hints_used,
                topic_id: event.meta.topic_id.clone(),
                timestamp: event.meta.timestamp,
            },
            self.config.activity_log_cap,
            self.config.activity_log_keep,
        );
        model.refresh_aggregates(Utc::now());

        Some(update)
    }

    /// `(1 - variance) * recency-weighted mean performance` over the recent
    /// window; `None` while there are too few records
    pub fn compute_confidence(&self, state: &SkillState) -> Option<f64> {
        let recent = state.recent(self.config.confidence_window);
        if recent.len() < self.config.min_confidence_samples {
            return None;
        }

        let performances: Vec<f64> = recent.iter().map(|r| r.performance).collect();
        let spread = variance(&performances)?;

        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        let mut weight = 1.0;
        for p in &performances {
            weighted += p * weight;
            total_weight += weight;
            weight *= RECENCY_GROWTH;
        }
        let recency_weight = weighted / total_weight;

        Some((1.0 - spread) * recency_weight)
    }

    /// Mean of consecutive performance deltas across the recent window
    pub fn compute_trajectory(&self, state: &SkillState) -> Trajectory {
        let recent = state.recent(self.config.confidence_window);
        if recent.len() < 2 {
            return Trajectory::Unknown;
        }

        let deltas: Vec<f64> = recent.windows(2)
            .map(|pair| pair[1].performance - pair[0].performance)
            .collect();

        match mean(&deltas) {
            Some(d) if d > self.config.trajectory_threshold => Trajectory::Improving,
            Some(d) if d < -self.config.trajectory_threshold => Trajectory::Declining,
            Some(_) => Trajectory::Stable,
            None => Trajectory::Unknown,
        }
    }
}
