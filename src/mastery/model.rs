//! Learner model: skill states, activity log and derived aggregates

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::state::SkillState;
use crate::config::TrackerConfig;
use crate::curriculum::{SkillCatalog, SkillId};
use crate::types::{mean, Difficulty};

/// Skills at or above this mastery count as strengths
pub const STRENGTH_THRESHOLD: f64 = 0.8;
/// Skills below this mastery count as weaknesses
pub const WEAKNESS_THRESHOLD: f64 = 0.4;
/// Window used for the engagement score
const ENGAGEMENT_WINDOW_DAYS: i64 = 7;

/// Metadata that accompanies a practice outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityMeta {
    /// Seconds spent on the activity
    pub time_spent_secs: f64,
    #[serde(default)]
    pub hints_used: u32,
    /// Free-form activity kind ("quiz", "exercise", ...)
    #[serde(default)]
    pub activity_type: Option<String>,
    /// Topic the activity belonged to, if any
    #[serde(default)]
    pub topic_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ActivityMeta {
    pub fn new(time_spent_secs: f64) -> Self {
        Self {
            time_spent_secs,
            hints_used: 0,
            activity_type: None,
            topic_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_hints(mut self, hints_used: u32) -> Self {
        self.hints_used = hints_used;
        self
    }

    pub fn with_topic(mut self, topic_id: &str) -> Self {
        self.topic_id = Some(topic_id.to_string());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// A practice-activity event as it arrives from the outside
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub skill_id: String,
    pub performance: f64,
    pub difficulty: Difficulty,
    pub meta: ActivityMeta,
}

/// Entry in the learner's activity log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: String,
    pub skill_id: SkillId,
    pub performance: f64,
    pub difficulty: Difficulty,
    pub time_spent_secs: f64,
    pub hints_used: u32,
    pub topic_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Aggregates derived from skill states; recomputed, never stored
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedAggregates {
    /// Mean mastery across all skills
    pub overall_ability: f64,
    /// Skills at or above the strength threshold, strongest first
    pub strengths: Vec<SkillId>,
    /// Skills below the weakness threshold, weakest first
    pub weaknesses: Vec<SkillId>,
    /// (skill, target - current) for skills short of target, largest gap first
    pub skill_gaps: Vec<(SkillId, f64)>,
    /// Recent activity volume and quality, [0, 1]
    pub engagement_score: f64,
}

/// Everything the engine knows about one learner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserModel {
    pub user_id: String,
    pub skills: BTreeMap<SkillId, SkillState>,
    pub activity_log: Vec<ActivityRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub aggregates: DerivedAggregates,
}

impl UserModel {
    /// Fresh model with every catalog skill seeded at the initial mastery
    pub fn new(user_id: &str, catalog: &SkillCatalog, config: &TrackerConfig) -> Self {
        let skills = catalog.iter()
            .map(|id| (id.clone(), SkillState::new(config.initial_mastery, config.default_target)))
            .collect();

        let now = Utc::now();
        let mut model = Self {
            user_id: user_id.to_string(),
            skills,
            activity_log: Vec::new(),
            created_at: now,
            updated_at: now,
            aggregates: DerivedAggregates::default(),
        };
        model.refresh_aggregates(now);
        model
    }

    pub fn skill(&self, skill_id: &str) -> Option<&SkillState> {
        self.skills.get(skill_id)
    }

    /// Mastery of a skill; unknown skills read as 0.0
    pub fn mastery(&self, skill_id: &str) -> f64 {
        self.skills.get(skill_id).map(|s| s.current).unwrap_or(0.0)
    }

    /// Mean mastery over a set of skills; `None` when the set is empty
    pub fn average_mastery<'a, I>(&self, skill_ids: I) -> Option<f64>
    where
        I: IntoIterator<Item = &'a SkillId>,
    {
        let values: Vec<f64> = skill_ids.into_iter().map(|id| self.mastery(id.as_str())).collect();
        mean(&values)
    }

    /// Seed skills that joined the catalog after this model was created
    pub fn sync_catalog(&mut self, catalog: &SkillCatalog, config: &TrackerConfig) -> usize {
        let mut added = 0;
        for id in catalog.iter() {
            if !self.skills.contains_key(id) {
                self.skills.insert(id.clone(), SkillState::new(config.initial_mastery, config.default_target));
                added += 1;
            }
        }
        added
    }

    /// Append to the activity log, truncating to the most recent `keep`
    /// entries once `cap` is exceeded
    pub fn log_activity(&mut self, record: ActivityRecord, cap: usize, keep: usize) {
        self.activity_log.push(record);
        if self.activity_log.len() > cap {
            let drop = self.activity_log.len() - keep.min(cap);
            self.activity_log.drain(..drop);
        }
    }

    /// Recompute strengths, weaknesses, gaps, ability and engagement
    pub fn refresh_aggregates(&mut self, now: DateTime<Utc>) {
        let masteries: Vec<f64> = self.skills.values().map(|s| s.current).collect();
        let overall_ability = mean(&masteries).unwrap_or(0.0);

        let mut strengths: Vec<(&SkillId, f64)> = self.skills.iter()
            .filter(|(_, s)| s.current >= STRENGTH_THRESHOLD)
            .map(|(id, s)| (id, s.current))
            .collect();
        strengths.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut weaknesses: Vec<(&SkillId, f64)> = self.skills.iter()
            .filter(|(_, s)| s.current < WEAKNESS_THRESHOLD)
            .map(|(id, s)| (id, s.current))
            .collect();
        weaknesses.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut skill_gaps: Vec<(SkillId, f64)> = self.skills.iter()
            .filter(|(_, s)| s.current < s.target)
            .map(|(id, s)| (id.clone(), s.gap()))
            .collect();
        skill_gaps.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let window_start = now - Duration::days(ENGAGEMENT_WINDOW_DAYS);
        let recent: Vec<f64> = self.activity_log.iter()
            .filter(|a| a.timestamp >= window_start)
            .map(|a| a.performance)
            .collect();
        let volume = (recent.len() as f64 / 10.0).min(1.0);
        let quality = mean(&recent).unwrap_or(0.0);

        self.aggregates = DerivedAggregates {
            overall_ability,
            strengths: strengths.into_iter().map(|(id, _)| id.clone()).collect(),
            weaknesses: weaknesses.into_iter().map(|(id, _)| id.clone()).collect(),
            skill_gaps,
            engagement_score: volume * 0.6 + quality * 0.4,
        };
    }
}
