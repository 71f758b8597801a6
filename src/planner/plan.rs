//! Plan, session and milestone types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TutorError;
use crate::types::{Difficulty, LearningStyle};

/// Lifecycle of a candidate plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanState {
    #[default]
    Draft,
    Scored,
    Selected,
    Scheduled,
    Discarded,
}

impl PlanState {
    pub fn can_transition_to(self, next: PlanState) -> bool {
        matches!(
            (self, next),
            (PlanState::Draft, PlanState::Scored)
                | (PlanState::Scored, PlanState::Selected)
                | (PlanState::Scored, PlanState::Discarded)
                | (PlanState::Selected, PlanState::Scheduled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PlanState::Scheduled | PlanState::Discarded)
    }
}

impl std::fmt::Display for PlanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanState::Draft => write!(f, "draft"),
            PlanState::Scored => write!(f, "scored"),
            PlanState::Selected => write!(f, "selected"),
            PlanState::Scheduled => write!(f, "scheduled"),
            PlanState::Discarded => write!(f, "discarded"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Short review of prerequisite material
    Review,
    Reading,
    VisualOverview,
    Practice,
    Quiz,
    Project,
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityKind::Review => write!(f, "review"),
            ActivityKind::Reading => write!(f, "reading"),
            ActivityKind::VisualOverview => write!(f, "visual overview"),
            ActivityKind::Practice => write!(f, "practice"),
            ActivityKind::Quiz => write!(f, "quiz"),
            ActivityKind::Project => write!(f, "project"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub kind: ActivityKind,
    pub minutes: u32,
}

/// One study session bound to a single topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub topic_id: String,
    pub topic_name: String,
    pub activities: Vec<Activity>,
    pub prerequisites: Vec<String>,
    pub objectives: Vec<String>,
    /// Difficulty-adjusted duration
    pub duration_minutes: u32,
    pub difficulty: Difficulty,
    /// Heuristic expected mastery gain, [0, 1]
    pub expected_improvement: f64,
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    /// 1-based index of the session that completes this milestone
    pub after_session: usize,
    pub title: String,
    /// Topics covered up to and including this milestone
    pub topics: Vec<String>,
    #[serde(default)]
    pub target_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Personalization {
    pub learning_style: LearningStyle,
    pub focus_weaknesses: bool,
    pub reinforce_strengths: bool,
}

/// Runtime adaptation hints attached to the selected plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptiveElements {
    pub checkpoint_every_sessions: usize,
    /// Raise difficulty when checkpoint performance exceeds this
    pub increase_difficulty_above: f64,
    /// Lower difficulty when checkpoint performance falls below this
    pub decrease_difficulty_below: f64,
    pub personalization: Personalization,
}

/// An ordered, time-boxed sequence of sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub user_id: String,
    /// Name of the strategy that produced the plan
    pub strategy: String,
    pub sessions: Vec<Session>,
    pub total_time: u32,
    pub budget: u32,
    pub state: PlanState,
    pub score: Option<f64>,
    /// Mean confidence of the learner's skills the plan touches
    pub confidence: f64,
    /// Share of current weaknesses that some session addresses
    pub weakness_coverage: f64,
    pub milestones: Vec<Milestone>,
    pub adaptive: Option<AdaptiveElements>,
    /// Predicted performance on the first session, when a predictor answered
    pub ml_recommendation: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Plan {
    pub fn new(user_id: &str, strategy: &str, budget: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            strategy: strategy.to_string(),
            sessions: Vec::new(),
            total_time: 0,
            budget,
            state: PlanState::Draft,
            score: None,
            confidence: 0.0,
            weakness_coverage: 0.0,
            milestones: Vec::new(),
            adaptive: None,
            ml_recommendation: None,
            created_at: Utc::now(),
        }
    }

    /// Minutes left before the budget is exhausted
    pub fn remaining(&self) -> u32 {
        self.budget.saturating_sub(self.total_time)
    }

    /// Append a session if it fits the budget
    pub fn try_push(&mut self, session: Session) -> bool {
        if session.duration_minutes > self.remaining() {
            return false;
        }
        self.total_time += session.duration_minutes;
        self.sessions.push(session);
        true
    }

    pub fn contains(&self, topic_id: &str) -> bool {
        self.sessions.iter().any(|s| s.topic_id == topic_id)
    }

    pub fn topic_ids(&self) -> Vec<&str> {
        self.sessions.iter().map(|s| s.topic_id.as_str()).collect()
    }

    pub fn mean_expected_improvement(&self) -> f64 {
        if self.sessions.is_empty() {
            return 0.0;
        }
        self.sessions.iter().map(|s| s.expected_improvement).sum::<f64>() / self.sessions.len() as f64
    }

    /// Share of the budget in use; an empty budget counts as fully used
    pub fn time_utilization(&self) -> f64 {
        if self.budget == 0 {
            return 1.0;
        }
        self.total_time as f64 / self.budget as f64
    }

    pub fn transition_to(&mut self, next: PlanState) -> Result<(), TutorError> {
        if !self.state.can_transition_to(next) {
            return Err(TutorError::IllegalTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        Ok(())
    }
}
