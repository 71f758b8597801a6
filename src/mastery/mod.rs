//! Skill mastery tracking
//!
//! This module owns per-learner skill state:
//! - Per-skill mastery, confidence, trajectory and bounded practice history
//! - The learner model with its activity log and derived aggregates
//! - The adaptive mastery update rule
//! - Feature vectors for the auxiliary performance predictor

pub mod state;
pub mod model;
pub mod tracker;
pub mod features;

pub use state::{PracticeRecord, SkillState, CONFIDENCE_FLOOR};
pub use model::{ActivityEvent, ActivityMeta, ActivityRecord, DerivedAggregates, UserModel};
pub use tracker::{SkillTracker, SkillUpdate};
pub use features::{feature_vector, FeatureVector};
