//! Boundary validation errors
//!
//! The core operations never fail on data quality; these errors are raised
//! only when input is rejected at ingestion (curriculum files, CLI/engine calls).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TutorError {
    #[error("difficulty {0} is outside 1-5")]
    InvalidDifficulty(u8),

    #[error("performance {0} is outside 0.0-1.0")]
    InvalidPerformance(f64),

    #[error("unknown skill id '{0}'")]
    UnknownSkill(String),

    #[error("unknown topic id '{0}'")]
    UnknownTopic(String),

    #[error("malformed skill id '{0}': expected 'category.skill'")]
    MalformedSkillId(String),

    #[error("illegal plan transition from {from} to {to}")]
    IllegalTransition { from: String, to: String },

    #[error("curriculum error: {0}")]
    Curriculum(String),
}
