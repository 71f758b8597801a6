//! Shared types used across modules
//!
//! Small value types that the curriculum, mastery, reasoner and planner
//! modules all speak, kept here to avoid circular dependencies.

use serde::{Deserialize, Serialize};

use crate::error::TutorError;

/// Clamp a value into the unit interval. NaN collapses to 0.0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population variance, `None` for an empty slice
pub fn variance(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    Some(values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64)
}

/// Difficulty level of a topic, concept or activity (1 = easiest, 5 = hardest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Validated constructor
    pub fn new(level: u8) -> Result<Self, TutorError> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(TutorError::InvalidDifficulty(level))
        }
    }

    /// Saturating constructor, used where inputs are already heuristic
    pub fn saturating(level: i64) -> Self {
        Self(level.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = TutorError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Difficulty> for u8 {
    fn from(value: Difficulty) -> Self {
        value.0
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Short-term direction of mastery change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trajectory {
    Improving,
    Declining,
    Stable,
    #[default]
    Unknown,
}

impl std::fmt::Display for Trajectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trajectory::Improving => write!(f, "improving"),
            Trajectory::Declining => write!(f, "declining"),
            Trajectory::Stable => write!(f, "stable"),
            Trajectory::Unknown => write!(f, "unknown"),
        }
    }
}

/// Preferred mix of session activities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningStyle {
    Visual,
    Reading,
    HandsOn,
    #[default]
    Balanced,
}

impl LearningStyle {
    /// Parse from a config or CLI string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "visual" => Some(LearningStyle::Visual),
            "reading" => Some(LearningStyle::Reading),
            "hands_on" | "hands-on" | "kinesthetic" => Some(LearningStyle::HandsOn),
            "balanced" => Some(LearningStyle::Balanced),
            _ => None,
        }
    }
}
