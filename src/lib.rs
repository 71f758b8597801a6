//! Adaptive Tutor - mastery tracking and learning path planning
//!
//! An adaptive tutoring engine with:
//! - Per-skill mastery tracking driven by practice outcomes
//! - Curriculum graphs with cycle-safe prerequisite resolution
//! - A forward-chaining reasoner over concepts and relationships
//! - Multi-strategy, time-boxed learning plans with scheduling
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use adaptive_tutor::{Config, TutorEngine};
//! use adaptive_tutor::curriculum::sample_curriculum;
//! use adaptive_tutor::store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = TutorEngine::new(
//!         Config::default(),
//!         Arc::new(sample_curriculum()),
//!         Arc::new(MemoryStore::new()),
//!     );
//!     let plan = engine.plan("ada", false).await?;
//!     println!("{} sessions", plan.sessions.len());
//!     Ok(())
//! }
//! ```

// Core modules
pub mod types;
pub mod error;
pub mod config;
pub mod curriculum;
pub mod mastery;
pub mod reasoner;
pub mod planner;
pub mod scheduler;

// Collaborators and entry points
pub mod predictor;
pub mod store;
pub mod engine;
pub mod cli;

pub use config::Config;
pub use curriculum::{CurriculumGraph, SkillCatalog, SkillId, Topic};
pub use engine::{ActivityOutcome, TutorEngine};
pub use error::TutorError;
pub use mastery::{ActivityEvent, ActivityMeta, SkillState, SkillTracker, UserModel};
pub use planner::{LearningPathPlanner, Plan, PlanState, PlanningContext};
pub use reasoner::{KnowledgeBase, KnowledgeReasoner, ReasoningConclusion};
pub use scheduler::PlanScheduler;
pub use types::{Difficulty, LearningStyle, Trajectory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
