//! Configuration management
//!
//! Manages engine configuration: tracker tuning, planner budgets,
//! reasoner thresholds, predictor timeout and store location.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::LearningStyle;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Skill mastery tracker tuning
    #[serde(default)]
    pub tracker: TrackerConfig,
    /// Learning path planner settings
    #[serde(default)]
    pub planner: PlannerConfig,
    /// Knowledge reasoner thresholds
    #[serde(default)]
    pub reasoner: ReasonerConfig,
    /// Auxiliary performance predictor
    #[serde(default)]
    pub predictor: PredictorConfig,
    /// Durable store location
    #[serde(default)]
    pub store: StoreConfig,
    /// Curriculum source
    #[serde(default)]
    pub curriculum: CurriculumConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Learning rate before adaptive multipliers
    #[serde(default = "default_base_learning_rate")]
    pub base_learning_rate: f64,
    /// Practice records kept per skill
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,
    /// Records considered for confidence and trajectory
    #[serde(default = "default_confidence_window")]
    pub confidence_window: usize,
    /// Fewer records than this leaves confidence untouched
    #[serde(default = "default_min_confidence_samples")]
    pub min_confidence_samples: usize,
    /// Mean delta beyond which the trajectory is improving/declining
    #[serde(default = "default_trajectory_threshold")]
    pub trajectory_threshold: f64,
    /// Default mastery target for new skills
    #[serde(default = "default_target")]
    pub default_target: f64,
    /// Mastery seeded for every catalog skill
    #[serde(default = "default_initial_mastery")]
    pub initial_mastery: f64,
    /// Activity log size that triggers truncation
    #[serde(default = "default_activity_log_cap")]
    pub activity_log_cap: usize,
    /// Activity log size after truncation
    #[serde(default = "default_activity_log_keep")]
    pub activity_log_keep: usize,
}

fn default_base_learning_rate() -> f64 {
    0.1
}

fn default_history_cap() -> usize {
    20
}

fn default_confidence_window() -> usize {
    5
}

fn default_min_confidence_samples() -> usize {
    3
}

fn default_trajectory_threshold() -> f64 {
    0.05
}

fn default_target() -> f64 {
    0.8
}

fn default_initial_mastery() -> f64 {
    0.5
}

fn default_activity_log_cap() -> usize {
    1000
}

fn default_activity_log_keep() -> usize {
    500
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_learning_rate: default_base_learning_rate(),
            history_cap: default_history_cap(),
            confidence_window: default_confidence_window(),
            min_confidence_samples: default_min_confidence_samples(),
            trajectory_threshold: default_trajectory_threshold(),
            default_target: default_target(),
            initial_mastery: default_initial_mastery(),
            activity_log_cap: default_activity_log_cap(),
            activity_log_keep: default_activity_log_keep(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Minutes available per session
    #[serde(default = "default_time_available")]
    pub time_available_minutes: u32,
    /// Sessions per week
    #[serde(default = "default_sessions_per_week")]
    pub sessions_per_week: u32,
    /// Prerequisite skill mastery needed before a topic is suitable
    #[serde(default = "default_prerequisite_threshold")]
    pub prerequisite_threshold: f64,
    /// Topic skills at or above this are treated as mastered
    #[serde(default = "default_mastered_threshold")]
    pub mastered_threshold: f64,
    /// Hard-constraint prerequisite mastery for constraint satisfaction
    #[serde(default = "default_constraint_prerequisite_threshold")]
    pub constraint_prerequisite_threshold: f64,
    /// Minimum soft-constraint score for a session to be accepted
    #[serde(default = "default_soft_constraint_min")]
    pub soft_constraint_min: f64,
    /// Learner's preferred activity mix
    #[serde(default)]
    pub learning_style: LearningStyle,
}

fn default_time_available() -> u32 {
    60
}

fn default_sessions_per_week() -> u32 {
    3
}

fn default_prerequisite_threshold() -> f64 {
    0.7
}

fn default_mastered_threshold() -> f64 {
    0.8
}

fn default_constraint_prerequisite_threshold() -> f64 {
    0.6
}

fn default_soft_constraint_min() -> f64 {
    0.6
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            time_available_minutes: default_time_available(),
            sessions_per_week: default_sessions_per_week(),
            prerequisite_threshold: default_prerequisite_threshold(),
            mastered_threshold: default_mastered_threshold(),
            constraint_prerequisite_threshold: default_constraint_prerequisite_threshold(),
            soft_constraint_min: default_soft_constraint_min(),
            learning_style: LearningStyle::default(),
        }
    }
}

impl PlannerConfig {
    /// Weekly time budget in minutes
    pub fn weekly_budget(&self) -> u32 {
        self.time_available_minutes.saturating_mul(self.sessions_per_week)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonerConfig {
    /// Weight of inferred domain_related edges
    #[serde(default = "default_domain_edge_weight")]
    pub domain_edge_weight: f64,
    /// Gap between concept difficulty and learner level that triggers a recommendation
    #[serde(default = "default_difficulty_gap")]
    pub difficulty_gap: f64,
    /// Ceiling for reasoning confidence
    #[serde(default = "default_max_confidence")]
    pub max_confidence: f64,
}

fn default_domain_edge_weight() -> f64 {
    0.4
}

fn default_difficulty_gap() -> f64 {
    1.5
}

fn default_max_confidence() -> f64 {
    0.95
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            domain_edge_weight: default_domain_edge_weight(),
            difficulty_gap: default_difficulty_gap(),
            max_confidence: default_max_confidence(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Inference timeout; on expiry the prediction is treated as absent
    #[serde(default = "default_predictor_timeout")]
    pub timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_predictor_timeout() -> u64 {
    250
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: default_predictor_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path (defaults to <data_dir>/tutor.db)
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

impl StoreConfig {
    pub fn resolved_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("tutor.db")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurriculumConfig {
    /// TOML or JSON curriculum file; the built-in sample is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_path = config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let config: Config = toml::from_str(&contents)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = config_path()?;
        let parent = config_path.parent()
            .context("Config path has no parent")?;

        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "adaptive-tutor", "adaptive-tutor")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "adaptive-tutor", "adaptive-tutor")
        .context("Failed to get project directories")?;
    Ok(base.data_dir().to_path_buf())
}

/// Show current configuration
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Configuration ({})", config_path()?.display());
    println!();
    println!("Tracker:");
    println!("  base learning rate:   {}", config.tracker.base_learning_rate);
    println!("  history cap:          {}", config.tracker.history_cap);
    println!("  default target:       {}", config.tracker.default_target);
    println!("Planner:");
    println!("  minutes per session:  {}", config.planner.time_available_minutes);
    println!("  sessions per week:    {}", config.planner.sessions_per_week);
    println!("  learning style:       {:?}", config.planner.learning_style);
    println!("Reasoner:");
    println!("  domain edge weight:   {}", config.reasoner.domain_edge_weight);
    println!("  difficulty gap:       {}", config.reasoner.difficulty_gap);
    println!("Predictor:");
    println!("  enabled:              {}", config.predictor.enabled);
    println!("  timeout:              {}ms", config.predictor.timeout_ms);
    println!("Store:");
    println!("  database:             {}", config.store.resolved_path()?.display());
    match &config.curriculum.path {
        Some(path) => println!("Curriculum:             {}", path.display()),
        None => println!("Curriculum:             built-in sample"),
    }

    Ok(())
}

/// Reset configuration to defaults
pub fn reset_config() -> Result<()> {
    let config = Config::default();
    config.save()?;
    println!("Configuration reset to defaults.");
    Ok(())
}

/// Get default configuration as TOML string
pub fn default_config_toml() -> String {
    let config = Config::default();
    toml::to_string_pretty(&config).unwrap_or_else(|_| "# Default configuration\n".to_string())
}
