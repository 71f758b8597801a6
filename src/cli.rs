//! CLI interface for adaptive-tutor

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{self, Config};
use crate::curriculum::load_curriculum;
use crate::engine::TutorEngine;
use crate::mastery::{ActivityEvent, ActivityMeta};
use crate::planner::Plan;
use crate::predictor::{HeuristicPredictor, NullPredictor, PerformancePredictor};
use crate::store::{SqliteStore, TopicStore};
use crate::types::Difficulty;

#[derive(Parser)]
#[command(name = "adaptive-tutor")]
#[command(about = "Adaptive tutoring engine: mastery tracking, learning plans and curriculum reasoning", long_about = None)]
#[command(version)]
struct Cli {
    /// Curriculum file (TOML or JSON), overrides the configured one
    #[arg(long, global = true, env = "TUTOR_CURRICULUM")]
    curriculum: Option<PathBuf>,

    /// Database path, overrides the configured one
    #[arg(long, global = true, env = "TUTOR_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List curriculum topics
    Topics {
        /// Also report dangling prerequisites and cycles
        #[arg(long)]
        validate: bool,
    },
    /// Show the full prerequisite chain of a topic
    Prereqs {
        topic: String,
    },
    /// Record a practice outcome for a learner
    Record {
        user: String,
        /// Skill id, e.g. biology.genetics
        skill: String,
        /// Performance between 0.0 and 1.0
        performance: f64,
        /// Difficulty 1-5
        #[arg(short, long, default_value_t = 3)]
        difficulty: u8,
        /// Time spent in seconds
        #[arg(short, long, default_value_t = 180.0)]
        time: f64,
        /// Hints used
        #[arg(long, default_value_t = 0)]
        hints: u32,
        /// Topic the activity belongs to
        #[arg(long)]
        topic: Option<String>,
    },
    /// Show a learner's mastery and ready topics
    Status {
        user: String,
    },
    /// Build a learning plan for a learner
    Plan {
        user: String,
        /// Date the sessions starting now
        #[arg(short, long)]
        schedule: bool,
        /// Let the reasoner's difficulty recommendations shape sessions
        #[arg(short, long)]
        reasoning: bool,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ask a question about the curriculum
    Reason {
        user: String,
        /// The question
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
        /// Print the default configuration
        #[arg(long)]
        default: bool,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { show, reset, default } = &cli.command {
        if *reset {
            config::reset_config()?;
        } else if *default {
            print!("{}", config::default_config_toml());
        } else if *show {
            config::show_config()?;
        } else {
            println!("Config file: {}", config::config_path()?.display());
            println!("Use --show, --reset or --default.");
        }
        return Ok(());
    }

    let mut config = Config::load()?;
    if let Some(path) = cli.curriculum {
        config.curriculum.path = Some(path);
    }
    if let Some(path) = cli.db {
        config.store.database_path = Some(path);
    }

    let engine = build_engine(config).await?;

    match cli.command {
        Commands::Topics { validate } => list_topics(&engine, validate),
        Commands::Prereqs { topic } => show_prerequisites(&engine, &topic)?,
        Commands::Record { user, skill, performance, difficulty, time, hints, topic } => {
            let mut meta = ActivityMeta::new(time).with_hints(hints);
            if let Some(topic) = &topic {
                meta = meta.with_topic(topic);
            }
            let event = ActivityEvent {
                skill_id: skill,
                performance,
                difficulty: Difficulty::new(difficulty)?,
                meta,
            };

            let outcome = engine.record_activity(&user, event).await?;
            match outcome.update {
                Some(update) => {
                    let confidence = update.confidence
                        .map(|c| format!("{:.2}", c))
                        .unwrap_or_else(|| "unknown".to_string());
                    println!(
                        "{}: {:.3} -> {:.3} ({:+.3}), confidence {}, {}",
                        update.skill_id,
                        update.previous,
                        update.current,
                        update.delta,
                        confidence,
                        update.trajectory
                    );
                    if !outcome.persisted {
                        println!("Warning: update was not saved.");
                    }
                    if let Some(prediction) = outcome.prediction {
                        println!("Predicted next performance: {:.2}", prediction);
                    }
                }
                None => println!("Skill not tracked; nothing recorded."),
            }
        }
        Commands::Status { user } => show_status(&engine, &user).await,
        Commands::Plan { user, schedule, reasoning, json } => {
            let plan = if schedule {
                engine.plan_and_schedule(&user, reasoning, Utc::now()).await?
            } else {
                engine.plan(&user, reasoning).await?
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print_plan(&plan);
            }
        }
        Commands::Reason { user, query } => {
            let conclusion = engine.reason(&user, &query.join(" ")).await;
            println!("{}", conclusion.answer);
            println!("  question type: {:?}", conclusion.question_type);
            println!("  confidence:    {:.2}", conclusion.confidence);
            if !conclusion.evidence.is_empty() {
                println!("  evidence:");
                for tag in &conclusion.evidence {
                    println!("    - {}", tag);
                }
            }
        }
        // handled before the engine is built
        Commands::Config { .. } => {}
    }

    Ok(())
}

async fn build_engine(config: Config) -> Result<TutorEngine> {
    let graph = load_curriculum(&config.curriculum).context("Failed to load curriculum")?;
    let store = SqliteStore::new(config.store.resolved_path()?).await?;

    // stored topics mirror the curriculum in use
    let stored = store.list_topics().await?;
    if stored.iter().map(|t| t.id.as_str()).ne(graph.topics().iter().map(|t| t.id.as_str())) {
        store.seed_topics(graph.topics()).await?;
    }

    let predictor: Arc<dyn PerformancePredictor> = if config.predictor.enabled {
        Arc::new(HeuristicPredictor::default())
    } else {
        Arc::new(NullPredictor)
    };

    Ok(TutorEngine::new(config, Arc::new(graph), Arc::new(store))
        .with_predictor(predictor)
        .with_strict_skills(true))
}

fn list_topics(engine: &TutorEngine, validate: bool) {
    let graph = engine.graph();
    println!("{} topics, {} skills", graph.len(), graph.catalog().len());
    for topic in graph.topics() {
        let prereqs = if topic.prerequisites.is_empty() {
            "-".to_string()
        } else {
            topic.prerequisites.join(", ")
        };
        println!(
            "  {:<22} d{}  {:>3} min  requires: {}",
            topic.id, topic.difficulty, topic.estimated_minutes, prereqs
        );
    }

    if validate {
        let issues = graph.validate();
        if issues.is_empty() {
            println!("No curriculum issues.");
        }
        for issue in issues {
            println!("Issue: {}", issue);
        }
    }
}

fn show_prerequisites(engine: &TutorEngine, topic_id: &str) -> Result<()> {
    let graph = engine.graph();
    let topic = graph.get(topic_id)
        .ok_or_else(|| crate::error::TutorError::UnknownTopic(topic_id.to_string()))?;

    let chain = graph.get_all_prerequisites(topic_id);
    if chain.is_empty() {
        println!("{} has no prerequisites.", topic.name);
        return Ok(());
    }
    println!("Prerequisites of {}:", topic.name);
    for id in &chain {
        let name = graph.get(id).map(|t| t.name.as_str()).unwrap_or("(unknown topic)");
        println!("  {:<22} {}", id, name);
    }
    println!("Study order: {}", graph.learning_order(topic_id).join(" -> "));
    Ok(())
}

async fn show_status(engine: &TutorEngine, user_id: &str) {
    let model = engine.snapshot(user_id).await;
    let aggregates = &model.aggregates;

    println!("Learner {}", model.user_id);
    println!("  overall ability: {:.2}", aggregates.overall_ability);
    println!("  engagement:      {:.2}", aggregates.engagement_score);
    println!("  activities:      {}", model.activity_log.len());
    println!();
    println!("Skills:");
    let min_samples = engine.config().tracker.min_confidence_samples;
    for (id, state) in &model.skills {
        let confidence = state.confidence_estimate(min_samples)
            .map(|c| format!("{:.2}", c))
            .unwrap_or_else(|| "  - ".to_string());
        println!(
            "  {:<28} {:.2} / {:.2}  conf {}  {}",
            id.as_str(),
            state.current,
            state.target,
            confidence,
            state.trajectory
        );
    }

    if !aggregates.strengths.is_empty() {
        let names: Vec<&str> = aggregates.strengths.iter().map(|s| s.as_str()).collect();
        println!("Strengths:  {}", names.join(", "));
    }
    if !aggregates.weaknesses.is_empty() {
        let names: Vec<&str> = aggregates.weaknesses.iter().map(|s| s.as_str()).collect();
        println!("Weaknesses: {}", names.join(", "));
    }

    let ready = engine.ready_topics(user_id).await;
    println!();
    if ready.is_empty() {
        println!("No topics are ready right now.");
    } else {
        println!("Ready to study:");
        for topic in ready {
            println!("  {} ({})", topic.name, topic.id);
        }
    }
}

fn print_plan(plan: &Plan) {
    println!(
        "Plan ({}): {} sessions, {} of {} min, score {:.2}",
        plan.strategy,
        plan.sessions.len(),
        plan.total_time,
        plan.budget,
        plan.score.unwrap_or_default()
    );
    if let Some(prediction) = plan.ml_recommendation {
        println!("Predicted performance on the first session: {:.2}", prediction);
    }

    for (i, session) in plan.sessions.iter().enumerate() {
        let when = session.scheduled_for
            .map(|d| d.format(" %a %d %b %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{:>2}. {} (d{}, {} min){}",
            i + 1,
            session.topic_name,
            session.difficulty,
            session.duration_minutes,
            when
        );
        let activities: Vec<String> = session.activities.iter()
            .map(|a| format!("{} {}m", a.kind, a.minutes))
            .collect();
        println!("      {}", activities.join(", "));
    }

    for milestone in &plan.milestones {
        println!("Milestone after session {}: {}", milestone.after_session, milestone.title);
    }
}
