//! Tutoring engine
//!
//! Owns the shared read-only curriculum and one model per learner. Every
//! operation on a learner runs under that learner's lock; different
//! learners proceed in parallel. Persistence and prediction are
//! fire-and-continue: failures are logged and never undo the in-memory
//! update.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::curriculum::{CurriculumGraph, Topic};
use crate::error::TutorError;
use crate::mastery::{feature_vector, ActivityEvent, SkillTracker, SkillUpdate, UserModel};
use crate::planner::{LearningPathPlanner, Plan, PlanningContext};
use crate::predictor::{predict_with_timeout, NullPredictor, PerformancePredictor};
use crate::reasoner::{KnowledgeReasoner, ReasoningConclusion};
use crate::scheduler::PlanScheduler;
use crate::store::UserStore;

/// Result of recording one activity
#[derive(Debug, Clone)]
pub struct ActivityOutcome {
    /// `None` when the skill is unknown and the event was ignored
    pub update: Option<SkillUpdate>,
    /// Whether the updated model reached the store
    pub persisted: bool,
    /// Predicted performance on the next practice of this skill
    pub prediction: Option<f64>,
}

pub struct TutorEngine {
    config: Config,
    graph: Arc<CurriculumGraph>,
    tracker: SkillTracker,
    planner: LearningPathPlanner,
    reasoner: KnowledgeReasoner,
    scheduler: PlanScheduler,
    store: Arc<dyn UserStore>,
    predictor: Arc<dyn PerformancePredictor>,
    users: Mutex<HashMap<String, Arc<Mutex<UserModel>>>>,
    strict_skills: bool,
}

impl TutorEngine {
    pub fn new(config: Config, graph: Arc<CurriculumGraph>, store: Arc<dyn UserStore>) -> Self {
        let tracker = SkillTracker::new(config.tracker.clone(), Arc::new(graph.catalog().clone()));
        let reasoner = KnowledgeReasoner::new(config.reasoner.clone());
        let scheduler = PlanScheduler::new(config.planner.sessions_per_week);

        Self {
            config,
            graph,
            tracker,
            planner: LearningPathPlanner::new(),
            reasoner,
            scheduler,
            store,
            predictor: Arc::new(NullPredictor),
            users: Mutex::new(HashMap::new()),
            strict_skills: false,
        }
    }

    pub fn with_predictor(mut self, predictor: Arc<dyn PerformancePredictor>) -> Self {
        self.predictor = predictor;
        self
    }

    /// Reject activity on skills outside the catalog instead of ignoring it
    pub fn with_strict_skills(mut self, strict: bool) -> Self {
        self.strict_skills = strict;
        self
    }

    pub fn graph(&self) -> &CurriculumGraph {
        &self.graph
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn default_model(&self, user_id: &str) -> UserModel {
        UserModel::new(user_id, self.graph.catalog(), &self.config.tracker)
    }

    /// Exclusive access to a learner's model. The first access loads it
    /// from the store; an absent or unreadable model becomes a default one.
    async fn lock_user(&self, user_id: &str) -> OwnedMutexGuard<UserModel> {
        let (handle, fresh) = {
            let mut users = self.users.lock().await;
            match users.get(user_id) {
                Some(handle) => (handle.clone(), None),
                None => {
                    let handle = Arc::new(Mutex::new(self.default_model(user_id)));
                    // uncontended: nobody else can see the handle yet
                    let guard = handle.clone().lock_owned().await;
                    users.insert(user_id.to_string(), handle.clone());
                    (handle, Some(guard))
                }
            }
        };

        let Some(mut guard) = fresh else {
            return handle.lock_owned().await;
        };

        match self.store.get_user(user_id).await {
            Ok(Some(mut model)) => {
                let added = model.sync_catalog(self.graph.catalog(), &self.config.tracker);
                if added > 0 {
                    debug!("Seeded {} new catalog skills for {}", added, user_id);
                }
                model.refresh_aggregates(Utc::now());
                *guard = model;
                info!("Loaded model for {}", user_id);
            }
            Ok(None) => debug!("No stored model for {}, starting fresh", user_id),
            Err(e) => warn!("Failed to load model for {}: {:#}; using defaults", user_id, e),
        }

        guard
    }

    async fn persist(&self, model: &UserModel) -> bool {
        match self.store.put_user(model).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to persist model for {}: {:#}", model.user_id, e);
                false
            }
        }
    }

    async fn predict_for(&self, model: &UserModel, skill_id: &str) -> Option<f64> {
        if !self.config.predictor.enabled {
            return None;
        }
        let features = feature_vector(model.skill(skill_id)?)?;
        predict_with_timeout(
            self.predictor.as_ref(),
            &features,
            Duration::from_millis(self.config.predictor.timeout_ms),
        )
        .await
    }

    /// Apply one practice event, persist, and ask the predictor about the
    /// next attempt. Only malformed input is an error.
    pub async fn record_activity(&self, user_id: &str, mut event: ActivityEvent) -> Result<ActivityOutcome, TutorError> {
        if !event.performance.is_finite() || !(0.0..=1.0).contains(&event.performance) {
            return Err(TutorError::InvalidPerformance(event.performance));
        }
        if self.strict_skills {
            event.skill_id = self.graph.catalog().resolve(&event.skill_id)?.into();
        }

        let mut model = self.lock_user(user_id).await;
        let update = self.tracker.record_activity(&mut model, &event);

        let Some(update) = update else {
            return Ok(ActivityOutcome {
                update: None,
                persisted: false,
                prediction: None,
            });
        };

        let persisted = self.persist(&model).await;
        let prediction = self.predict_for(&model, update.skill_id.as_str()).await;

        Ok(ActivityOutcome {
            update: Some(update),
            persisted,
            prediction,
        })
    }

    /// Copy of the learner's current model
    pub async fn snapshot(&self, user_id: &str) -> UserModel {
        self.lock_user(user_id).await.clone()
    }

    /// Topics the learner can start now, in study order
    pub async fn ready_topics(&self, user_id: &str) -> Vec<Topic> {
        let model = self.lock_user(user_id).await;
        let ctx = PlanningContext::new(&self.graph, &model, &self.config.planner);
        self.planner.ready_topics(&ctx).into_iter().cloned().collect()
    }

    /// Build the best plan for the learner. With `use_reasoning` the
    /// reasoner's difficulty recommendations shape the sessions.
    pub async fn plan(&self, user_id: &str, use_reasoning: bool) -> Result<Plan, TutorError> {
        let model = self.lock_user(user_id).await;

        let kb = use_reasoning.then(|| {
            let mut kb = self.reasoner.build_from_curriculum(&self.graph, &model);
            self.reasoner.infer(&mut kb);
            kb
        });

        let mut ctx = PlanningContext::new(&self.graph, &model, &self.config.planner);
        if let Some(kb) = &kb {
            ctx = ctx.with_reasoning(kb);
        }
        let mut plan = self.planner.create_learning_plan(&ctx)?.selected;

        let lead_skill = plan.sessions.first()
            .and_then(|s| self.graph.get(&s.topic_id))
            .and_then(|t| t.required_skills.first())
            .cloned();
        if let Some(skill) = lead_skill {
            plan.ml_recommendation = self.predict_for(&model, skill.as_str()).await;
        }

        Ok(plan)
    }

    /// Plan and date the sessions from `start`
    pub async fn plan_and_schedule(
        &self,
        user_id: &str,
        use_reasoning: bool,
        start: DateTime<Utc>,
    ) -> Result<Plan, TutorError> {
        let mut plan = self.plan(user_id, use_reasoning).await?;
        self.scheduler.schedule(&mut plan, start)?;
        Ok(plan)
    }

    /// Answer an ad-hoc question against the curriculum and the learner's state
    pub async fn reason(&self, user_id: &str, query: &str) -> ReasoningConclusion {
        let model = self.lock_user(user_id).await;
        let mut kb = self.reasoner.build_from_curriculum(&self.graph, &model);
        drop(model);
        self.reasoner.perform_logical_reasoning(query, &mut kb)
    }
}
