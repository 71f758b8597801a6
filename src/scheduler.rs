//! Plan scheduler
//!
//! Turns a selected plan into dated sessions and milestones.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::error::TutorError;
use crate::planner::{Milestone, Plan, PlanState};

/// A milestone falls after every this many sessions, and after the last one
pub const MILESTONE_INTERVAL: usize = 3;

/// Spreads sessions evenly over the week
#[derive(Debug, Clone)]
pub struct PlanScheduler {
    sessions_per_week: u32,
}

impl PlanScheduler {
    pub fn new(sessions_per_week: u32) -> Self {
        Self {
            sessions_per_week: sessions_per_week.max(1),
        }
    }

    /// Gap between consecutive sessions
    pub fn interval(&self) -> Duration {
        Duration::minutes(7 * 24 * 60 / self.sessions_per_week as i64)
    }

    /// Milestones every [`MILESTONE_INTERVAL`] sessions and at the final one
    pub fn milestones(plan: &Plan) -> Vec<Milestone> {
        let count = plan.sessions.len();
        (1..=count)
            .filter(|&n| n % MILESTONE_INTERVAL == 0 || n == count)
            .enumerate()
            .map(|(i, n)| Milestone {
                after_session: n,
                title: if n == count {
                    "Plan complete".to_string()
                } else {
                    format!("Checkpoint {}", i + 1)
                },
                topics: plan.sessions[..n].iter().map(|s| s.topic_id.clone()).collect(),
                target_date: plan.sessions[n - 1].scheduled_for,
            })
            .collect()
    }

    /// Date every session from `start`, attach milestones and move the plan
    /// to `Scheduled`. Only a selected plan can be scheduled.
    pub fn schedule(&self, plan: &mut Plan, start: DateTime<Utc>) -> Result<(), TutorError> {
        if plan.state != PlanState::Selected {
            return Err(TutorError::IllegalTransition {
                from: plan.state.to_string(),
                to: PlanState::Scheduled.to_string(),
            });
        }

        let interval = self.interval();
        let mut when = start;
        for session in &mut plan.sessions {
            session.scheduled_for = Some(when);
            when += interval;
        }

        plan.milestones = Self::milestones(plan);
        plan.transition_to(PlanState::Scheduled)?;

        info!(
            "Scheduled plan {} ({} sessions, {} milestones)",
            plan.id,
            plan.sessions.len(),
            plan.milestones.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::Session;
    use crate::types::Difficulty;
    use chrono::TimeZone;

    fn plan_with(n: usize) -> Plan {
        let mut plan = Plan::new("u", "test", 1000);
        for i in 0..n {
            plan.try_push(Session {
                topic_id: format!("t{}", i),
                topic_name: format!("T{}", i),
                activities: Vec::new(),
                prerequisites: Vec::new(),
                objectives: Vec::new(),
                duration_minutes: 30,
                difficulty: Difficulty::default(),
                expected_improvement: 0.1,
                scheduled_for: None,
            });
        }
        plan
    }

    #[test]
    fn test_schedule_dates_and_milestones() {
        let mut plan = plan_with(7);
        plan.transition_to(PlanState::Scored).unwrap();
        plan.transition_to(PlanState::Selected).unwrap();

        let start = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        let scheduler = PlanScheduler::new(7);
        scheduler.schedule(&mut plan, start).unwrap();

        assert_eq!(plan.state, PlanState::Scheduled);
        assert_eq!(plan.sessions[1].scheduled_for, Some(start + Duration::days(1)));

        let after: Vec<usize> = plan.milestones.iter().map(|m| m.after_session).collect();
        assert_eq!(after, vec![3, 6, 7]);
        assert_eq!(plan.milestones[2].topics.len(), 7);
        assert_eq!(plan.milestones[0].target_date, plan.sessions[2].scheduled_for);
    }

    #[test]
    fn test_draft_plan_cannot_be_scheduled() {
        let mut plan = plan_with(2);
        assert!(PlanScheduler::new(3).schedule(&mut plan, Utc::now()).is_err());
        assert_eq!(plan.state, PlanState::Draft);
    }
}
