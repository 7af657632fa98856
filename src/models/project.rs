use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: String,
    pub start_date: NaiveDate,
    pub target_date: NaiveDate,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Days until the target date; negative once the project is late.
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.target_date - today).num_days()
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        today > self.target_date
    }

    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        if self.is_overdue(today) {
            self.days_remaining(today).abs()
        } else {
            0
        }
    }

    pub fn health_score(&self, completion: f64, today: NaiveDate) -> f64 {
        health_score(completion, self.start_date, self.target_date, today)
    }
}

/// A project with the figures derived from its tasks and schedule.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub completion_percentage: f64,
    pub days_remaining: i64,
    pub is_overdue: bool,
    pub days_overdue: i64,
    pub health_score: f64,
}

impl ProjectSummary {
    pub fn new(project: Project, total_tasks: i64, completed_tasks: i64, today: NaiveDate) -> Self {
        let completion = completion_percentage(completed_tasks, total_tasks);
        Self {
            total_tasks,
            completed_tasks,
            completion_percentage: completion,
            days_remaining: project.days_remaining(today),
            is_overdue: project.is_overdue(today),
            days_overdue: project.days_overdue(today),
            health_score: project.health_score(completion, today),
            project,
        }
    }
}

/// Percentage of completed tasks, one decimal place. Zero when there is
/// nothing to complete.
pub fn completion_percentage(completed: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    round1(completed as f64 / total as f64 * 100.0)
}

/// Weighted project health in `0..=100`: 60% task completion, 40% how well
/// completion keeps pace with the elapsed share of the schedule.
pub fn health_score(
    completion: f64,
    start_date: NaiveDate,
    target_date: NaiveDate,
    today: NaiveDate,
) -> f64 {
    let total_days = (target_date - start_date).num_days();
    let elapsed_days = (today - start_date).num_days();
    let expected_progress = if total_days > 0 {
        elapsed_days as f64 / total_days as f64 * 100.0
    } else {
        0.0
    };

    let schedule_score = if expected_progress > 0.0 {
        (completion / expected_progress).min(1.0)
    } else {
        1.0
    };

    round1((completion / 100.0 * 0.6 + schedule_score * 0.4) * 100.0)
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
