use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::choices::TaskStatus;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub application_id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub assignee: String,
    pub assigned_user_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub estimated_hours: Option<i32>,
    pub actual_hours: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Past due and still open (pending or in progress).
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        let open = matches!(
            TaskStatus::parse(&self.status),
            Some(TaskStatus::Pending | TaskStatus::InProgress)
        );
        open && self.due_date.is_some_and(|due| due < today)
    }

    pub fn days_until_due(&self, today: NaiveDate) -> Option<i64> {
        self.due_date.map(|due| (due - today).num_days())
    }

    pub fn hours_variance(&self) -> Option<i32> {
        match (self.estimated_hours, self.actual_hours) {
            (Some(est), Some(actual)) if est > 0 && actual > 0 => Some(actual - est),
            _ => None,
        }
    }
}
