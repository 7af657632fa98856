use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::choices::DecisionStatus;

/// A decision left pending longer than this many days gets flagged.
pub const PENDING_TOO_LONG_DAYS: i64 = 30;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Decision {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub rationale: String,
    pub status: String,
    pub impact: String,
    pub decided_date: Option<NaiveDate>,
    pub decision_maker: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Decision {
    pub fn days_since_creation(&self, today: NaiveDate) -> i64 {
        (today - self.created_at.date_naive()).num_days()
    }

    pub fn is_pending_too_long(&self, today: NaiveDate) -> bool {
        DecisionStatus::parse(&self.status) == Some(DecisionStatus::Pending)
            && self.days_since_creation(today) > PENDING_TOO_LONG_DAYS
    }
}
