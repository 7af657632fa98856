use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: String,
    pub complexity: String,
    pub status: String,
    pub estimated_weeks: i32,
    pub version: String,
    pub features: Json<Vec<String>>,
    pub tech_stack: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// Days left until `created_at + estimated_weeks`; `None` without an
    /// estimate.
    pub fn days_to_target(&self, today: NaiveDate) -> Option<i64> {
        if self.estimated_weeks <= 0 {
            return None;
        }
        let target = self.created_at.date_naive() + Duration::weeks(self.estimated_weeks as i64);
        Some((target - today).num_days())
    }
}
