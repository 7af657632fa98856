use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::choices::IntegrationComplexity;

pub const HOURS_PER_WEEK: i64 = 40;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Integration {
    pub id: Uuid,
    pub from_app_id: Uuid,
    pub to_app_id: Uuid,
    pub integration_type: String,
    pub status: String,
    pub complexity: String,
    pub description: String,
    pub estimated_weeks: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Integration {
    pub fn complexity_multiplier(&self) -> f64 {
        IntegrationComplexity::parse(&self.complexity)
            .map(|c| c.multiplier())
            .unwrap_or(1.0)
    }

    /// Weeks converted to working hours, scaled by complexity.
    pub fn estimated_hours(&self) -> i64 {
        let base = self.estimated_weeks as i64 * HOURS_PER_WEEK;
        (base as f64 * self.complexity_multiplier()).round() as i64
    }
}
