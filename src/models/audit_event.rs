use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One entry of the activity log, joined with the acting user's name.
/// `actor` is None for system actions and for users deleted since.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub actor: Option<String>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// What gets written; id and timestamp come from the database.
#[derive(Debug)]
pub struct NewAuditEvent<'a> {
    pub user_id: Option<Uuid>,
    pub action: &'a str,
    pub resource_type: &'a str,
    pub resource_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
}
