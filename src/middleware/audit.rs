use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::models::NewAuditEvent;

/// Record an audit event after a successful mutation. A failed write is
/// logged and never fails the request.
pub async fn log_event(
    pool: &PgPool,
    user_id: Option<Uuid>,
    action: &str,
    resource_type: &str,
    resource_id: Option<Uuid>,
    details: Option<serde_json::Value>,
) {
    let event = NewAuditEvent {
        user_id,
        action,
        resource_type,
        resource_id,
        details,
    };
    if let Err(e) = db::audit::insert(pool, event).await {
        tracing::error!(action, resource_type, ?resource_id, "Failed to log audit event: {e}");
    }
}
