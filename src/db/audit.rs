use sqlx::PgPool;

use crate::models::{AuditEvent, NewAuditEvent};

const SELECT_WITH_ACTOR: &str = "SELECT e.id, e.user_id, u.username AS actor, e.action,
        e.resource_type, e.resource_id, e.details, e.created_at
     FROM audit_events e
     LEFT JOIN users u ON u.id = e.user_id";

pub async fn insert(pool: &PgPool, event: NewAuditEvent<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO audit_events (user_id, action, resource_type, resource_id, details)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(event.user_id)
    .bind(event.action)
    .bind(event.resource_type)
    .bind(event.resource_id)
    .bind(event.details)
    .execute(pool)
    .await?;
    Ok(())
}

/// Newest first. `resource_type` narrows to one kind of record.
pub async fn list(
    pool: &PgPool,
    resource_type: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<AuditEvent>, sqlx::Error> {
    sqlx::query_as::<_, AuditEvent>(&format!(
        "{SELECT_WITH_ACTOR}
         WHERE ($1::text IS NULL OR e.resource_type = $1)
         ORDER BY e.created_at DESC LIMIT $2 OFFSET $3"
    ))
    .bind(resource_type)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, resource_type: Option<&str>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM audit_events WHERE ($1::text IS NULL OR resource_type = $1)",
    )
    .bind(resource_type)
    .fetch_one(pool)
    .await
}
