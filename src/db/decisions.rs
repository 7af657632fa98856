use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{like_pattern, Page};
use crate::forms::decision::DecisionData;
use crate::models::Decision;

#[derive(Debug, Default, Clone)]
pub struct DecisionFilter {
    pub project_id: Option<Uuid>,
    pub status: Option<String>,
    pub impact: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct DecisionRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub decision: Decision,
    pub project_name: String,
}

const ROW_SELECT: &str = "SELECT d.*, p.name AS project_name
     FROM decisions d
     JOIN projects p ON d.project_id = p.id";

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &DecisionFilter) {
    qb.push(" WHERE TRUE");
    if let Some(project_id) = filter.project_id {
        qb.push(" AND d.project_id = ").push_bind(project_id);
    }
    if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND d.status = ").push_bind(status.to_string());
    }
    if let Some(impact) = filter.impact.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND d.impact = ").push_bind(impact.to_string());
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (d.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR d.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR d.rationale ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub async fn list(
    pool: &PgPool,
    filter: &DecisionFilter,
    page: Page,
) -> Result<Vec<DecisionRow>, sqlx::Error> {
    let mut qb = QueryBuilder::new(ROW_SELECT);
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY d.created_at DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);
    qb.build_query_as::<DecisionRow>().fetch_all(pool).await
}

pub async fn count(pool: &PgPool, filter: &DecisionFilter) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM decisions d");
    push_filters(&mut qb, filter);
    let row: (i64,) = qb.build_query_as().fetch_one(pool).await?;
    Ok(row.0)
}

/// Decisions still waiting on an outcome, oldest first.
pub async fn pending(
    pool: &PgPool,
    project_id: Option<Uuid>,
    limit: i64,
) -> Result<Vec<DecisionRow>, sqlx::Error> {
    let mut qb = QueryBuilder::new(ROW_SELECT);
    qb.push(" WHERE d.status = 'pending'");
    if let Some(project_id) = project_id {
        qb.push(" AND d.project_id = ").push_bind(project_id);
    }
    qb.push(" ORDER BY d.created_at ASC LIMIT ").push_bind(limit);
    qb.build_query_as::<DecisionRow>().fetch_all(pool).await
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    data: &DecisionData,
) -> Result<Decision, sqlx::Error> {
    sqlx::query_as::<_, Decision>(
        "INSERT INTO decisions
            (project_id, title, description, rationale, status, impact, decided_date, decision_maker)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(data.project_id)
    .bind(&data.title)
    .bind(&data.description)
    .bind(&data.rationale)
    .bind(data.status.as_str())
    .bind(data.impact.as_str())
    .bind(data.decided_date)
    .bind(&data.decision_maker)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Decision>, sqlx::Error> {
    sqlx::query_as::<_, Decision>("SELECT * FROM decisions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_row(pool: &PgPool, id: Uuid) -> Result<Option<DecisionRow>, sqlx::Error> {
    sqlx::query_as::<_, DecisionRow>(&format!("{ROW_SELECT} WHERE d.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    data: &DecisionData,
) -> Result<Option<Decision>, sqlx::Error> {
    sqlx::query_as::<_, Decision>(
        "UPDATE decisions SET project_id = $2, title = $3, description = $4, rationale = $5,
                status = $6, impact = $7, decided_date = $8, decision_maker = $9, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(data.project_id)
    .bind(&data.title)
    .bind(&data.description)
    .bind(&data.rationale)
    .bind(data.status.as_str())
    .bind(data.impact.as_str())
    .bind(data.decided_date)
    .bind(&data.decision_maker)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM decisions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
