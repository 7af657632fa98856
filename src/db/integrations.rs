use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::Page;
use crate::forms::integration::IntegrationData;
use crate::models::Integration;

#[derive(Debug, Default, Clone)]
pub struct IntegrationFilter {
    /// Matches on the project of the source application.
    pub project_id: Option<Uuid>,
    pub application_id: Option<Uuid>,
    pub status: Option<String>,
    pub integration_type: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct IntegrationRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub integration: Integration,
    pub from_app_name: String,
    pub to_app_name: String,
    pub project_id: Uuid,
    pub project_name: String,
}

const ROW_SELECT: &str = "SELECT i.*, fa.name AS from_app_name, ta.name AS to_app_name,
            p.id AS project_id, p.name AS project_name
     FROM integrations i
     JOIN applications fa ON i.from_app_id = fa.id
     JOIN applications ta ON i.to_app_id = ta.id
     JOIN projects p ON fa.project_id = p.id";

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &IntegrationFilter) {
    qb.push(" WHERE TRUE");
    if let Some(project_id) = filter.project_id {
        qb.push(" AND fa.project_id = ").push_bind(project_id);
    }
    if let Some(application_id) = filter.application_id {
        qb.push(" AND (i.from_app_id = ")
            .push_bind(application_id)
            .push(" OR i.to_app_id = ")
            .push_bind(application_id)
            .push(")");
    }
    if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND i.status = ").push_bind(status.to_string());
    }
    if let Some(kind) = filter.integration_type.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND i.integration_type = ").push_bind(kind.to_string());
    }
}

pub async fn list(
    pool: &PgPool,
    filter: &IntegrationFilter,
    page: Page,
) -> Result<Vec<IntegrationRow>, sqlx::Error> {
    let mut qb = QueryBuilder::new(ROW_SELECT);
    push_filters(&mut qb, filter);
    qb.push(
        " ORDER BY CASE i.status WHEN 'in-progress' THEN 0 WHEN 'blocked' THEN 1
                               WHEN 'planned' THEN 2 ELSE 3 END,
           CASE i.complexity WHEN 'complex' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END,
           i.created_at DESC
         LIMIT ",
    )
    .push_bind(page.limit)
    .push(" OFFSET ")
    .push_bind(page.offset);
    qb.build_query_as::<IntegrationRow>().fetch_all(pool).await
}

pub async fn count(pool: &PgPool, filter: &IntegrationFilter) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::new(
        "SELECT COUNT(*) FROM integrations i JOIN applications fa ON i.from_app_id = fa.id",
    );
    push_filters(&mut qb, filter);
    let row: (i64,) = qb.build_query_as().fetch_one(pool).await?;
    Ok(row.0)
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    data: &IntegrationData,
) -> Result<Integration, sqlx::Error> {
    sqlx::query_as::<_, Integration>(
        "INSERT INTO integrations
            (from_app_id, to_app_id, integration_type, status, complexity, description, estimated_weeks)
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(data.from_app_id)
    .bind(data.to_app_id)
    .bind(data.integration_type.as_str())
    .bind(data.status.as_str())
    .bind(data.complexity.as_str())
    .bind(&data.description)
    .bind(data.estimated_weeks)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Integration>, sqlx::Error> {
    sqlx::query_as::<_, Integration>("SELECT * FROM integrations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_row(pool: &PgPool, id: Uuid) -> Result<Option<IntegrationRow>, sqlx::Error> {
    sqlx::query_as::<_, IntegrationRow>(&format!("{ROW_SELECT} WHERE i.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    data: &IntegrationData,
) -> Result<Option<Integration>, sqlx::Error> {
    sqlx::query_as::<_, Integration>(
        "UPDATE integrations SET from_app_id = $2, to_app_id = $3, integration_type = $4,
                status = $5, complexity = $6, description = $7, estimated_weeks = $8,
                updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(data.from_app_id)
    .bind(data.to_app_id)
    .bind(data.integration_type.as_str())
    .bind(data.status.as_str())
    .bind(data.complexity.as_str())
    .bind(&data.description)
    .bind(data.estimated_weeks)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM integrations WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
