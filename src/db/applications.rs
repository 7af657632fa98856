use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{like_pattern, Page};
use crate::forms::application::ApplicationData;
use crate::models::Application;

#[derive(Debug, Default, Clone)]
pub struct ApplicationFilter {
    pub project_id: Option<Uuid>,
    pub status: Option<String>,
    pub complexity: Option<String>,
    pub search: Option<String>,
}

/// An application together with the name of its project.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct ApplicationRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub application: Application,
    pub project_name: String,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ApplicationFilter) {
    qb.push(" WHERE TRUE");
    if let Some(project_id) = filter.project_id {
        qb.push(" AND a.project_id = ").push_bind(project_id);
    }
    if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND a.status = ").push_bind(status.to_string());
    }
    if let Some(complexity) = filter.complexity.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND a.complexity = ").push_bind(complexity.to_string());
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (a.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR a.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub async fn list(
    pool: &PgPool,
    filter: &ApplicationFilter,
    page: Page,
) -> Result<Vec<ApplicationRow>, sqlx::Error> {
    let mut qb = QueryBuilder::new(
        "SELECT a.*, p.name AS project_name FROM applications a
         JOIN projects p ON a.project_id = p.id",
    );
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY p.name, a.name LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);
    qb.build_query_as::<ApplicationRow>().fetch_all(pool).await
}

pub async fn count(pool: &PgPool, filter: &ApplicationFilter) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM applications a");
    push_filters(&mut qb, filter);
    let row: (i64,) = qb.build_query_as().fetch_one(pool).await?;
    Ok(row.0)
}

pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Application>, sqlx::Error> {
    sqlx::query_as::<_, Application>(
        "SELECT * FROM applications WHERE project_id = $1 ORDER BY name",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<ApplicationRow>, sqlx::Error> {
    list(pool, &ApplicationFilter::default(), Page::all()).await
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    data: &ApplicationData,
) -> Result<Application, sqlx::Error> {
    sqlx::query_as::<_, Application>(
        "INSERT INTO applications
            (project_id, name, description, complexity, status, estimated_weeks, version, features, tech_stack)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
    )
    .bind(data.project_id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.complexity.as_str())
    .bind(data.status.as_str())
    .bind(data.estimated_weeks)
    .bind(&data.version)
    .bind(Json(&data.features))
    .bind(Json(&data.tech_stack))
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Application>, sqlx::Error> {
    sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_row(pool: &PgPool, id: Uuid) -> Result<Option<ApplicationRow>, sqlx::Error> {
    sqlx::query_as::<_, ApplicationRow>(
        "SELECT a.*, p.name AS project_name FROM applications a
         JOIN projects p ON a.project_id = p.id
         WHERE a.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_name(
    pool: &PgPool,
    project_id: Uuid,
    name: &str,
) -> Result<Option<Application>, sqlx::Error> {
    sqlx::query_as::<_, Application>(
        "SELECT * FROM applications WHERE project_id = $1 AND name = $2",
    )
    .bind(project_id)
    .bind(name)
    .fetch_optional(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    data: &ApplicationData,
) -> Result<Option<Application>, sqlx::Error> {
    sqlx::query_as::<_, Application>(
        "UPDATE applications SET project_id = $2, name = $3, description = $4, complexity = $5,
                status = $6, estimated_weeks = $7, version = $8, features = $9, tech_stack = $10,
                updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(data.project_id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.complexity.as_str())
    .bind(data.status.as_str())
    .bind(data.estimated_weeks)
    .bind(&data.version)
    .bind(Json(&data.features))
    .bind(Json(&data.tech_stack))
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM applications WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
