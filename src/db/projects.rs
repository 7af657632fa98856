use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{like_pattern, Page};
use crate::forms::project::ProjectData;
use crate::models::Project;

#[derive(Debug, Default, Clone)]
pub struct ProjectFilter {
    pub search: Option<String>,
    pub status: Option<String>,
    pub owner_id: Option<Uuid>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProjectFilter) {
    qb.push(" WHERE TRUE");
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND status = ").push_bind(status.to_string());
    }
    if let Some(owner_id) = filter.owner_id {
        qb.push(" AND owner_id = ").push_bind(owner_id);
    }
}

pub async fn list(
    pool: &PgPool,
    filter: &ProjectFilter,
    page: Page,
) -> Result<Vec<Project>, sqlx::Error> {
    let mut qb = QueryBuilder::new("SELECT * FROM projects");
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);
    qb.build_query_as::<Project>().fetch_all(pool).await
}

pub async fn count(pool: &PgPool, filter: &ProjectFilter) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM projects");
    push_filters(&mut qb, filter);
    let row: (i64,) = qb.build_query_as().fetch_one(pool).await?;
    Ok(row.0)
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    data: &ProjectData,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "INSERT INTO projects (name, description, status, start_date, target_date, owner_id)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.status.as_str())
    .bind(data.start_date)
    .bind(data.target_date)
    .bind(owner_id)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE name = $1 ORDER BY created_at LIMIT 1")
        .bind(name)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    owner_id: Uuid,
    data: &ProjectData,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects SET name = $2, description = $3, status = $4, start_date = $5,
                target_date = $6, owner_id = $7, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.status.as_str())
    .bind(data.start_date)
    .bind(data.target_date)
    .bind(owner_id)
    .fetch_optional(pool)
    .await
}

/// Deletes the project; applications, tasks, artifacts, decisions and
/// integrations go with it through `ON DELETE CASCADE`.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
