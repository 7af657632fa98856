use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{like_pattern, Page};
use crate::forms::artifact::ArtifactData;
use crate::models::Artifact;

#[derive(Debug, Default, Clone)]
pub struct ArtifactFilter {
    pub application_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub artifact_type: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub updated_since: Option<DateTime<Utc>>,
}

/// An artifact with the names of the application and project it belongs to.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct ArtifactRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub artifact: Artifact,
    pub application_name: Option<String>,
    pub project_id: Option<Uuid>,
    pub project_name: Option<String>,
}

const ROW_SELECT: &str = "SELECT ar.*, a.name AS application_name, p.id AS project_id, p.name AS project_name
     FROM artifacts ar
     LEFT JOIN applications a ON ar.application_id = a.id
     LEFT JOIN projects p ON a.project_id = p.id";

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ArtifactFilter) {
    qb.push(" WHERE TRUE");
    if let Some(application_id) = filter.application_id {
        qb.push(" AND ar.application_id = ").push_bind(application_id);
    }
    if let Some(project_id) = filter.project_id {
        qb.push(" AND a.project_id = ").push_bind(project_id);
    }
    if let Some(kind) = filter.artifact_type.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND ar.artifact_type = ").push_bind(kind.to_string());
    }
    if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND ar.status = ").push_bind(status.to_string());
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (ar.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR ar.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR ar.content ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(since) = filter.updated_since {
        qb.push(" AND ar.updated_at >= ").push_bind(since);
    }
}

pub async fn list(
    pool: &PgPool,
    filter: &ArtifactFilter,
    page: Page,
) -> Result<Vec<ArtifactRow>, sqlx::Error> {
    let mut qb = QueryBuilder::new(ROW_SELECT);
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY ar.updated_at DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);
    qb.build_query_as::<ArtifactRow>().fetch_all(pool).await
}

pub async fn count(pool: &PgPool, filter: &ArtifactFilter) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::new(
        "SELECT COUNT(*) FROM artifacts ar LEFT JOIN applications a ON ar.application_id = a.id",
    );
    push_filters(&mut qb, filter);
    let row: (i64,) = qb.build_query_as().fetch_one(pool).await?;
    Ok(row.0)
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    created_by: Option<Uuid>,
    version: &str,
    data: &ArtifactData,
) -> Result<Artifact, sqlx::Error> {
    sqlx::query_as::<_, Artifact>(
        "INSERT INTO artifacts
            (application_id, name, artifact_type, description, content, version, status, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(data.application_id)
    .bind(&data.name)
    .bind(data.artifact_type.map(|t| t.as_str()))
    .bind(&data.description)
    .bind(&data.content)
    .bind(version)
    .bind(data.status.as_str())
    .bind(created_by)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Artifact>, sqlx::Error> {
    sqlx::query_as::<_, Artifact>("SELECT * FROM artifacts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_row(pool: &PgPool, id: Uuid) -> Result<Option<ArtifactRow>, sqlx::Error> {
    sqlx::query_as::<_, ArtifactRow>(&format!("{ROW_SELECT} WHERE ar.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    version: &str,
    data: &ArtifactData,
) -> Result<Option<Artifact>, sqlx::Error> {
    sqlx::query_as::<_, Artifact>(
        "UPDATE artifacts SET application_id = $2, name = $3, artifact_type = $4, description = $5,
                content = $6, version = $7, status = $8, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(data.application_id)
    .bind(&data.name)
    .bind(data.artifact_type.map(|t| t.as_str()))
    .bind(&data.description)
    .bind(&data.content)
    .bind(version)
    .bind(data.status.as_str())
    .fetch_optional(pool)
    .await
}

pub async fn set_file(
    pool: &PgPool,
    id: Uuid,
    file_path: &str,
    file_name: &str,
    file_size: i64,
) -> Result<Option<Artifact>, sqlx::Error> {
    sqlx::query_as::<_, Artifact>(
        "UPDATE artifacts SET file_path = $2, file_name = $3, file_size = $4, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(file_path)
    .bind(file_name)
    .bind(file_size)
    .fetch_optional(pool)
    .await
}

/// Earlier revisions: other artifacts sharing the name and application.
pub async fn version_history(pool: &PgPool, artifact: &Artifact) -> Result<Vec<Artifact>, sqlx::Error> {
    sqlx::query_as::<_, Artifact>(
        "SELECT * FROM artifacts
         WHERE name = $1 AND application_id IS NOT DISTINCT FROM $2 AND id <> $3
         ORDER BY created_at DESC",
    )
    .bind(&artifact.name)
    .bind(artifact.application_id)
    .bind(artifact.id)
    .fetch_all(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM artifacts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Whether another artifact already points at this stored file.
pub async fn file_path_taken(pool: &PgPool, file_path: &str, except: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM artifacts WHERE file_path = $1 AND id <> $2)",
    )
    .bind(file_path)
    .bind(except)
    .fetch_one(pool)
    .await
}
