//! Aggregate queries behind the dashboard and the per-project/application
//! statistics endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Headline counts, optionally limited to a single project.
#[derive(Debug, Clone, Default, sqlx::FromRow, Serialize)]
pub struct Overview {
    pub total_projects: i64,
    pub completed_projects: i64,
    pub total_applications: i64,
    pub production_applications: i64,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub total_artifacts: i64,
}

pub async fn overview(pool: &PgPool, project_id: Option<Uuid>) -> Result<Overview, sqlx::Error> {
    sqlx::query_as::<_, Overview>(
        "WITH p AS (SELECT * FROM projects WHERE $1::uuid IS NULL OR id = $1),
              a AS (SELECT * FROM applications WHERE project_id IN (SELECT id FROM p))
         SELECT
            (SELECT COUNT(*) FROM p) AS total_projects,
            (SELECT COUNT(*) FROM p WHERE status = 'completed') AS completed_projects,
            (SELECT COUNT(*) FROM a) AS total_applications,
            (SELECT COUNT(*) FROM a WHERE status = 'production') AS production_applications,
            (SELECT COUNT(*) FROM tasks WHERE application_id IN (SELECT id FROM a)) AS total_tasks,
            (SELECT COUNT(*) FROM tasks
              WHERE application_id IN (SELECT id FROM a) AND status = 'completed') AS completed_tasks,
            (SELECT COUNT(*) FROM artifacts WHERE application_id IN (SELECT id FROM a)) AS total_artifacts",
    )
    .bind(project_id)
    .fetch_one(pool)
    .await
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct MonthlyTasks {
    pub month: DateTime<Utc>,
    pub completed: i64,
    pub total: i64,
}

/// Tasks touched per calendar month since `since`, oldest month first.
pub async fn monthly_tasks(
    pool: &PgPool,
    project_id: Option<Uuid>,
    since: DateTime<Utc>,
) -> Result<Vec<MonthlyTasks>, sqlx::Error> {
    sqlx::query_as::<_, MonthlyTasks>(
        "SELECT date_trunc('month', t.updated_at) AS month,
                COUNT(*) FILTER (WHERE t.status = 'completed') AS completed,
                COUNT(*) AS total
         FROM tasks t
         JOIN applications a ON t.application_id = a.id
         WHERE t.updated_at >= $2 AND ($1::uuid IS NULL OR a.project_id = $1)
         GROUP BY month
         ORDER BY month",
    )
    .bind(project_id)
    .bind(since)
    .fetch_all(pool)
    .await
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

pub async fn project_status_distribution(
    pool: &PgPool,
    project_id: Option<Uuid>,
) -> Result<Vec<StatusCount>, sqlx::Error> {
    sqlx::query_as::<_, StatusCount>(
        "SELECT status, COUNT(*) AS count FROM projects
         WHERE $1::uuid IS NULL OR id = $1
         GROUP BY status ORDER BY status",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

/// Task totals for one project or application.
#[derive(Debug, Clone, Copy, Default, sqlx::FromRow, Serialize)]
pub struct TaskCounts {
    pub total: i64,
    pub completed: i64,
}

impl TaskCounts {
    pub fn completion_percentage(&self) -> f64 {
        crate::models::completion_percentage(self.completed, self.total)
    }
}

pub async fn project_task_counts(pool: &PgPool, project_id: Uuid) -> Result<TaskCounts, sqlx::Error> {
    sqlx::query_as::<_, TaskCounts>(
        "SELECT COUNT(t.id) AS total,
                COUNT(t.id) FILTER (WHERE t.status = 'completed') AS completed
         FROM tasks t
         JOIN applications a ON t.application_id = a.id
         WHERE a.project_id = $1",
    )
    .bind(project_id)
    .fetch_one(pool)
    .await
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ProjectTaskCounts {
    pub project_id: Uuid,
    pub total: i64,
    pub completed: i64,
}

/// Task totals for every project, including projects without tasks.
pub async fn task_counts_by_project(pool: &PgPool) -> Result<Vec<ProjectTaskCounts>, sqlx::Error> {
    sqlx::query_as::<_, ProjectTaskCounts>(
        "SELECT p.id AS project_id,
                COUNT(t.id) AS total,
                COUNT(t.id) FILTER (WHERE t.status = 'completed') AS completed
         FROM projects p
         LEFT JOIN applications a ON a.project_id = p.id
         LEFT JOIN tasks t ON t.application_id = a.id
         GROUP BY p.id",
    )
    .fetch_all(pool)
    .await
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ApplicationProgress {
    pub application_id: Uuid,
    pub name: String,
    pub status: String,
    pub total: i64,
    pub completed: i64,
}

pub async fn application_progress(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Vec<ApplicationProgress>, sqlx::Error> {
    sqlx::query_as::<_, ApplicationProgress>(
        "SELECT a.id AS application_id, a.name, a.status,
                COUNT(t.id) AS total,
                COUNT(t.id) FILTER (WHERE t.status = 'completed') AS completed
         FROM applications a
         LEFT JOIN tasks t ON t.application_id = a.id
         WHERE a.project_id = $1
         GROUP BY a.id
         ORDER BY a.name",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ProjectStatistics {
    pub applications_count: i64,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub overdue_tasks: i64,
    pub artifacts_count: i64,
    pub decisions_count: i64,
    pub integrations_count: i64,
}

pub async fn project_statistics(
    pool: &PgPool,
    project_id: Uuid,
    today: NaiveDate,
) -> Result<ProjectStatistics, sqlx::Error> {
    sqlx::query_as::<_, ProjectStatistics>(
        "WITH a AS (SELECT id FROM applications WHERE project_id = $1),
              t AS (SELECT * FROM tasks WHERE application_id IN (SELECT id FROM a))
         SELECT
            (SELECT COUNT(*) FROM a) AS applications_count,
            (SELECT COUNT(*) FROM t) AS total_tasks,
            (SELECT COUNT(*) FROM t WHERE status = 'completed') AS completed_tasks,
            (SELECT COUNT(*) FROM t
              WHERE due_date < $2 AND status IN ('pending', 'in-progress')) AS overdue_tasks,
            (SELECT COUNT(*) FROM artifacts WHERE application_id IN (SELECT id FROM a)) AS artifacts_count,
            (SELECT COUNT(*) FROM decisions WHERE project_id = $1) AS decisions_count,
            (SELECT COUNT(*) FROM integrations WHERE from_app_id IN (SELECT id FROM a)) AS integrations_count",
    )
    .bind(project_id)
    .bind(today)
    .fetch_one(pool)
    .await
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ApplicationCounts {
    pub tasks_total: i64,
    pub tasks_completed: i64,
    pub artifacts_count: i64,
    pub integrations_count: i64,
}

pub async fn application_counts(
    pool: &PgPool,
    application_id: Uuid,
) -> Result<ApplicationCounts, sqlx::Error> {
    sqlx::query_as::<_, ApplicationCounts>(
        "SELECT
            (SELECT COUNT(*) FROM tasks WHERE application_id = $1) AS tasks_total,
            (SELECT COUNT(*) FROM tasks WHERE application_id = $1 AND status = 'completed') AS tasks_completed,
            (SELECT COUNT(*) FROM artifacts WHERE application_id = $1) AS artifacts_count,
            (SELECT COUNT(*) FROM integrations WHERE from_app_id = $1 OR to_app_id = $1) AS integrations_count",
    )
    .bind(application_id)
    .fetch_one(pool)
    .await
}
