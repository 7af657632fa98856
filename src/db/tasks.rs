use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{like_pattern, Page};
use crate::forms::bulk::BulkAction;
use crate::forms::task::TaskData;
use crate::models::choices::TaskStatus;
use crate::models::Task;

#[derive(Debug, Default, Clone)]
pub struct TaskFilter {
    pub application_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub search: Option<String>,
    /// Only open tasks whose due date is before this day.
    pub overdue_on: Option<NaiveDate>,
}

/// A task with the application and project it belongs to.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct TaskRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub task: Task,
    pub application_name: String,
    pub project_id: Uuid,
    pub project_name: String,
}

const ROW_SELECT: &str = "SELECT t.*, a.name AS application_name, p.id AS project_id, p.name AS project_name
     FROM tasks t
     JOIN applications a ON t.application_id = a.id
     JOIN projects p ON a.project_id = p.id";

const OPEN_STATUSES: [TaskStatus; 2] = [TaskStatus::Pending, TaskStatus::InProgress];

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &TaskFilter) {
    qb.push(" WHERE TRUE");
    if let Some(application_id) = filter.application_id {
        qb.push(" AND t.application_id = ").push_bind(application_id);
    }
    if let Some(project_id) = filter.project_id {
        qb.push(" AND a.project_id = ").push_bind(project_id);
    }
    if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND t.status = ").push_bind(status.to_string());
    }
    if let Some(priority) = filter.priority.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND t.priority = ").push_bind(priority.to_string());
    }
    if let Some(assignee) = filter.assignee.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND t.assignee = ").push_bind(assignee.to_string());
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (t.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR t.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(today) = filter.overdue_on {
        qb.push(" AND t.due_date < ").push_bind(today);
        push_open(qb);
    }
}

fn push_open(qb: &mut QueryBuilder<'_, Postgres>) {
    qb.push(" AND t.status IN (");
    let mut separated = qb.separated(", ");
    for status in OPEN_STATUSES {
        separated.push_bind(status.as_str());
    }
    separated.push_unseparated(")");
}

pub async fn list(
    pool: &PgPool,
    filter: &TaskFilter,
    page: Page,
) -> Result<Vec<TaskRow>, sqlx::Error> {
    let mut qb = QueryBuilder::new(ROW_SELECT);
    push_filters(&mut qb, filter);
    qb.push(
        " ORDER BY t.due_date ASC NULLS LAST,
           CASE t.priority WHEN 'critical' THEN 0 WHEN 'high' THEN 1 WHEN 'medium' THEN 2 ELSE 3 END,
           t.created_at DESC
         LIMIT ",
    )
    .push_bind(page.limit)
    .push(" OFFSET ")
    .push_bind(page.offset);
    qb.build_query_as::<TaskRow>().fetch_all(pool).await
}

pub async fn count(pool: &PgPool, filter: &TaskFilter) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::new(
        "SELECT COUNT(*) FROM tasks t JOIN applications a ON t.application_id = a.id",
    );
    push_filters(&mut qb, filter);
    let row: (i64,) = qb.build_query_as().fetch_one(pool).await?;
    Ok(row.0)
}

/// Most recently touched tasks, newest first.
pub async fn recent(pool: &PgPool, limit: i64) -> Result<Vec<TaskRow>, sqlx::Error> {
    sqlx::query_as::<_, TaskRow>(&format!(
        "{ROW_SELECT} ORDER BY t.updated_at DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Open tasks past their due date, most overdue first.
pub async fn overdue(
    pool: &PgPool,
    today: NaiveDate,
    project_id: Option<Uuid>,
    limit: i64,
) -> Result<Vec<TaskRow>, sqlx::Error> {
    let mut qb = QueryBuilder::new(ROW_SELECT);
    qb.push(" WHERE t.due_date < ").push_bind(today);
    push_open(&mut qb);
    if let Some(project_id) = project_id {
        qb.push(" AND a.project_id = ").push_bind(project_id);
    }
    qb.push(" ORDER BY t.due_date ASC LIMIT ").push_bind(limit);
    qb.build_query_as::<TaskRow>().fetch_all(pool).await
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    data: &TaskData,
) -> Result<Task, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "INSERT INTO tasks
            (application_id, title, description, priority, status, assignee, assigned_user_id,
             due_date, estimated_hours, actual_hours)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
    )
    .bind(data.application_id)
    .bind(&data.title)
    .bind(&data.description)
    .bind(data.priority.as_str())
    .bind(data.status.as_str())
    .bind(data.assignee.as_str())
    .bind(data.assigned_user_id)
    .bind(data.due_date)
    .bind(data.estimated_hours)
    .bind(data.actual_hours)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_row(pool: &PgPool, id: Uuid) -> Result<Option<TaskRow>, sqlx::Error> {
    sqlx::query_as::<_, TaskRow>(&format!("{ROW_SELECT} WHERE t.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update(pool: &PgPool, id: Uuid, data: &TaskData) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "UPDATE tasks SET application_id = $2, title = $3, description = $4, priority = $5,
                status = $6, assignee = $7, assigned_user_id = $8, due_date = $9,
                estimated_hours = $10, actual_hours = $11, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(data.application_id)
    .bind(&data.title)
    .bind(&data.description)
    .bind(data.priority.as_str())
    .bind(data.status.as_str())
    .bind(data.assignee.as_str())
    .bind(data.assigned_user_id)
    .bind(data.due_date)
    .bind(data.estimated_hours)
    .bind(data.actual_hours)
    .fetch_optional(pool)
    .await
}

pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    status: TaskStatus,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "UPDATE tasks SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await
}

/// A task as shown on the board: short description and display names.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct KanbanCard {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: String,
    #[serde(skip)]
    pub status: String,
    pub assignee: String,
    pub assigned_to: Option<String>,
    pub project: String,
    pub application: String,
    pub due_date: Option<NaiveDate>,
}

/// Every task as a board card, most urgent first within each status.
pub async fn kanban_cards(
    pool: &PgPool,
    project_id: Option<Uuid>,
) -> Result<Vec<KanbanCard>, sqlx::Error> {
    sqlx::query_as::<_, KanbanCard>(
        "SELECT t.id, t.title, LEFT(t.description, 100) AS description, t.priority, t.status,
                t.assignee, u.username AS assigned_to, p.name AS project,
                a.name AS application, t.due_date
         FROM tasks t
         JOIN applications a ON t.application_id = a.id
         JOIN projects p ON a.project_id = p.id
         LEFT JOIN users u ON t.assigned_user_id = u.id
         WHERE ($1::uuid IS NULL OR a.project_id = $1)
         ORDER BY CASE t.priority WHEN 'critical' THEN 0 WHEN 'high' THEN 1 WHEN 'medium' THEN 2 ELSE 3 END,
                  t.due_date ASC NULLS LAST, t.created_at",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

/// Set or clear the user a task is assigned to.
pub async fn assign_user(
    pool: &PgPool,
    id: Uuid,
    user_id: Option<Uuid>,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "UPDATE tasks SET assigned_user_id = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Apply one bulk action to every listed task. Returns how many rows changed.
pub async fn bulk_update(
    pool: &PgPool,
    task_ids: &[Uuid],
    action: &BulkAction,
) -> Result<u64, sqlx::Error> {
    let result = match action {
        BulkAction::SetStatus(status) => {
            sqlx::query("UPDATE tasks SET status = $2, updated_at = now() WHERE id = ANY($1)")
                .bind(task_ids)
                .bind(status.as_str())
                .execute(pool)
                .await?
        }
        BulkAction::ChangeAssignee(assignee) => {
            sqlx::query("UPDATE tasks SET assignee = $2, updated_at = now() WHERE id = ANY($1)")
                .bind(task_ids)
                .bind(assignee.as_str())
                .execute(pool)
                .await?
        }
        BulkAction::UpdateDueDate(date) => {
            sqlx::query("UPDATE tasks SET due_date = $2, updated_at = now() WHERE id = ANY($1)")
                .bind(task_ids)
                .bind(date)
                .execute(pool)
                .await?
        }
    };
    Ok(result.rows_affected())
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
