use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{deleted, id_param, page_from, today, unknown_choice, Paginated};
use crate::auth::AuthUser;
use crate::db;
use crate::db::tasks::{KanbanCard, TaskFilter, TaskRow};
use crate::error::AppError;
use crate::forms::bulk::{BulkAction, BulkTaskInput};
use crate::forms::task::{TaskData, TaskInput};
use crate::forms::FieldErrors;
use crate::middleware::audit;
use crate::models::choices::TaskStatus;
use crate::models::Task;
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub application: Option<String>,
    pub project: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub overdue: bool,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListParams {
    pub(crate) fn filter(&self) -> Result<TaskFilter, AppError> {
        Ok(TaskFilter {
            application_id: id_param("application", self.application.as_deref())?,
            project_id: id_param("project", self.project.as_deref())?,
            status: self.status.clone(),
            priority: self.priority.clone(),
            assignee: self.assignee.clone(),
            search: self.search.clone(),
            overdue_on: self.overdue.then(today),
        })
    }
}

/// A task with its schedule figures.
#[derive(Serialize)]
pub struct TaskView<T: Serialize> {
    #[serde(flatten)]
    pub task: T,
    pub is_overdue: bool,
    pub days_until_due: Option<i64>,
    pub hours_variance: Option<i32>,
}

impl TaskView<Task> {
    pub fn new(task: Task) -> Self {
        let today = today();
        Self {
            is_overdue: task.is_overdue(today),
            days_until_due: task.days_until_due(today),
            hours_variance: task.hours_variance(),
            task,
        }
    }
}

impl TaskView<TaskRow> {
    pub fn from_row(row: TaskRow) -> Self {
        let today = today();
        Self {
            is_overdue: row.task.is_overdue(today),
            days_until_due: row.task.days_until_due(today),
            hours_variance: row.task.hours_variance(),
            task: row,
        }
    }
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<TaskView<TaskRow>>>, AppError> {
    let filter = params.filter()?;
    let page = page_from(params.page, params.per_page);

    let tasks = db::tasks::list(&state.pool, &filter, page).await?;
    let total = db::tasks::count(&state.pool, &filter).await?;
    let tasks = tasks.into_iter().map(TaskView::from_row).collect();

    Ok(Json(Paginated::new(tasks, total, page)))
}

async fn check_references(state: &SharedState, data: &TaskData) -> Result<(), AppError> {
    db::applications::find_by_id(&state.pool, data.application_id)
        .await?
        .ok_or_else(|| unknown_choice("application_id"))?;
    if let Some(user_id) = data.assigned_user_id {
        db::users::find_by_id(&state.pool, user_id)
            .await?
            .ok_or_else(|| unknown_choice("assigned_user_id"))?;
    }
    Ok(())
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<TaskInput>,
) -> Result<Json<TaskView<Task>>, AppError> {
    let data = req.validate(today(), true)?;
    check_references(&state, &data).await?;

    let task = db::tasks::create(&state.pool, &data)
        .await
        .map_err(|e| AppError::from_constraint(e, "Task already exists"))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "task.created",
        "task",
        Some(task.id),
        Some(serde_json::json!({ "title": task.title })),
    )
    .await;

    Ok(Json(TaskView::new(task)))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskView<TaskRow>>, AppError> {
    let task = db::tasks::find_row(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;
    Ok(Json(TaskView::from_row(task)))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TaskInput>,
) -> Result<Json<TaskView<Task>>, AppError> {
    let data = req.validate(today(), false)?;
    check_references(&state, &data).await?;

    let task = db::tasks::update(&state.pool, id, &data)
        .await
        .map_err(|e| AppError::from_constraint(e, "Task already exists"))?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "task.updated",
        "task",
        Some(task.id),
        None,
    )
    .await;

    Ok(Json(TaskView::new(task)))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let removed = db::tasks::delete(&state.pool, id).await?;
    if removed == 0 {
        return Err(AppError::NotFound("Task not found".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "task.deleted",
        "task",
        Some(id),
        None,
    )
    .await;

    Ok(deleted())
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub id: Uuid,
    pub status: TaskStatus,
    pub status_display: &'static str,
}

pub async fn update_status(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let Some(status) = TaskStatus::parse(req.status.trim()) else {
        let mut errors = FieldErrors::new();
        errors.add(
            "status",
            format!(
                "Select a valid choice. '{}' is not one of: {}.",
                req.status,
                TaskStatus::expected()
            ),
        );
        return Err(errors.into());
    };

    let task = db::tasks::update_status(&state.pool, id, status)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "task.status_changed",
        "task",
        Some(task.id),
        Some(serde_json::json!({ "status": status })),
    )
    .await;

    Ok(Json(StatusResponse {
        id: task.id,
        status,
        status_display: status.label(),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct KanbanParams {
    pub project: Option<String>,
}

/// One board column per task status, in workflow order.
#[derive(Serialize)]
pub struct KanbanColumn {
    pub status: TaskStatus,
    pub label: &'static str,
    pub tasks: Vec<KanbanCard>,
}

pub async fn kanban(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<KanbanParams>,
) -> Result<Json<Vec<KanbanColumn>>, AppError> {
    let project_id = id_param("project", params.project.as_deref())?;
    let cards = db::tasks::kanban_cards(&state.pool, project_id).await?;

    let columns = TaskStatus::ALL
        .iter()
        .map(|&status| KanbanColumn {
            status,
            label: status.label(),
            tasks: cards
                .iter()
                .filter(|card| card.status == status.as_str())
                .cloned()
                .collect(),
        })
        .collect();

    Ok(Json(columns))
}

#[derive(Deserialize)]
pub struct AssignRequest {
    pub assigned_user_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct AssignResponse {
    pub id: Uuid,
    pub assigned_user_id: Option<Uuid>,
    pub assigned_to: Option<String>,
}

/// Point a task at a user account, or clear it with a null id.
pub async fn assign(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignRequest>,
) -> Result<Json<AssignResponse>, AppError> {
    let assigned_to = match req.assigned_user_id {
        Some(user_id) => Some(
            db::users::find_by_id(&state.pool, user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("User not found".to_string()))?
                .username,
        ),
        None => None,
    };

    let task = db::tasks::assign_user(&state.pool, id, req.assigned_user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "task.assigned",
        "task",
        Some(task.id),
        Some(serde_json::json!({ "assigned_to": assigned_to })),
    )
    .await;

    Ok(Json(AssignResponse {
        id: task.id,
        assigned_user_id: task.assigned_user_id,
        assigned_to,
    }))
}

#[derive(Serialize)]
pub struct BulkResponse {
    pub updated: u64,
    pub message: String,
}

pub async fn bulk_update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<BulkTaskInput>,
) -> Result<Json<BulkResponse>, AppError> {
    let operation = req.validate()?;

    let updated = db::tasks::bulk_update(&state.pool, &operation.task_ids, &operation.action).await?;

    let (action, message) = match &operation.action {
        BulkAction::SetStatus(status) => (
            "status",
            format!("Marked {updated} tasks as {}.", status.label()),
        ),
        BulkAction::ChangeAssignee(assignee) => (
            "assignee",
            format!("Assigned {updated} tasks to {}.", assignee.label()),
        ),
        BulkAction::UpdateDueDate(date) => (
            "due_date",
            format!("Updated due date for {updated} tasks to {date}."),
        ),
    };

    tracing::info!(updated, action, "Bulk task update");
    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "task.bulk_updated",
        "task",
        None,
        Some(serde_json::json!({
            "action": action,
            "task_ids": operation.task_ids,
            "updated": updated,
        })),
    )
    .await;

    Ok(Json(BulkResponse { updated, message }))
}
