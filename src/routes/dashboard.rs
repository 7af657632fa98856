use axum::extract::{Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{id_param, today};
use crate::auth::AuthUser;
use crate::db;
use crate::db::stats::{MonthlyTasks, Overview, StatusCount};
use crate::error::AppError;
use crate::models::completion_percentage;
use crate::state::SharedState;

const WIDGET_LIMIT: i64 = 10;
const CHART_WINDOW_DAYS: i64 = 365;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    pub project: Option<String>,
    #[serde(rename = "type")]
    pub chart_type: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    #[serde(flatten)]
    pub overview: Overview,
    pub project_completion_rate: f64,
    pub app_completion_rate: f64,
    pub task_completion_rate: f64,
}

impl From<Overview> for DashboardStats {
    fn from(overview: Overview) -> Self {
        Self {
            project_completion_rate: completion_percentage(
                overview.completed_projects,
                overview.total_projects,
            ),
            app_completion_rate: completion_percentage(
                overview.production_applications,
                overview.total_applications,
            ),
            task_completion_rate: completion_percentage(
                overview.completed_tasks,
                overview.total_tasks,
            ),
            overview,
        }
    }
}

pub async fn stats(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardStats>, AppError> {
    let project_id = id_param("project", params.project.as_deref())?;
    let overview = db::stats::overview(&state.pool, project_id).await?;
    Ok(Json(overview.into()))
}

/// Month labels ("January 2026") with completed and total task series.
pub(crate) fn monthly_chart(rows: &[MonthlyTasks]) -> serde_json::Value {
    json!({
        "labels": rows.iter().map(|r| r.month.format("%B %Y").to_string()).collect::<Vec<_>>(),
        "datasets": [
            {
                "label": "Completed Tasks",
                "data": rows.iter().map(|r| r.completed).collect::<Vec<_>>(),
            },
            {
                "label": "Total Tasks",
                "data": rows.iter().map(|r| r.total).collect::<Vec<_>>(),
            },
        ],
    })
}

pub(crate) fn status_chart(rows: &[StatusCount]) -> serde_json::Value {
    json!({
        "labels": rows
            .iter()
            .map(|r| {
                crate::models::choices::ProjectStatus::parse(&r.status)
                    .map(|s| s.label().to_string())
                    .unwrap_or_else(|| r.status.clone())
            })
            .collect::<Vec<_>>(),
        "data": rows.iter().map(|r| r.count).collect::<Vec<_>>(),
    })
}

pub(crate) async fn monthly_tasks(
    state: &SharedState,
    project_id: Option<Uuid>,
) -> Result<Vec<MonthlyTasks>, AppError> {
    let since = Utc::now() - Duration::days(CHART_WINDOW_DAYS);
    Ok(db::stats::monthly_tasks(&state.pool, project_id, since).await?)
}

pub async fn chart_data(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let project_id = id_param("project", params.project.as_deref())?;

    match params.chart_type.as_deref().unwrap_or("monthly_tasks") {
        "monthly_tasks" => {
            let rows = monthly_tasks(&state, project_id).await?;
            Ok(Json(monthly_chart(&rows)))
        }
        "project_status" => {
            let rows = db::stats::project_status_distribution(&state.pool, project_id).await?;
            Ok(Json(status_chart(&rows)))
        }
        _ => Err(AppError::BadRequest("Invalid chart type".to_string())),
    }
}

#[derive(Serialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub url: String,
}

pub async fn recent_activity(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let limit = params.limit.unwrap_or(WIDGET_LIMIT).clamp(1, 50);
    let activities: Vec<Activity> = db::tasks::recent(&state.pool, limit)
        .await?
        .into_iter()
        .map(|row| Activity {
            kind: "task",
            id: row.task.id,
            description: format!("in {}", row.application_name),
            title: row.task.title,
            status: row.task.status,
            timestamp: row.task.updated_at,
            url: format!("/tasks/{}", row.task.id),
        })
        .collect();

    Ok(Json(json!({ "activities": activities })))
}

#[derive(Serialize)]
pub struct OverdueTask {
    pub id: Uuid,
    pub title: String,
    pub project: String,
    pub application: String,
    pub due_date: Option<chrono::NaiveDate>,
    pub days_overdue: i64,
    pub url: String,
}

pub async fn overdue_tasks(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let project_id = id_param("project", params.project.as_deref())?;
    let today = today();

    let tasks: Vec<OverdueTask> = db::tasks::overdue(&state.pool, today, project_id, WIDGET_LIMIT)
        .await?
        .into_iter()
        .map(|row| OverdueTask {
            id: row.task.id,
            days_overdue: row
                .task
                .days_until_due(today)
                .map(|d| -d)
                .unwrap_or_default(),
            title: row.task.title,
            project: row.project_name,
            application: row.application_name,
            due_date: row.task.due_date,
            url: format!("/tasks/{}", row.task.id),
        })
        .collect();

    Ok(Json(json!({ "overdue_tasks": tasks })))
}

#[derive(Serialize)]
pub struct ProjectHealth {
    pub project_id: Uuid,
    pub project_name: String,
    pub health_score: f64,
    pub completion_percentage: f64,
    pub status: String,
    pub is_overdue: bool,
}

pub async fn project_health(
    _auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let projects = db::projects::list_all(&state.pool).await?;
    let health: Vec<ProjectHealth> = super::projects::summarize(&state, projects)
        .await?
        .into_iter()
        .map(|s| ProjectHealth {
            project_id: s.project.id,
            project_name: s.project.name,
            health_score: s.health_score,
            completion_percentage: s.completion_percentage,
            status: s.project.status,
            is_overdue: s.is_overdue,
        })
        .collect();

    Ok(Json(json!({ "project_health": health })))
}
