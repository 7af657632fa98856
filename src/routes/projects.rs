use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{deleted, id_param, page_from, today, unknown_choice, Paginated};
use crate::auth::AuthUser;
use crate::db;
use crate::db::projects::ProjectFilter;
use crate::db::stats::{ApplicationProgress, ProjectStatistics, StatusCount};
use crate::error::AppError;
use crate::forms::project::ProjectInput;
use crate::middleware::audit;
use crate::models::{completion_percentage, Application, ProjectSummary};
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub owner: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListParams {
    pub(crate) fn filter(&self) -> Result<ProjectFilter, AppError> {
        Ok(ProjectFilter {
            search: self.search.clone(),
            status: self.status.clone(),
            owner_id: id_param("owner", self.owner.as_deref())?,
        })
    }
}

#[derive(Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub summary: ProjectSummary,
    pub applications: Vec<Application>,
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<ProjectSummary>>, AppError> {
    let filter = params.filter()?;
    let page = page_from(params.page, params.per_page);

    let projects = db::projects::list(&state.pool, &filter, page).await?;
    let total = db::projects::count(&state.pool, &filter).await?;
    let summaries = summarize(&state, projects).await?;

    Ok(Json(Paginated::new(summaries, total, page)))
}

/// Attach task counts and derived figures to each project.
pub(crate) async fn summarize(
    state: &SharedState,
    projects: Vec<crate::models::Project>,
) -> Result<Vec<ProjectSummary>, AppError> {
    let counts: HashMap<Uuid, (i64, i64)> = db::stats::task_counts_by_project(&state.pool)
        .await?
        .into_iter()
        .map(|c| (c.project_id, (c.total, c.completed)))
        .collect();
    let today = today();

    Ok(projects
        .into_iter()
        .map(|p| {
            let (total, completed) = counts.get(&p.id).copied().unwrap_or_default();
            ProjectSummary::new(p, total, completed, today)
        })
        .collect())
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<ProjectInput>,
) -> Result<Json<ProjectSummary>, AppError> {
    let data = req.validate()?;

    let owner_id = match data.owner_id {
        Some(owner_id) => {
            db::users::find_by_id(&state.pool, owner_id)
                .await?
                .ok_or_else(|| unknown_choice("owner_id"))?;
            owner_id
        }
        None => auth.user_id,
    };

    let project = db::projects::create(&state.pool, owner_id, &data)
        .await
        .map_err(|e| AppError::from_constraint(e, "Project already exists"))?;

    tracing::info!(project = %project.name, "Project created");
    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.created",
        "project",
        Some(project.id),
        Some(serde_json::json!({ "name": project.name })),
    )
    .await;

    Ok(Json(ProjectSummary::new(project, 0, 0, today())))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectDetail>, AppError> {
    let project = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let counts = db::stats::project_task_counts(&state.pool, id).await?;
    let applications = db::applications::list_by_project(&state.pool, id).await?;

    Ok(Json(ProjectDetail {
        summary: ProjectSummary::new(project, counts.total, counts.completed, today()),
        applications,
    }))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProjectInput>,
) -> Result<Json<ProjectSummary>, AppError> {
    let existing = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    auth.require_owner_or_admin(existing.owner_id)?;

    let data = req.validate()?;
    let owner_id = match data.owner_id {
        Some(owner_id) if owner_id != existing.owner_id => {
            db::users::find_by_id(&state.pool, owner_id)
                .await?
                .ok_or_else(|| unknown_choice("owner_id"))?;
            owner_id
        }
        _ => existing.owner_id,
    };

    let project = db::projects::update(&state.pool, id, owner_id, &data)
        .await
        .map_err(|e| AppError::from_constraint(e, "Project already exists"))?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.updated",
        "project",
        Some(project.id),
        None,
    )
    .await;

    let counts = db::stats::project_task_counts(&state.pool, id).await?;
    Ok(Json(ProjectSummary::new(project, counts.total, counts.completed, today())))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let existing = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    auth.require_owner_or_admin(existing.owner_id)?;

    db::projects::delete(&state.pool, id).await?;

    tracing::info!(project = %existing.name, "Project deleted");
    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.deleted",
        "project",
        Some(id),
        Some(serde_json::json!({ "name": existing.name })),
    )
    .await;

    Ok(deleted())
}

#[derive(Serialize)]
pub struct ApplicationProgressEntry {
    #[serde(flatten)]
    pub counts: ApplicationProgress,
    pub progress: f64,
}

#[derive(Serialize)]
pub struct ProjectProgress {
    pub project_id: Uuid,
    pub name: String,
    pub completion_percentage: f64,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub applications: Vec<ApplicationProgressEntry>,
}

pub async fn progress(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectProgress>, AppError> {
    let project = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let counts = db::stats::project_task_counts(&state.pool, id).await?;
    let applications = db::stats::application_progress(&state.pool, id)
        .await?
        .into_iter()
        .map(|counts| ApplicationProgressEntry {
            progress: completion_percentage(counts.completed, counts.total),
            counts,
        })
        .collect();

    Ok(Json(ProjectProgress {
        project_id: project.id,
        name: project.name,
        completion_percentage: counts.completion_percentage(),
        total_tasks: counts.total,
        completed_tasks: counts.completed,
        applications,
    }))
}

pub async fn statistics(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectStatistics>, AppError> {
    db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let stats = db::stats::project_statistics(&state.pool, id, today()).await?;
    Ok(Json(stats))
}

#[derive(Serialize)]
pub struct StatusDistribution {
    pub distribution: Vec<StatusCount>,
}

pub async fn status_distribution(
    _auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<StatusDistribution>, AppError> {
    let distribution = db::stats::project_status_distribution(&state.pool, None).await?;
    Ok(Json(StatusDistribution { distribution }))
}
