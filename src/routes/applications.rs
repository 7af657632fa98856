use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{deleted, id_param, page_from, today, unknown_choice, Paginated};
use crate::auth::AuthUser;
use crate::db;
use crate::db::applications::{ApplicationFilter, ApplicationRow};
use crate::error::AppError;
use crate::forms::application::{ApplicationData, ApplicationInput};
use crate::middleware::audit;
use crate::models::{completion_percentage, Application};
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub project: Option<String>,
    pub status: Option<String>,
    pub complexity: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListParams {
    pub(crate) fn filter(&self) -> Result<ApplicationFilter, AppError> {
        Ok(ApplicationFilter {
            project_id: id_param("project", self.project.as_deref())?,
            status: self.status.clone(),
            complexity: self.complexity.clone(),
            search: self.search.clone(),
        })
    }
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<ApplicationRow>>, AppError> {
    let filter = params.filter()?;
    let page = page_from(params.page, params.per_page);

    let applications = db::applications::list(&state.pool, &filter, page).await?;
    let total = db::applications::count(&state.pool, &filter).await?;

    Ok(Json(Paginated::new(applications, total, page)))
}

/// Field errors for a project that does not exist or a name already taken
/// inside it.
async fn check_placement(
    state: &SharedState,
    data: &ApplicationData,
    current: Option<Uuid>,
) -> Result<(), AppError> {
    db::projects::find_by_id(&state.pool, data.project_id)
        .await?
        .ok_or_else(|| unknown_choice("project_id"))?;

    if let Some(clash) =
        db::applications::find_by_name(&state.pool, data.project_id, &data.name).await?
    {
        if Some(clash.id) != current {
            let mut errors = crate::forms::FieldErrors::new();
            errors.add(
                "name",
                "An application with this name already exists in the project.",
            );
            return Err(errors.into());
        }
    }
    Ok(())
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<ApplicationInput>,
) -> Result<Json<Application>, AppError> {
    let data = req.validate()?;
    check_placement(&state, &data, None).await?;

    let application = db::applications::create(&state.pool, &data)
        .await
        .map_err(|e| {
            AppError::from_constraint(e, "An application with this name already exists in the project")
        })?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "application.created",
        "application",
        Some(application.id),
        Some(serde_json::json!({ "name": application.name })),
    )
    .await;

    Ok(Json(application))
}

#[derive(Serialize)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: ApplicationRow,
    pub days_to_target: Option<i64>,
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationDetail>, AppError> {
    let application = db::applications::find_row(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;

    Ok(Json(ApplicationDetail {
        days_to_target: application.application.days_to_target(today()),
        application,
    }))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ApplicationInput>,
) -> Result<Json<Application>, AppError> {
    let data = req.validate()?;
    check_placement(&state, &data, Some(id)).await?;

    let application = db::applications::update(&state.pool, id, &data)
        .await
        .map_err(|e| {
            AppError::from_constraint(e, "An application with this name already exists in the project")
        })?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "application.updated",
        "application",
        Some(application.id),
        None,
    )
    .await;

    Ok(Json(application))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let removed = db::applications::delete(&state.pool, id).await?;
    if removed == 0 {
        return Err(AppError::NotFound("Application not found".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "application.deleted",
        "application",
        Some(id),
        None,
    )
    .await;

    Ok(deleted())
}

#[derive(Serialize)]
pub struct ApplicationMetrics {
    pub tasks_total: i64,
    pub tasks_completed: i64,
    pub completion_percentage: f64,
    pub artifacts_count: i64,
    pub integrations_count: i64,
    pub latest_version: String,
    pub features_count: usize,
    pub tech_stack_count: usize,
}

pub async fn metrics(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationMetrics>, AppError> {
    let application = db::applications::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;
    let counts = db::stats::application_counts(&state.pool, id).await?;

    Ok(Json(ApplicationMetrics {
        tasks_total: counts.tasks_total,
        tasks_completed: counts.tasks_completed,
        completion_percentage: completion_percentage(counts.tasks_completed, counts.tasks_total),
        artifacts_count: counts.artifacts_count,
        integrations_count: counts.integrations_count,
        latest_version: application.version,
        features_count: application.features.0.len(),
        tech_stack_count: application.tech_stack.0.len(),
    }))
}
