use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{deleted, id_param, page_from, unknown_choice, Paginated};
use crate::auth::AuthUser;
use crate::db;
use crate::db::integrations::{IntegrationFilter, IntegrationRow};
use crate::error::AppError;
use crate::forms::integration::{check_same_project, IntegrationData, IntegrationInput};
use crate::middleware::audit;
use crate::models::Integration;
use crate::state::SharedState;

const DUPLICATE: &str = "An integration of this type between these applications already exists";

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub project: Option<String>,
    pub application: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub integration_type: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListParams {
    pub(crate) fn filter(&self) -> Result<IntegrationFilter, AppError> {
        Ok(IntegrationFilter {
            project_id: id_param("project", self.project.as_deref())?,
            application_id: id_param("application", self.application.as_deref())?,
            status: self.status.clone(),
            integration_type: self.integration_type.clone(),
        })
    }
}

#[derive(Serialize)]
pub struct IntegrationView<T: Serialize> {
    #[serde(flatten)]
    pub integration: T,
    pub complexity_multiplier: f64,
    pub estimated_hours: i64,
}

impl IntegrationView<IntegrationRow> {
    pub fn from_row(row: IntegrationRow) -> Self {
        Self {
            complexity_multiplier: row.integration.complexity_multiplier(),
            estimated_hours: row.integration.estimated_hours(),
            integration: row,
        }
    }
}

impl From<Integration> for IntegrationView<Integration> {
    fn from(integration: Integration) -> Self {
        Self {
            complexity_multiplier: integration.complexity_multiplier(),
            estimated_hours: integration.estimated_hours(),
            integration,
        }
    }
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<IntegrationView<IntegrationRow>>>, AppError> {
    let filter = params.filter()?;
    let page = page_from(params.page, params.per_page);

    let integrations = db::integrations::list(&state.pool, &filter, page).await?;
    let total = db::integrations::count(&state.pool, &filter).await?;
    let integrations = integrations.into_iter().map(IntegrationView::from_row).collect();

    Ok(Json(Paginated::new(integrations, total, page)))
}

/// Both applications must exist and share a project.
async fn check_applications(state: &SharedState, data: &IntegrationData) -> Result<(), AppError> {
    let from = db::applications::find_by_id(&state.pool, data.from_app_id)
        .await?
        .ok_or_else(|| unknown_choice("from_app_id"))?;
    let to = db::applications::find_by_id(&state.pool, data.to_app_id)
        .await?
        .ok_or_else(|| unknown_choice("to_app_id"))?;
    check_same_project(&from, &to)?;
    Ok(())
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<IntegrationInput>,
) -> Result<Json<IntegrationView<Integration>>, AppError> {
    let data = req.validate()?;
    check_applications(&state, &data).await?;

    let integration = db::integrations::create(&state.pool, &data)
        .await
        .map_err(|e| AppError::from_constraint(e, DUPLICATE))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "integration.created",
        "integration",
        Some(integration.id),
        Some(serde_json::json!({
            "from_app_id": integration.from_app_id,
            "to_app_id": integration.to_app_id,
        })),
    )
    .await;

    Ok(Json(integration.into()))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<IntegrationView<IntegrationRow>>, AppError> {
    let integration = db::integrations::find_row(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Integration not found".to_string()))?;
    Ok(Json(IntegrationView::from_row(integration)))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<IntegrationInput>,
) -> Result<Json<IntegrationView<Integration>>, AppError> {
    let data = req.validate()?;
    check_applications(&state, &data).await?;

    let integration = db::integrations::update(&state.pool, id, &data)
        .await
        .map_err(|e| AppError::from_constraint(e, DUPLICATE))?
        .ok_or_else(|| AppError::NotFound("Integration not found".to_string()))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "integration.updated",
        "integration",
        Some(integration.id),
        None,
    )
    .await;

    Ok(Json(integration.into()))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let removed = db::integrations::delete(&state.pool, id).await?;
    if removed == 0 {
        return Err(AppError::NotFound("Integration not found".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "integration.deleted",
        "integration",
        Some(id),
        None,
    )
    .await;

    Ok(deleted())
}
