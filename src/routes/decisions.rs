use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{deleted, id_param, page_from, today, unknown_choice, Paginated};
use crate::auth::AuthUser;
use crate::db;
use crate::db::decisions::{DecisionFilter, DecisionRow};
use crate::error::AppError;
use crate::forms::decision::{DecisionData, DecisionInput};
use crate::middleware::audit;
use crate::models::Decision;
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub project: Option<String>,
    pub status: Option<String>,
    pub impact: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListParams {
    pub(crate) fn filter(&self) -> Result<DecisionFilter, AppError> {
        Ok(DecisionFilter {
            project_id: id_param("project", self.project.as_deref())?,
            status: self.status.clone(),
            impact: self.impact.clone(),
            search: self.search.clone(),
        })
    }
}

#[derive(Serialize)]
pub struct DecisionView<T: Serialize> {
    #[serde(flatten)]
    pub decision: T,
    pub days_since_creation: i64,
    pub is_pending_too_long: bool,
}

impl DecisionView<DecisionRow> {
    pub fn from_row(row: DecisionRow) -> Self {
        let today = today();
        Self {
            days_since_creation: row.decision.days_since_creation(today),
            is_pending_too_long: row.decision.is_pending_too_long(today),
            decision: row,
        }
    }
}

impl From<Decision> for DecisionView<Decision> {
    fn from(decision: Decision) -> Self {
        let today = today();
        Self {
            days_since_creation: decision.days_since_creation(today),
            is_pending_too_long: decision.is_pending_too_long(today),
            decision,
        }
    }
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<DecisionView<DecisionRow>>>, AppError> {
    let filter = params.filter()?;
    let page = page_from(params.page, params.per_page);

    let decisions = db::decisions::list(&state.pool, &filter, page).await?;
    let total = db::decisions::count(&state.pool, &filter).await?;
    let decisions = decisions.into_iter().map(DecisionView::from_row).collect();

    Ok(Json(Paginated::new(decisions, total, page)))
}

async fn check_project(state: &SharedState, data: &DecisionData) -> Result<(), AppError> {
    db::projects::find_by_id(&state.pool, data.project_id)
        .await?
        .ok_or_else(|| unknown_choice("project_id"))?;
    Ok(())
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<DecisionInput>,
) -> Result<Json<DecisionView<Decision>>, AppError> {
    let data = req.validate()?;
    check_project(&state, &data).await?;

    let decision = db::decisions::create(&state.pool, &data)
        .await
        .map_err(|e| AppError::from_constraint(e, "Decision already exists"))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "decision.created",
        "decision",
        Some(decision.id),
        Some(serde_json::json!({ "title": decision.title })),
    )
    .await;

    Ok(Json(decision.into()))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DecisionView<DecisionRow>>, AppError> {
    let decision = db::decisions::find_row(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Decision not found".to_string()))?;
    Ok(Json(DecisionView::from_row(decision)))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<DecisionInput>,
) -> Result<Json<DecisionView<Decision>>, AppError> {
    let data = req.validate()?;
    check_project(&state, &data).await?;

    let decision = db::decisions::update(&state.pool, id, &data)
        .await
        .map_err(|e| AppError::from_constraint(e, "Decision already exists"))?
        .ok_or_else(|| AppError::NotFound("Decision not found".to_string()))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "decision.updated",
        "decision",
        Some(decision.id),
        Some(serde_json::json!({ "status": decision.status })),
    )
    .await;

    Ok(Json(decision.into()))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let removed = db::decisions::delete(&state.pool, id).await?;
    if removed == 0 {
        return Err(AppError::NotFound("Decision not found".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "decision.deleted",
        "decision",
        Some(id),
        None,
    )
    .await;

    Ok(deleted())
}
