use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::{deleted, page_from, Paginated};
use crate::auth::{password, AuthUser};
use crate::db;
use crate::db::users::NewUser;
use crate::error::AppError;
use crate::forms::auth::RegisterInput;
use crate::middleware::audit;
use crate::models::{AuditEvent, User};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateUser {
    #[serde(flatten)]
    pub account: RegisterInput,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditParams {
    pub resource_type: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn list_users(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<User>>, AppError> {
    auth.require_admin()?;
    let users = db::users::list_all(&state.pool).await?;
    Ok(Json(users))
}

pub async fn create_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateUser>,
) -> Result<Json<User>, AppError> {
    auth.require_admin()?;

    let data = req.account.validate()?;
    let pw_hash = password::hash(&data.password).map_err(AppError::Internal)?;

    let user = db::users::create(
        &state.pool,
        &NewUser {
            username: &data.username,
            email: &data.email,
            password_hash: &pw_hash,
            first_name: &data.first_name,
            last_name: &data.last_name,
            role: data.role.as_str(),
            is_admin: req.is_admin,
        },
    )
    .await
    .map_err(|e| AppError::from_constraint(e, "A user with that username or email already exists"))?;

    tracing::info!(username = %user.username, created_by = %auth.username, "User created");
    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "user.created",
        "user",
        Some(user.id),
        Some(serde_json::json!({ "username": user.username, "is_admin": user.is_admin })),
    )
    .await;

    Ok(Json(user))
}

pub async fn delete_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;

    if id == auth.user_id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    let removed = db::users::delete(&state.pool, id).await?;
    if removed == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "user.deleted",
        "user",
        Some(id),
        None,
    )
    .await;

    Ok(deleted())
}

pub async fn audit_log(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<AuditParams>,
) -> Result<Json<Paginated<AuditEvent>>, AppError> {
    auth.require_admin()?;

    let page = page_from(params.page, params.per_page);
    let resource_type = params.resource_type.as_deref().filter(|t| !t.is_empty());
    let events = db::audit::list(&state.pool, resource_type, page.limit, page.offset).await?;
    let total = db::audit::count(&state.pool, resource_type).await?;

    Ok(Json(Paginated::new(events, total, page)))
}
