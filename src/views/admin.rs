use askama::Template;
use axum::extract::State;
use axum::response::IntoResponse;

use super::{nav, options, render, Nav, SelectOption};
use crate::auth::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::choices::UserRole;
use crate::models::{AuditEvent, User};
use crate::state::SharedState;

const AUDIT_ROWS: i64 = 25;

#[derive(Template)]
#[template(path = "admin/users.html")]
struct UsersTemplate {
    nav: Nav,
    current_user_id: String,
    users: Vec<User>,
    roles: Vec<SelectOption>,
    events: Vec<AuditEvent>,
}

pub async fn users_page(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_admin()?;

    let users = db::users::list_all(&state.pool).await?;
    let events = db::audit::list(&state.pool, None, AUDIT_ROWS, 0).await?;

    let template = UsersTemplate {
        nav: nav(&state, &auth, "admin").await?,
        current_user_id: auth.user_id.to_string(),
        users,
        roles: options(
            UserRole::ALL.iter().map(|r| (r.as_str(), r.label())),
            UserRole::Developer.as_str(),
        ),
        events,
    };
    Ok(render(template))
}
