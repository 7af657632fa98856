use askama::Template;
use axum::extract::State;
use axum::response::IntoResponse;

use super::{nav, options, render, Nav, SelectOption};
use crate::auth::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::choices::UserRole;
use crate::models::User;
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "profile.html")]
struct ProfileTemplate {
    nav: Nav,
    user: User,
    roles: Vec<SelectOption>,
}

pub async fn page(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    let roles = options(UserRole::ALL.iter().map(|r| (r.as_str(), r.label())), &user.role);
    let template = ProfileTemplate {
        nav: nav(&state, &auth, "profile").await?,
        user,
        roles,
    };
    Ok(render(template))
}
