use askama::Template;
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::{options, Nav, SelectOption};
use crate::auth::jwt;
use crate::config::RegistrationMode;
use crate::db;
use crate::models::choices::UserRole;
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    nav: Nav,
    next: String,
    registration_open: bool,
}

#[derive(Template)]
#[template(path = "auth/register.html")]
struct RegisterTemplate {
    nav: Nav,
    roles: Vec<SelectOption>,
    first_user: bool,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

fn signed_in(state: &SharedState, jar: &CookieJar) -> bool {
    jar.get("access_token")
        .is_some_and(|c| jwt::verify_access_token(c.value(), &state.config.jwt_secret).is_ok())
}

/// Only same-site paths are accepted as a post-login destination.
fn safe_next(next: Option<String>) -> String {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//"))
        .unwrap_or_else(|| "/dashboard".to_string())
}

pub async fn login_page(
    State(state): State<SharedState>,
    jar: CookieJar,
    Query(q): Query<LoginQuery>,
) -> Response {
    let next = safe_next(q.next);
    if signed_in(&state, &jar) {
        return Redirect::to(&next).into_response();
    }

    let template = LoginTemplate {
        nav: Nav::anonymous(),
        next,
        registration_open: state.config.registration == RegistrationMode::Open,
    };
    Html(template.render().unwrap_or_default()).into_response()
}

pub async fn register_page(State(state): State<SharedState>, jar: CookieJar) -> Response {
    if signed_in(&state, &jar) {
        return Redirect::to("/dashboard").into_response();
    }

    let first_user = db::users::count_all(&state.pool).await.unwrap_or(1) == 0;
    if !first_user && state.config.registration == RegistrationMode::Closed {
        return Redirect::to("/auth/login").into_response();
    }

    let template = RegisterTemplate {
        nav: Nav::anonymous(),
        roles: options(
            UserRole::ALL.iter().map(|r| (r.as_str(), r.label())),
            UserRole::Developer.as_str(),
        ),
        first_user,
    };
    Html(template.render().unwrap_or_default()).into_response()
}
