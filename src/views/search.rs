use askama::Template;
use axum::extract::{Query, State};
use axum::response::IntoResponse;

use super::{nav, render, Nav};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::routes::search::{run_search, SearchParams, SearchResult};
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "search.html")]
struct SearchTemplate {
    nav: Nav,
    query: String,
    results: Vec<SearchResult>,
}

pub async fn page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = params.q.unwrap_or_default().trim().to_string();
    let results = if query.is_empty() {
        Vec::new()
    } else {
        run_search(&state, &query).await?
    };

    let template = SearchTemplate {
        nav: nav(&state, &auth, "search").await?,
        query,
        results,
    };
    Ok(render(template))
}
