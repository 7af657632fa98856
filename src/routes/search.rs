use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::db;
use crate::db::search::SearchHit;
use crate::error::AppError;
use crate::state::SharedState;

pub const RESULTS_PER_TYPE: i64 = 5;
const SUGGESTIONS_PER_TYPE: i64 = 3;
const MIN_SUGGESTION_LEN: usize = 2;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub hit: SearchHit,
    pub url: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
}

pub(crate) async fn run_search(state: &SharedState, query: &str) -> Result<Vec<SearchResult>, AppError> {
    if query.is_empty() {
        return Ok(Vec::new());
    }
    let hits = db::search::search(&state.pool, query, RESULTS_PER_TYPE).await?;
    Ok(hits
        .into_iter()
        .map(|hit| SearchResult {
            url: hit.url(),
            hit,
        })
        .collect())
}

pub async fn search(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let query = params.q.as_deref().unwrap_or("").trim().to_string();
    let results = run_search(&state, &query).await?;
    Ok(Json(SearchResponse { query, results }))
}

#[derive(Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

pub async fn suggestions(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SuggestionsResponse>, AppError> {
    let query = params.q.as_deref().unwrap_or("").trim();
    if query.chars().count() < MIN_SUGGESTION_LEN {
        return Ok(Json(SuggestionsResponse {
            suggestions: Vec::new(),
        }));
    }

    let suggestions = db::search::suggestions(&state.pool, query, SUGGESTIONS_PER_TYPE).await?;
    Ok(Json(SuggestionsResponse { suggestions }))
}
