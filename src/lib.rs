pub mod config;
pub mod error;
pub mod state;
pub mod auth;
pub mod db;
pub mod models;
pub mod forms;
pub mod middleware;
pub mod routes;
pub mod views;
pub mod storage;
pub mod export;
pub mod seed;
pub mod rate_limit;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::middleware::auth_redirect::redirect_unauthorized;
use crate::rate_limit::LoginRateLimiter;
use crate::state::{AppState, SharedState};
use crate::storage::LocalFileStore;

/// Room for multipart boundaries and headers on top of the file itself.
const UPLOAD_OVERHEAD: usize = 64 * 1024;

pub fn build_app(pool: PgPool, config: Config) -> Router {
    router(build_state(pool, config))
}

pub fn build_state(pool: PgPool, config: Config) -> SharedState {
    let store = Arc::new(LocalFileStore::new(config.media_root.clone()));
    Arc::new(AppState {
        pool,
        config,
        store,
        login_limiter: LoginRateLimiter::default(),
    })
}

pub fn router(state: SharedState) -> Router {
    let body_limit = state.config.max_upload_size + UPLOAD_OVERHEAD;

    Router::new()
        .merge(routes::api_routes())
        .merge(views::public_routes())
        .merge(views::view_routes().layer(axum::middleware::from_fn(redirect_unauthorized)))
        .nest_service("/static", ServeDir::new("static"))
        .route("/health", axum::routing::get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
