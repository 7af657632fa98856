pub mod admin;
pub mod applications;
pub mod artifacts;
pub mod auth;
pub mod dashboard;
pub mod decisions;
pub mod export;
pub mod integrations;
pub mod projects;
pub mod search;
pub mod tasks;

use axum::routing::{delete, get, post};
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::Page;
use crate::error::AppError;
use crate::forms::FieldErrors;
use crate::state::SharedState;

const DEFAULT_PER_PAGE: i64 = 20;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        .route("/api/v1/auth/me", get(auth::me).put(auth::update_me))
        // Projects
        .route("/api/v1/projects", get(projects::list).post(projects::create))
        .route(
            "/api/v1/projects/status-distribution",
            get(projects::status_distribution),
        )
        .route(
            "/api/v1/projects/{id}",
            get(projects::get)
                .put(projects::update)
                .delete(projects::delete),
        )
        .route("/api/v1/projects/{id}/progress", get(projects::progress))
        .route("/api/v1/projects/{id}/statistics", get(projects::statistics))
        // Applications
        .route(
            "/api/v1/applications",
            get(applications::list).post(applications::create),
        )
        .route(
            "/api/v1/applications/{id}",
            get(applications::get)
                .put(applications::update)
                .delete(applications::delete),
        )
        .route("/api/v1/applications/{id}/metrics", get(applications::metrics))
        // Artifacts
        .route(
            "/api/v1/artifacts",
            get(artifacts::list).post(artifacts::create),
        )
        .route(
            "/api/v1/artifacts/{id}",
            get(artifacts::get)
                .put(artifacts::update)
                .delete(artifacts::delete),
        )
        .route("/api/v1/artifacts/{id}/file", post(artifacts::upload))
        .route("/api/v1/artifacts/{id}/download", get(artifacts::download))
        .route("/api/v1/artifacts/{id}/versions", get(artifacts::versions))
        // Tasks
        .route("/api/v1/tasks", get(tasks::list).post(tasks::create))
        .route("/api/v1/tasks/bulk", post(tasks::bulk_update))
        .route("/api/v1/tasks/kanban", get(tasks::kanban))
        .route(
            "/api/v1/tasks/{id}",
            get(tasks::get).put(tasks::update).delete(tasks::delete),
        )
        .route("/api/v1/tasks/{id}/status", post(tasks::update_status))
        .route("/api/v1/tasks/{id}/assign", post(tasks::assign))
        // Decisions
        .route(
            "/api/v1/decisions",
            get(decisions::list).post(decisions::create),
        )
        .route(
            "/api/v1/decisions/{id}",
            get(decisions::get)
                .put(decisions::update)
                .delete(decisions::delete),
        )
        // Integrations
        .route(
            "/api/v1/integrations",
            get(integrations::list).post(integrations::create),
        )
        .route(
            "/api/v1/integrations/{id}",
            get(integrations::get)
                .put(integrations::update)
                .delete(integrations::delete),
        )
        // Dashboard
        .route("/api/v1/dashboard/stats", get(dashboard::stats))
        .route("/api/v1/dashboard/chart-data", get(dashboard::chart_data))
        .route(
            "/api/v1/dashboard/recent-activity",
            get(dashboard::recent_activity),
        )
        .route("/api/v1/dashboard/overdue-tasks", get(dashboard::overdue_tasks))
        .route(
            "/api/v1/dashboard/project-health",
            get(dashboard::project_health),
        )
        // Search
        .route("/api/v1/search", get(search::search))
        .route("/api/v1/search/suggestions", get(search::suggestions))
        // Export
        .route("/api/v1/export", get(export::export))
        // Admin
        .route(
            "/api/v1/admin/users",
            get(admin::list_users).post(admin::create_user),
        )
        .route("/api/v1/admin/users/{id}", delete(admin::delete_user))
        .route("/api/v1/admin/audit", get(admin::audit_log))
}

/// One page of a list endpoint.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: Page) -> Self {
        Self {
            items,
            total,
            page: page.number(),
            per_page: page.limit,
            total_pages: page.total_pages(total),
        }
    }
}

pub(crate) fn page_from(page: Option<i64>, per_page: Option<i64>) -> Page {
    Page::new(page, per_page, DEFAULT_PER_PAGE)
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Optional id from a query string; an empty value means "no filter".
pub(crate) fn id_param(name: &str, value: Option<&str>) -> Result<Option<Uuid>, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => Uuid::parse_str(v)
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("Invalid {name} id"))),
    }
}

/// Field error for a submitted id that names no existing record.
pub(crate) fn unknown_choice(field: &str) -> AppError {
    let mut errors = FieldErrors::new();
    errors.add(
        field,
        "Select a valid choice. That choice is not one of the available choices.",
    );
    AppError::Validation(errors)
}

pub(crate) fn deleted() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "message": "Deleted" }))
}
