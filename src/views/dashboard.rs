use askama::Template;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use chrono::{Duration, Utc};
use serde::Deserialize;

use super::{fmt_opt_date, fmt_time, nav, options, project_options, render, Nav, SelectOption};
use crate::auth::AuthUser;
use crate::db;
use crate::db::artifacts::ArtifactFilter;
use crate::error::AppError;
use crate::routes::dashboard::{monthly_chart, monthly_tasks, status_chart, DashboardStats};
use crate::routes::{id_param, page_from, today};
use crate::state::SharedState;

const DEFAULT_RANGE_DAYS: i64 = 30;
const WIDGET_LIMIT: i64 = 10;
const RANGES: &[(&str, &str)] = &[
    ("7", "Last 7 days"),
    ("30", "Last 30 days"),
    ("90", "Last 90 days"),
    ("365", "Last year"),
];

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub date_range: Option<String>,
    pub project: Option<String>,
}

pub struct WidgetRow {
    pub url: String,
    pub title: String,
    pub meta: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    nav: Nav,
    stats: DashboardStats,
    ranges: Vec<SelectOption>,
    projects: Vec<SelectOption>,
    recent_artifacts: Vec<WidgetRow>,
    overdue_tasks: Vec<WidgetRow>,
    pending_decisions: Vec<WidgetRow>,
    chart_data: String,
    status_distribution: String,
}

pub async fn index(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(q): Query<DashboardQuery>,
) -> Result<impl IntoResponse, AppError> {
    // Unparseable ranges fall back to the default window.
    let days = q
        .date_range
        .as_deref()
        .and_then(|d| d.parse::<i64>().ok())
        .filter(|d| *d > 0)
        .unwrap_or(DEFAULT_RANGE_DAYS);
    let project_id = id_param("project", q.project.as_deref())?;
    let today = today();

    let overview = db::stats::overview(&state.pool, project_id).await?;

    let recent_artifacts = db::artifacts::list(
        &state.pool,
        &ArtifactFilter {
            project_id,
            updated_since: Some(Utc::now() - Duration::days(days)),
            ..Default::default()
        },
        page_from(Some(1), Some(WIDGET_LIMIT)),
    )
    .await?
    .into_iter()
    .map(|r| WidgetRow {
        url: format!("/artifacts/{}", r.artifact.id),
        meta: format!(
            "{} · {}",
            r.application_name.unwrap_or_default(),
            fmt_time(r.artifact.updated_at)
        ),
        title: r.artifact.name,
    })
    .collect();

    let overdue_tasks = db::tasks::overdue(&state.pool, today, project_id, WIDGET_LIMIT)
        .await?
        .into_iter()
        .map(|r| WidgetRow {
            url: format!("/tasks/{}", r.task.id),
            meta: format!("{} · due {}", r.application_name, fmt_opt_date(r.task.due_date)),
            title: r.task.title,
        })
        .collect();

    let pending_decisions = db::decisions::pending(&state.pool, project_id, WIDGET_LIMIT)
        .await?
        .into_iter()
        .map(|r| WidgetRow {
            url: format!("/decisions/{}", r.decision.id),
            meta: format!("{} · {} days open", r.project_name, r.decision.days_since_creation(today)),
            title: r.decision.title,
        })
        .collect();

    let monthly = monthly_tasks(&state, project_id).await?;
    let distribution = db::stats::project_status_distribution(&state.pool, project_id).await?;

    let selected_range = days.to_string();
    let selected_project = project_id.map(|p| p.to_string()).unwrap_or_default();

    let template = DashboardTemplate {
        nav: nav(&state, &auth, "dashboard").await?,
        stats: overview.into(),
        ranges: options(RANGES.iter().copied(), &selected_range),
        projects: project_options(&state, &selected_project).await?,
        recent_artifacts,
        overdue_tasks,
        pending_decisions,
        chart_data: monthly_chart(&monthly).to_string(),
        status_distribution: status_chart(&distribution).to_string(),
    };
    Ok(render(template))
}
