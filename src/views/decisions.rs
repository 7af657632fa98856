use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use uuid::Uuid;

use super::{
    fmt_opt_date, fmt_time, label_or_raw, nav, options, project_options, render, DetailField,
    DetailTemplate, FormField, FormTemplate, ListRow, ListTemplate, Pagination,
};
use crate::auth::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::choices::{DecisionImpact, DecisionStatus};
use crate::models::Decision;
use crate::routes::decisions::ListParams;
use crate::routes::{page_from, today};
use crate::state::SharedState;

fn status_label(status: &str) -> String {
    label_or_raw(status, |s| DecisionStatus::parse(s).map(|c| c.label()))
}

fn impact_label(impact: &str) -> String {
    label_or_raw(impact, |s| DecisionImpact::parse(s).map(|c| c.label()))
}

pub async fn list_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = params.filter()?;
    let page = page_from(params.page, params.per_page);
    let decisions = db::decisions::list(&state.pool, &filter, page).await?;
    let total = db::decisions::count(&state.pool, &filter).await?;
    let today = today();

    let rows = decisions
        .into_iter()
        .map(|r| {
            let mut status = status_label(&r.decision.status);
            if r.decision.is_pending_too_long(today) {
                status.push_str(" (stale)");
            }
            ListRow {
                id: r.decision.id.to_string(),
                url: format!("/decisions/{}", r.decision.id),
                cells: vec![
                    r.decision.title.clone(),
                    r.project_name.clone(),
                    status,
                    impact_label(&r.decision.impact),
                    fmt_opt_date(r.decision.decided_date),
                ],
            }
        })
        .collect();

    let project = params.project.clone().unwrap_or_default();
    let status = params.status.clone().unwrap_or_default();
    let impact = params.impact.clone().unwrap_or_default();
    let search = params.search.clone().unwrap_or_default();

    let template = ListTemplate {
        nav: nav(&state, &auth, "decisions").await?,
        title: "Decisions",
        new_url: "/decisions/new".to_string(),
        filters: vec![
            FormField::new("search", "Search", "text").value(search.clone()),
            FormField::new("project", "Project", "select")
                .choices(Some("All projects"), project_options(&state, &project).await?),
            FormField::new("status", "Status", "select").choices(
                Some("All statuses"),
                options(DecisionStatus::ALL.iter().map(|s| (s.as_str(), s.label())), &status),
            ),
            FormField::new("impact", "Impact", "select").choices(
                Some("Any impact"),
                options(DecisionImpact::ALL.iter().map(|i| (i.as_str(), i.label())), &impact),
            ),
        ],
        columns: vec!["Title", "Project", "Status", "Impact", "Decided"],
        rows,
        pagination: Pagination::new(
            "/decisions",
            &[
                ("search", search),
                ("project", project),
                ("status", status),
                ("impact", impact),
            ],
            page,
            total,
        ),
        bulk: None,
    };
    Ok(render(template))
}

pub async fn detail_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let row = db::decisions::find_row(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Decision not found".to_string()))?;

    let today = today();
    let d = &row.decision;
    let mut page = DetailTemplate::new(nav(&state, &auth, "decisions").await?, "decision", "/decisions", id);
    page.title = d.title.clone();
    page.badges = vec![status_label(&d.status), format!("{} impact", impact_label(&d.impact))];
    if d.is_pending_too_long(today) {
        page.badges.push("Pending too long".to_string());
    }
    page.description = d.description.clone();
    page.content = Some(d.rationale.clone()).filter(|r| !r.is_empty());
    page.fields = vec![
        DetailField::link("Project", row.project_name.clone(), format!("/projects/{}", d.project_id)),
        DetailField::new("Decision maker", d.decision_maker.clone()),
        DetailField::new("Decided", fmt_opt_date(d.decided_date)),
        DetailField::new("Days open", d.days_since_creation(today).to_string()),
        DetailField::new("Created", fmt_time(d.created_at)),
    ];
    Ok(render(page))
}

async fn fields(
    state: &SharedState,
    decision: Option<&Decision>,
    project: &str,
) -> Result<Vec<FormField>, AppError> {
    let status = decision.map_or(DecisionStatus::Pending.as_str(), |d| d.status.as_str());
    let impact = decision.map_or(DecisionImpact::Medium.as_str(), |d| d.impact.as_str());

    Ok(vec![
        FormField::new("project_id", "Project", "select")
            .choices(Some("Select a project"), project_options(state, project).await?)
            .required(),
        FormField::new("title", "Title", "text")
            .value(decision.map(|d| d.title.clone()).unwrap_or_default())
            .required(),
        FormField::new("description", "Description", "textarea")
            .value(decision.map(|d| d.description.clone()).unwrap_or_default())
            .required(),
        FormField::new("rationale", "Rationale", "textarea")
            .value(decision.map(|d| d.rationale.clone()).unwrap_or_default()),
        FormField::new("status", "Status", "select").choices(
            None,
            options(DecisionStatus::ALL.iter().map(|s| (s.as_str(), s.label())), status),
        ),
        FormField::new("impact", "Impact", "select").choices(
            None,
            options(DecisionImpact::ALL.iter().map(|i| (i.as_str(), i.label())), impact),
        ),
        FormField::new("decided_date", "Decided on", "date")
            .value(decision.map(|d| fmt_opt_date(d.decided_date)).unwrap_or_default()),
        FormField::new("decision_maker", "Decision maker", "text")
            .value(decision.map(|d| d.decision_maker.clone()).unwrap_or_default()),
    ])
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct NewParams {
    pub project: Option<String>,
}

pub async fn new_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<NewParams>,
) -> Result<impl IntoResponse, AppError> {
    let fields = fields(&state, None, params.project.as_deref().unwrap_or("")).await?;
    let nav = nav(&state, &auth, "decisions").await?;
    Ok(render(FormTemplate::create(nav, "New decision", "/decisions", fields)))
}

pub async fn edit_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let decision = db::decisions::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Decision not found".to_string()))?;

    let fields = fields(&state, Some(&decision), &decision.project_id.to_string()).await?;
    let nav = nav(&state, &auth, "decisions").await?;
    Ok(render(FormTemplate::edit(
        nav,
        format!("Edit {}", decision.title),
        "/decisions",
        id,
        fields,
    )))
}
