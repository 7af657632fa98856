use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use uuid::Uuid;

use super::{
    fmt_date, label_or_raw, nav, options, render, user_options, DetailField,
    DetailTemplate, FormField, FormTemplate, ListRow, ListTemplate, Pagination, Section,
    SectionRow,
};
use crate::auth::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::choices::{ApplicationStatus, DecisionStatus, ProjectStatus};
use crate::models::{Project, ProjectSummary};
use crate::routes::projects::{summarize, ListParams};
use crate::routes::{page_from, today};
use crate::state::SharedState;

fn status_label(status: &str) -> String {
    label_or_raw(status, |s| ProjectStatus::parse(s).map(|c| c.label()))
}

pub async fn list_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = params.filter()?;
    let page = page_from(params.page, params.per_page);
    let projects = db::projects::list(&state.pool, &filter, page).await?;
    let total = db::projects::count(&state.pool, &filter).await?;

    let rows = summarize(&state, projects)
        .await?
        .into_iter()
        .map(|s| ListRow {
            id: s.project.id.to_string(),
            url: format!("/projects/{}", s.project.id),
            cells: vec![
                s.project.name.clone(),
                status_label(&s.project.status),
                fmt_date(s.project.target_date),
                format!("{}%", s.completion_percentage),
                format!("{}", s.health_score),
            ],
        })
        .collect();

    let search = params.search.clone().unwrap_or_default();
    let status = params.status.clone().unwrap_or_default();
    let owner = params.owner.clone().unwrap_or_default();

    let template = ListTemplate {
        nav: nav(&state, &auth, "projects").await?,
        title: "Projects",
        new_url: "/projects/new".to_string(),
        filters: vec![
            FormField::new("search", "Search", "text").value(search.clone()),
            FormField::new("status", "Status", "select").choices(
                Some("All statuses"),
                options(ProjectStatus::ALL.iter().map(|s| (s.as_str(), s.label())), &status),
            ),
            FormField::new("owner", "Owner", "select")
                .choices(Some("Anyone"), user_options(&state, &owner).await?),
        ],
        columns: vec!["Name", "Status", "Target date", "Complete", "Health"],
        rows,
        pagination: Pagination::new(
            "/projects",
            &[("search", search), ("status", status), ("owner", owner)],
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
    let project = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let today = today();
    let counts = db::stats::project_task_counts(&state.pool, id).await?;
    let stats = db::stats::project_statistics(&state.pool, id, today).await?;
    let progress = db::stats::application_progress(&state.pool, id).await?;
    let decisions = db::decisions::list(
        &state.pool,
        &db::decisions::DecisionFilter {
            project_id: Some(id),
            ..Default::default()
        },
        page_from(Some(1), Some(10)),
    )
    .await?;
    let owner = db::users::find_by_id(&state.pool, project.owner_id)
        .await?
        .map(|u| u.display_name())
        .unwrap_or_default();

    let summary = ProjectSummary::new(project, counts.total, counts.completed, today);
    let p = &summary.project;

    let mut page = DetailTemplate::new(nav(&state, &auth, "projects").await?, "project", "/projects", id);
    page.title = p.name.clone();
    page.badges.push(status_label(&p.status));
    if summary.is_overdue {
        page.badges.push(format!("Overdue by {} days", summary.days_overdue));
    }
    page.description = p.description.clone();
    page.fields = vec![
        DetailField::new("Owner", owner),
        DetailField::new("Start date", fmt_date(p.start_date)),
        DetailField::new("Target date", fmt_date(p.target_date)),
        DetailField::new("Days remaining", summary.days_remaining.to_string()),
        DetailField::new(
            "Tasks",
            format!(
                "{} of {} complete ({}%)",
                summary.completed_tasks, summary.total_tasks, summary.completion_percentage
            ),
        ),
        DetailField::new("Overdue tasks", stats.overdue_tasks.to_string()),
        DetailField::new("Health score", summary.health_score.to_string()),
        DetailField::link(
            "Artifacts",
            stats.artifacts_count.to_string(),
            format!("/artifacts?project={id}"),
        ),
        DetailField::link(
            "Integrations",
            stats.integrations_count.to_string(),
            format!("/integrations?project={id}"),
        ),
    ];
    page.sections = vec![
        Section {
            title: "Applications",
            empty: "No applications yet.",
            rows: progress
                .iter()
                .map(|a| SectionRow {
                    url: format!("/applications/{}", a.application_id),
                    title: a.name.clone(),
                    meta: format!(
                        "{} · {}/{} tasks",
                        label_or_raw(&a.status, |s| ApplicationStatus::parse(s).map(|c| c.label())),
                        a.completed,
                        a.total
                    ),
                })
                .collect(),
        },
        Section {
            title: "Decisions",
            empty: "No decisions recorded.",
            rows: decisions
                .iter()
                .map(|d| SectionRow {
                    url: format!("/decisions/{}", d.decision.id),
                    title: d.decision.title.clone(),
                    meta: label_or_raw(&d.decision.status, |s| {
                        DecisionStatus::parse(s).map(|c| c.label())
                    }),
                })
                .collect(),
        },
    ];
    Ok(render(page))
}

async fn fields(
    state: &SharedState,
    project: Option<&Project>,
    default_owner: Uuid,
) -> Result<Vec<FormField>, AppError> {
    let status = project.map_or(ProjectStatus::Planning.as_str(), |p| p.status.as_str());
    let owner = project.map_or(default_owner, |p| p.owner_id).to_string();

    Ok(vec![
        FormField::new("name", "Name", "text")
            .value(project.map(|p| p.name.clone()).unwrap_or_default())
            .required(),
        FormField::new("description", "Description", "textarea")
            .value(project.map(|p| p.description.clone()).unwrap_or_default())
            .required(),
        FormField::new("status", "Status", "select").choices(
            None,
            options(ProjectStatus::ALL.iter().map(|s| (s.as_str(), s.label())), status),
        ),
        FormField::new("start_date", "Start date", "date")
            .value(project.map(|p| fmt_date(p.start_date)).unwrap_or_default())
            .required(),
        FormField::new("target_date", "Target date", "date")
            .value(project.map(|p| fmt_date(p.target_date)).unwrap_or_default())
            .required()
            .help("Must be after the start date."),
        FormField::new("owner_id", "Owner", "select")
            .choices(None, user_options(state, &owner).await?),
    ])
}

pub async fn new_page(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let fields = fields(&state, None, auth.user_id).await?;
    let nav = nav(&state, &auth, "projects").await?;
    Ok(render(FormTemplate::create(nav, "New project", "/projects", fields)))
}

pub async fn edit_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let project = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    auth.require_owner_or_admin(project.owner_id)?;

    let fields = fields(&state, Some(&project), auth.user_id).await?;
    let nav = nav(&state, &auth, "projects").await?;
    Ok(render(FormTemplate::edit(
        nav,
        format!("Edit {}", project.name),
        "/projects",
        id,
        fields,
    )))
}
