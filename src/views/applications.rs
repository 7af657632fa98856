use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use uuid::Uuid;

use super::{
    fmt_opt_date, label_or_raw, nav, options, project_options, render, DetailField,
    DetailTemplate, FormField, FormTemplate, ListRow, ListTemplate, Pagination, Section,
    SectionRow,
};
use crate::auth::AuthUser;
use crate::db;
use crate::db::tasks::TaskFilter;
use crate::error::AppError;
use crate::models::choices::{ApplicationComplexity, ApplicationStatus, TaskStatus};
use crate::models::{completion_percentage, Application};
use crate::routes::applications::ListParams;
use crate::routes::{page_from, today};
use crate::state::SharedState;

fn status_label(status: &str) -> String {
    label_or_raw(status, |s| ApplicationStatus::parse(s).map(|c| c.label()))
}

fn complexity_label(complexity: &str) -> String {
    label_or_raw(complexity, |s| ApplicationComplexity::parse(s).map(|c| c.label()))
}

pub async fn list_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = params.filter()?;
    let page = page_from(params.page, params.per_page);
    let apps = db::applications::list(&state.pool, &filter, page).await?;
    let total = db::applications::count(&state.pool, &filter).await?;

    let rows = apps
        .into_iter()
        .map(|r| ListRow {
            id: r.application.id.to_string(),
            url: format!("/applications/{}", r.application.id),
            cells: vec![
                r.application.name.clone(),
                r.project_name.clone(),
                status_label(&r.application.status),
                complexity_label(&r.application.complexity),
                r.application.version.clone(),
            ],
        })
        .collect();

    let project = params.project.clone().unwrap_or_default();
    let status = params.status.clone().unwrap_or_default();
    let complexity = params.complexity.clone().unwrap_or_default();
    let search = params.search.clone().unwrap_or_default();

    let template = ListTemplate {
        nav: nav(&state, &auth, "applications").await?,
        title: "Applications",
        new_url: "/applications/new".to_string(),
        filters: vec![
            FormField::new("search", "Search", "text").value(search.clone()),
            FormField::new("project", "Project", "select")
                .choices(Some("All projects"), project_options(&state, &project).await?),
            FormField::new("status", "Status", "select").choices(
                Some("All statuses"),
                options(ApplicationStatus::ALL.iter().map(|s| (s.as_str(), s.label())), &status),
            ),
            FormField::new("complexity", "Complexity", "select").choices(
                Some("Any complexity"),
                options(
                    ApplicationComplexity::ALL.iter().map(|s| (s.as_str(), s.label())),
                    &complexity,
                ),
            ),
        ],
        columns: vec!["Name", "Project", "Status", "Complexity", "Version"],
        rows,
        pagination: Pagination::new(
            "/applications",
            &[
                ("search", search),
                ("project", project),
                ("status", status),
                ("complexity", complexity),
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
    let row = db::applications::find_row(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;
    let counts = db::stats::application_counts(&state.pool, id).await?;
    let tasks = db::tasks::list(
        &state.pool,
        &TaskFilter {
            application_id: Some(id),
            ..Default::default()
        },
        page_from(Some(1), Some(20)),
    )
    .await?;
    let artifacts = db::artifacts::list(
        &state.pool,
        &db::artifacts::ArtifactFilter {
            application_id: Some(id),
            ..Default::default()
        },
        page_from(Some(1), Some(20)),
    )
    .await?;

    let app = &row.application;
    let mut page = DetailTemplate::new(
        nav(&state, &auth, "applications").await?,
        "application",
        "/applications",
        id,
    );
    page.title = app.name.clone();
    page.badges = vec![status_label(&app.status), complexity_label(&app.complexity)];
    page.description = app.description.clone();
    page.fields = vec![
        DetailField::link("Project", row.project_name.clone(), format!("/projects/{}", app.project_id)),
        DetailField::new("Version", app.version.clone()),
        DetailField::new("Estimated weeks", app.estimated_weeks.to_string()),
        DetailField::new(
            "Days to target",
            app.days_to_target(today())
                .map(|d| d.to_string())
                .unwrap_or_else(|| "No estimate".to_string()),
        ),
        DetailField::new(
            "Tasks",
            format!(
                "{} of {} complete ({}%)",
                counts.tasks_completed,
                counts.tasks_total,
                completion_percentage(counts.tasks_completed, counts.tasks_total)
            ),
        ),
        DetailField::new("Features", app.features.0.join(", ")),
        DetailField::new("Tech stack", app.tech_stack.0.join(", ")),
        DetailField::link(
            "Integrations",
            counts.integrations_count.to_string(),
            format!("/integrations?application={id}"),
        ),
    ];
    page.sections = vec![
        Section {
            title: "Tasks",
            empty: "No tasks yet.",
            rows: tasks
                .iter()
                .map(|t| SectionRow {
                    url: format!("/tasks/{}", t.task.id),
                    title: t.task.title.clone(),
                    meta: format!(
                        "{} · due {}",
                        label_or_raw(&t.task.status, |s| TaskStatus::parse(s).map(|c| c.label())),
                        fmt_opt_date(t.task.due_date)
                    ),
                })
                .collect(),
        },
        Section {
            title: "Artifacts",
            empty: "No artifacts yet.",
            rows: artifacts
                .iter()
                .map(|a| SectionRow {
                    url: format!("/artifacts/{}", a.artifact.id),
                    title: a.artifact.name.clone(),
                    meta: format!("v{}", a.artifact.version),
                })
                .collect(),
        },
    ];
    Ok(render(page))
}

async fn fields(
    state: &SharedState,
    app: Option<&Application>,
    project: &str,
) -> Result<Vec<FormField>, AppError> {
    let status = app.map_or(ApplicationStatus::Planning.as_str(), |a| a.status.as_str());
    let complexity = app.map_or(ApplicationComplexity::Medium.as_str(), |a| a.complexity.as_str());

    Ok(vec![
        FormField::new("project_id", "Project", "select")
            .choices(Some("Select a project"), project_options(state, project).await?)
            .required(),
        FormField::new("name", "Name", "text")
            .value(app.map(|a| a.name.clone()).unwrap_or_default())
            .required(),
        FormField::new("description", "Description", "textarea")
            .value(app.map(|a| a.description.clone()).unwrap_or_default())
            .required(),
        FormField::new("complexity", "Complexity", "select").choices(
            None,
            options(ApplicationComplexity::ALL.iter().map(|c| (c.as_str(), c.label())), complexity),
        ),
        FormField::new("status", "Status", "select").choices(
            None,
            options(ApplicationStatus::ALL.iter().map(|s| (s.as_str(), s.label())), status),
        ),
        FormField::new("estimated_weeks", "Estimated weeks", "number")
            .value(app.map_or("0".to_string(), |a| a.estimated_weeks.to_string())),
        FormField::new("version", "Version", "text")
            .value(app.map_or("1.0".to_string(), |a| a.version.clone())),
        FormField::new("features", "Features", "lines")
            .value(app.map(|a| a.features.0.join("\n")).unwrap_or_default())
            .help("One per line."),
        FormField::new("tech_stack", "Tech stack", "lines")
            .value(app.map(|a| a.tech_stack.0.join("\n")).unwrap_or_default())
            .help("One per line."),
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
    let nav = nav(&state, &auth, "applications").await?;
    Ok(render(FormTemplate::create(nav, "New application", "/applications", fields)))
}

pub async fn edit_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let app = db::applications::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;

    let fields = fields(&state, Some(&app), &app.project_id.to_string()).await?;
    let nav = nav(&state, &auth, "applications").await?;
    Ok(render(FormTemplate::edit(
        nav,
        format!("Edit {}", app.name),
        "/applications",
        id,
        fields,
    )))
}
