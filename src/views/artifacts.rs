use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use uuid::Uuid;

use super::{
    application_options, fmt_time, label_or_raw, nav, options, project_options, render,
    DetailField, DetailTemplate, FormField, FormTemplate, ListRow, ListTemplate, Pagination,
    Section, SectionRow,
};
use crate::auth::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::choices::{ArtifactStatus, ArtifactType};
use crate::models::{Artifact, INITIAL_VERSION};
use crate::routes::artifacts::ListParams;
use crate::routes::page_from;
use crate::state::SharedState;

fn type_label(kind: Option<&str>) -> String {
    kind.map(|k| label_or_raw(k, |s| ArtifactType::parse(s).map(|c| c.label())))
        .unwrap_or_default()
}

fn status_label(status: &str) -> String {
    label_or_raw(status, |s| ArtifactStatus::parse(s).map(|c| c.label()))
}

pub async fn list_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = params.filter()?;
    let page = page_from(params.page, params.per_page);
    let artifacts = db::artifacts::list(&state.pool, &filter, page).await?;
    let total = db::artifacts::count(&state.pool, &filter).await?;

    let rows = artifacts
        .into_iter()
        .map(|r| ListRow {
            id: r.artifact.id.to_string(),
            url: format!("/artifacts/{}", r.artifact.id),
            cells: vec![
                r.artifact.name.clone(),
                type_label(r.artifact.artifact_type.as_deref()),
                r.application_name.clone().unwrap_or_default(),
                status_label(&r.artifact.status),
                r.artifact.version.clone(),
                fmt_time(r.artifact.updated_at),
            ],
        })
        .collect();

    let project = params.project.clone().unwrap_or_default();
    let application = params.application.clone().unwrap_or_default();
    let kind = params.artifact_type.clone().unwrap_or_default();
    let status = params.status.clone().unwrap_or_default();
    let search = params.search.clone().unwrap_or_default();

    let template = ListTemplate {
        nav: nav(&state, &auth, "artifacts").await?,
        title: "Artifacts",
        new_url: "/artifacts/new".to_string(),
        filters: vec![
            FormField::new("search", "Search", "text").value(search.clone()),
            FormField::new("project", "Project", "select")
                .choices(Some("All projects"), project_options(&state, &project).await?),
            FormField::new("application", "Application", "select").choices(
                Some("All applications"),
                application_options(&state, &application).await?,
            ),
            FormField::new("type", "Type", "select").choices(
                Some("All types"),
                options(ArtifactType::ALL.iter().map(|t| (t.as_str(), t.label())), &kind),
            ),
            FormField::new("status", "Status", "select").choices(
                Some("All statuses"),
                options(ArtifactStatus::ALL.iter().map(|s| (s.as_str(), s.label())), &status),
            ),
        ],
        columns: vec!["Name", "Type", "Application", "Status", "Version", "Updated"],
        rows,
        pagination: Pagination::new(
            "/artifacts",
            &[
                ("search", search),
                ("project", project),
                ("application", application),
                ("type", kind),
                ("status", status),
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
    let row = db::artifacts::find_row(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Artifact not found".to_string()))?;
    let history = db::artifacts::version_history(&state.pool, &row.artifact).await?;

    let a = &row.artifact;
    let mut page = DetailTemplate::new(nav(&state, &auth, "artifacts").await?, "artifact", "/artifacts", id);
    page.title = a.name.clone();
    page.badges = vec![status_label(&a.status), format!("v{}", a.version)];
    if let Some(kind) = a.artifact_type.as_deref() {
        page.badges.push(type_label(Some(kind)));
    }
    page.description = a.description.clone();
    page.content = Some(a.content.clone()).filter(|c| !c.is_empty());

    page.fields = Vec::new();
    if let (Some(app_id), Some(app_name)) = (a.application_id, row.application_name.clone()) {
        page.fields.push(DetailField::link("Application", app_name, format!("/applications/{app_id}")));
    }
    if let (Some(project_id), Some(project_name)) = (row.project_id, row.project_name.clone()) {
        page.fields.push(DetailField::link("Project", project_name, format!("/projects/{project_id}")));
    }
    if a.has_file() {
        page.fields.push(DetailField::new(
            "File",
            format!("{} ({} MB)", a.file_name.clone().unwrap_or_default(), a.file_size_mb()),
        ));
        page.download_url = Some(format!("/api/v1/artifacts/{id}/download"));
    }
    page.fields.push(DetailField::new("Created", fmt_time(a.created_at)));
    page.fields.push(DetailField::new("Updated", fmt_time(a.updated_at)));
    page.upload_api = Some(format!("/api/v1/artifacts/{id}/file"));

    page.sections = vec![Section {
        title: "Other versions",
        empty: "No other versions.",
        rows: history
            .iter()
            .map(|h| SectionRow {
                url: format!("/artifacts/{}", h.id),
                title: format!("{} v{}", h.name, h.version),
                meta: fmt_time(h.updated_at),
            })
            .collect(),
    }];
    Ok(render(page))
}

async fn fields(
    state: &SharedState,
    artifact: Option<&Artifact>,
    application: &str,
) -> Result<Vec<FormField>, AppError> {
    let kind = artifact.and_then(|a| a.artifact_type.as_deref()).unwrap_or("");
    let status = artifact.map_or(ArtifactStatus::Draft.as_str(), |a| a.status.as_str());

    let mut fields = vec![
        FormField::new("application_id", "Application", "select")
            .choices(Some("No application"), application_options(state, application).await?),
        FormField::new("name", "Name", "text")
            .value(artifact.map(|a| a.name.clone()).unwrap_or_default())
            .required(),
        FormField::new("type", "Type", "select").choices(
            Some("Unspecified"),
            options(ArtifactType::ALL.iter().map(|t| (t.as_str(), t.label())), kind),
        ),
        FormField::new("description", "Description", "textarea")
            .value(artifact.map(|a| a.description.clone()).unwrap_or_default()),
        FormField::new("content", "Content", "textarea")
            .value(artifact.map(|a| a.content.clone()).unwrap_or_default())
            .required(),
        FormField::new("version", "Version", "text")
            .value(artifact.map_or(INITIAL_VERSION.to_string(), |a| a.version.clone()))
            .help("Major.minor, for example 1.0."),
        FormField::new("status", "Status", "select").choices(
            None,
            options(ArtifactStatus::ALL.iter().map(|s| (s.as_str(), s.label())), status),
        ),
    ];
    if artifact.is_some() {
        fields.push(
            FormField::new("increment_version", "Increment version", "checkbox")
                .help("Bump the minor version on save."),
        );
    }
    Ok(fields)
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct NewParams {
    pub application: Option<String>,
}

pub async fn new_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<NewParams>,
) -> Result<impl IntoResponse, AppError> {
    let fields = fields(&state, None, params.application.as_deref().unwrap_or("")).await?;
    let nav = nav(&state, &auth, "artifacts").await?;
    Ok(render(FormTemplate::create(nav, "New artifact", "/artifacts", fields)))
}

pub async fn edit_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let artifact = db::artifacts::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Artifact not found".to_string()))?;

    let application = artifact.application_id.map(|a| a.to_string()).unwrap_or_default();
    let fields = fields(&state, Some(&artifact), &application).await?;
    let nav = nav(&state, &auth, "artifacts").await?;
    Ok(render(FormTemplate::edit(
        nav,
        format!("Edit {}", artifact.name),
        "/artifacts",
        id,
        fields,
    )))
}
