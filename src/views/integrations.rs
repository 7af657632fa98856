use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use uuid::Uuid;

use super::{
    application_options, fmt_time, label_or_raw, nav, options, project_options, render,
    DetailField, DetailTemplate, FormField, FormTemplate, ListRow, ListTemplate, Pagination,
};
use crate::auth::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::choices::{IntegrationComplexity, IntegrationStatus, IntegrationType};
use crate::models::Integration;
use crate::routes::integrations::ListParams;
use crate::routes::page_from;
use crate::state::SharedState;

fn type_label(kind: &str) -> String {
    label_or_raw(kind, |s| IntegrationType::parse(s).map(|c| c.label()))
}

fn status_label(status: &str) -> String {
    label_or_raw(status, |s| IntegrationStatus::parse(s).map(|c| c.label()))
}

fn complexity_label(complexity: &str) -> String {
    label_or_raw(complexity, |s| IntegrationComplexity::parse(s).map(|c| c.label()))
}

pub async fn list_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = params.filter()?;
    let page = page_from(params.page, params.per_page);
    let integrations = db::integrations::list(&state.pool, &filter, page).await?;
    let total = db::integrations::count(&state.pool, &filter).await?;

    let rows = integrations
        .into_iter()
        .map(|r| ListRow {
            id: r.integration.id.to_string(),
            url: format!("/integrations/{}", r.integration.id),
            cells: vec![
                format!("{} → {}", r.from_app_name, r.to_app_name),
                r.project_name.clone(),
                type_label(&r.integration.integration_type),
                status_label(&r.integration.status),
                complexity_label(&r.integration.complexity),
                format!("{} h", r.integration.estimated_hours()),
            ],
        })
        .collect();

    let project = params.project.clone().unwrap_or_default();
    let application = params.application.clone().unwrap_or_default();
    let status = params.status.clone().unwrap_or_default();
    let kind = params.integration_type.clone().unwrap_or_default();

    let template = ListTemplate {
        nav: nav(&state, &auth, "integrations").await?,
        title: "Integrations",
        new_url: "/integrations/new".to_string(),
        filters: vec![
            FormField::new("project", "Project", "select")
                .choices(Some("All projects"), project_options(&state, &project).await?),
            FormField::new("application", "Application", "select").choices(
                Some("All applications"),
                application_options(&state, &application).await?,
            ),
            FormField::new("status", "Status", "select").choices(
                Some("All statuses"),
                options(IntegrationStatus::ALL.iter().map(|s| (s.as_str(), s.label())), &status),
            ),
            FormField::new("type", "Type", "select").choices(
                Some("All types"),
                options(IntegrationType::ALL.iter().map(|t| (t.as_str(), t.label())), &kind),
            ),
        ],
        columns: vec!["Applications", "Project", "Type", "Status", "Complexity", "Estimate"],
        rows,
        pagination: Pagination::new(
            "/integrations",
            &[
                ("project", project),
                ("application", application),
                ("status", status),
                ("type", kind),
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
    let row = db::integrations::find_row(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Integration not found".to_string()))?;

    let i = &row.integration;
    let mut page = DetailTemplate::new(
        nav(&state, &auth, "integrations").await?,
        "integration",
        "/integrations",
        id,
    );
    page.title = format!("{} → {}", row.from_app_name, row.to_app_name);
    page.badges = vec![
        status_label(&i.status),
        type_label(&i.integration_type),
        complexity_label(&i.complexity),
    ];
    page.description = i.description.clone();
    page.fields = vec![
        DetailField::link("Project", row.project_name.clone(), format!("/projects/{}", row.project_id)),
        DetailField::link("From", row.from_app_name.clone(), format!("/applications/{}", i.from_app_id)),
        DetailField::link("To", row.to_app_name.clone(), format!("/applications/{}", i.to_app_id)),
        DetailField::new("Estimated weeks", i.estimated_weeks.to_string()),
        DetailField::new("Complexity multiplier", format!("{}×", i.complexity_multiplier())),
        DetailField::new("Estimated hours", i.estimated_hours().to_string()),
        DetailField::new("Updated", fmt_time(i.updated_at)),
    ];
    Ok(render(page))
}

async fn fields(
    state: &SharedState,
    integration: Option<&Integration>,
) -> Result<Vec<FormField>, AppError> {
    let from = integration.map(|i| i.from_app_id.to_string()).unwrap_or_default();
    let to = integration.map(|i| i.to_app_id.to_string()).unwrap_or_default();
    let kind = integration.map_or("", |i| i.integration_type.as_str());
    let status = integration.map_or(IntegrationStatus::Planned.as_str(), |i| i.status.as_str());
    let complexity =
        integration.map_or(IntegrationComplexity::Medium.as_str(), |i| i.complexity.as_str());

    Ok(vec![
        FormField::new("from_app_id", "From application", "select")
            .choices(Some("Select an application"), application_options(state, &from).await?)
            .required(),
        FormField::new("to_app_id", "To application", "select")
            .choices(Some("Select an application"), application_options(state, &to).await?)
            .required()
            .help("Both applications must belong to the same project."),
        FormField::new("integration_type", "Type", "select")
            .choices(
                Some("Select a type"),
                options(IntegrationType::ALL.iter().map(|t| (t.as_str(), t.label())), kind),
            )
            .required(),
        FormField::new("status", "Status", "select").choices(
            None,
            options(IntegrationStatus::ALL.iter().map(|s| (s.as_str(), s.label())), status),
        ),
        FormField::new("complexity", "Complexity", "select").choices(
            None,
            options(
                IntegrationComplexity::ALL.iter().map(|c| (c.as_str(), c.label())),
                complexity,
            ),
        ),
        FormField::new("description", "Description", "textarea")
            .value(integration.map(|i| i.description.clone()).unwrap_or_default())
            .required(),
        FormField::new("estimated_weeks", "Estimated weeks", "number")
            .value(integration.map_or("0".to_string(), |i| i.estimated_weeks.to_string())),
    ])
}

pub async fn new_page(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let fields = fields(&state, None).await?;
    let nav = nav(&state, &auth, "integrations").await?;
    Ok(render(FormTemplate::create(nav, "New integration", "/integrations", fields)))
}

pub async fn edit_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let integration = db::integrations::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Integration not found".to_string()))?;

    let fields = fields(&state, Some(&integration)).await?;
    let nav = nav(&state, &auth, "integrations").await?;
    Ok(render(FormTemplate::edit(
        nav,
        "Edit integration".to_string(),
        "/integrations",
        id,
        fields,
    )))
}
