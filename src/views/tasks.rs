use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use uuid::Uuid;

use super::{
    application_options, fmt_date, fmt_opt_date, fmt_time, label_or_raw, nav, options,
    project_options, render, user_options, BulkControls, DetailField, DetailTemplate, FormField,
    FormTemplate, ListRow, ListTemplate, Pagination,
};
use crate::auth::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::choices::{TaskAssignee, TaskPriority, TaskStatus};
use crate::models::Task;
use crate::routes::tasks::ListParams;
use crate::routes::{page_from, today};
use crate::state::SharedState;

const BULK_ACTIONS: &[(&str, &str)] = &[
    ("complete", "Mark completed"),
    ("in_progress", "Mark in progress"),
    ("pending", "Mark pending"),
    ("change_assignee", "Change assignee"),
    ("update_due_date", "Update due date"),
];

fn status_label(status: &str) -> String {
    label_or_raw(status, |s| TaskStatus::parse(s).map(|c| c.label()))
}

fn priority_label(priority: &str) -> String {
    label_or_raw(priority, |s| TaskPriority::parse(s).map(|c| c.label()))
}

fn assignee_label(assignee: &str) -> String {
    label_or_raw(assignee, |s| TaskAssignee::parse(s).map(|c| c.label()))
}

pub async fn list_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = params.filter()?;
    let page = page_from(params.page, params.per_page);
    let tasks = db::tasks::list(&state.pool, &filter, page).await?;
    let total = db::tasks::count(&state.pool, &filter).await?;
    let today = today();

    let rows = tasks
        .into_iter()
        .map(|r| {
            let mut due = fmt_opt_date(r.task.due_date);
            if r.task.is_overdue(today) {
                due.push_str(" (overdue)");
            }
            ListRow {
                id: r.task.id.to_string(),
                url: format!("/tasks/{}", r.task.id),
                cells: vec![
                    r.task.title.clone(),
                    format!("{} / {}", r.project_name, r.application_name),
                    status_label(&r.task.status),
                    priority_label(&r.task.priority),
                    assignee_label(&r.task.assignee),
                    due,
                ],
            }
        })
        .collect();

    let project = params.project.clone().unwrap_or_default();
    let application = params.application.clone().unwrap_or_default();
    let status = params.status.clone().unwrap_or_default();
    let priority = params.priority.clone().unwrap_or_default();
    let assignee = params.assignee.clone().unwrap_or_default();
    let search = params.search.clone().unwrap_or_default();
    let overdue = if params.overdue { "true" } else { "" }.to_string();

    let assignees = || TaskAssignee::ALL.iter().map(|a| (a.as_str(), a.label()));

    let template = ListTemplate {
        nav: nav(&state, &auth, "tasks").await?,
        title: "Tasks",
        new_url: "/tasks/new".to_string(),
        filters: vec![
            FormField::new("search", "Search", "text").value(search.clone()),
            FormField::new("project", "Project", "select")
                .choices(Some("All projects"), project_options(&state, &project).await?),
            FormField::new("application", "Application", "select").choices(
                Some("All applications"),
                application_options(&state, &application).await?,
            ),
            FormField::new("status", "Status", "select").choices(
                Some("All statuses"),
                options(TaskStatus::ALL.iter().map(|s| (s.as_str(), s.label())), &status),
            ),
            FormField::new("priority", "Priority", "select").choices(
                Some("Any priority"),
                options(TaskPriority::ALL.iter().map(|p| (p.as_str(), p.label())), &priority),
            ),
            FormField::new("assignee", "Assignee", "select")
                .choices(Some("Anyone"), options(assignees(), &assignee)),
            FormField::new("overdue", "Overdue only", "checkbox").value(overdue.clone()),
        ],
        columns: vec!["Title", "Application", "Status", "Priority", "Assignee", "Due"],
        rows,
        pagination: Pagination::new(
            "/tasks",
            &[
                ("search", search),
                ("project", project),
                ("application", application),
                ("status", status),
                ("priority", priority),
                ("assignee", assignee),
                ("overdue", overdue),
            ],
            page,
            total,
        ),
        bulk: Some(BulkControls {
            actions: options(BULK_ACTIONS.iter().copied(), ""),
            assignees: options(assignees(), ""),
        }),
    };
    Ok(render(template))
}

pub async fn detail_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let row = db::tasks::find_row(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;
    let assigned = match row.task.assigned_user_id {
        Some(user_id) => db::users::find_by_id(&state.pool, user_id)
            .await?
            .map(|u| u.display_name()),
        None => None,
    };

    let today = today();
    let t = &row.task;
    let mut page = DetailTemplate::new(nav(&state, &auth, "tasks").await?, "task", "/tasks", id);
    page.title = t.title.clone();
    page.badges = vec![status_label(&t.status), priority_label(&t.priority)];
    if t.is_overdue(today) {
        page.badges.push("Overdue".to_string());
    }
    page.description = t.description.clone();
    page.fields = vec![
        DetailField::link("Project", row.project_name.clone(), format!("/projects/{}", row.project_id)),
        DetailField::link(
            "Application",
            row.application_name.clone(),
            format!("/applications/{}", t.application_id),
        ),
        DetailField::new("Assignee", assignee_label(&t.assignee)),
        DetailField::new("Assigned user", assigned.unwrap_or_default()),
        DetailField::new("Due date", t.due_date.map(fmt_date).unwrap_or_else(|| "None".to_string())),
        DetailField::new(
            "Days until due",
            t.days_until_due(today).map(|d| d.to_string()).unwrap_or_default(),
        ),
        DetailField::new(
            "Estimated hours",
            t.estimated_hours.map(|h| h.to_string()).unwrap_or_default(),
        ),
        DetailField::new(
            "Actual hours",
            t.actual_hours.map(|h| h.to_string()).unwrap_or_default(),
        ),
        DetailField::new(
            "Hours variance",
            t.hours_variance().map(|h| format!("{h:+}")).unwrap_or_default(),
        ),
        DetailField::new("Updated", fmt_time(t.updated_at)),
    ];
    page.status_api = Some(format!("/api/v1/tasks/{id}/status"));
    page.status_options = options(TaskStatus::ALL.iter().map(|s| (s.as_str(), s.label())), &t.status);
    Ok(render(page))
}

async fn fields(
    state: &SharedState,
    task: Option<&Task>,
    application: &str,
) -> Result<Vec<FormField>, AppError> {
    let priority = task.map_or(TaskPriority::Medium.as_str(), |t| t.priority.as_str());
    let status = task.map_or(TaskStatus::Pending.as_str(), |t| t.status.as_str());
    let assignee = task.map_or(TaskAssignee::Human.as_str(), |t| t.assignee.as_str());
    let assigned_user = task
        .and_then(|t| t.assigned_user_id)
        .map(|u| u.to_string())
        .unwrap_or_default();
    let hours = |h: Option<i32>| h.map(|h| h.to_string()).unwrap_or_default();

    Ok(vec![
        FormField::new("application_id", "Application", "select")
            .choices(Some("Select an application"), application_options(state, application).await?)
            .required(),
        FormField::new("title", "Title", "text")
            .value(task.map(|t| t.title.clone()).unwrap_or_default())
            .required(),
        FormField::new("description", "Description", "textarea")
            .value(task.map(|t| t.description.clone()).unwrap_or_default()),
        FormField::new("priority", "Priority", "select").choices(
            None,
            options(TaskPriority::ALL.iter().map(|p| (p.as_str(), p.label())), priority),
        ),
        FormField::new("status", "Status", "select").choices(
            None,
            options(TaskStatus::ALL.iter().map(|s| (s.as_str(), s.label())), status),
        ),
        FormField::new("assignee", "Assignee", "select").choices(
            None,
            options(TaskAssignee::ALL.iter().map(|a| (a.as_str(), a.label())), assignee),
        ),
        FormField::new("assigned_user_id", "Assigned user", "select")
            .choices(Some("Nobody"), user_options(state, &assigned_user).await?),
        FormField::new("due_date", "Due date", "date")
            .value(task.map(|t| fmt_opt_date(t.due_date)).unwrap_or_default())
            .help("New tasks cannot be due in the past."),
        FormField::new("estimated_hours", "Estimated hours", "number")
            .value(hours(task.and_then(|t| t.estimated_hours))),
        FormField::new("actual_hours", "Actual hours", "number")
            .value(hours(task.and_then(|t| t.actual_hours))),
    ])
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
    let nav = nav(&state, &auth, "tasks").await?;
    Ok(render(FormTemplate::create(nav, "New task", "/tasks", fields)))
}

pub async fn edit_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let task = db::tasks::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    let fields = fields(&state, Some(&task), &task.application_id.to_string()).await?;
    let nav = nav(&state, &auth, "tasks").await?;
    Ok(render(FormTemplate::edit(
        nav,
        format!("Edit {}", task.title),
        "/tasks",
        id,
        fields,
    )))
}
