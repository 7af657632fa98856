//! Server-rendered pages.
//!
//! Pages only read. Every form on them posts JSON to `/api/v1` from
//! `static/app.js`, so validation and permissions live in one place.

pub mod admin;
pub mod applications;
pub mod artifacts;
pub mod auth;
pub mod dashboard;
pub mod decisions;
pub mod integrations;
pub mod profile;
pub mod projects;
pub mod search;
pub mod tasks;

use askama::Template;
use axum::response::{Html, Redirect};
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, NaiveDate, Utc};

use crate::auth::AuthUser;
use crate::db;
use crate::db::Page;
use crate::error::AppError;
use crate::middleware::auth_redirect::percent_encode;
use crate::state::SharedState;

/// Pages that work without a session.
pub fn public_routes() -> Router<SharedState> {
    Router::new()
        .route("/auth/login", get(auth::login_page))
        .route("/auth/register", get(auth::register_page))
}

/// Pages behind login; wrap with the redirect middleware.
pub fn view_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route("/dashboard", get(dashboard::index))
        .route("/search", get(search::page))
        .route("/profile", get(profile::page))
        .route("/admin/users", get(admin::users_page))
        // Projects
        .route("/projects", get(projects::list_page))
        .route("/projects/new", get(projects::new_page))
        .route("/projects/{id}", get(projects::detail_page))
        .route("/projects/{id}/edit", get(projects::edit_page))
        // Applications
        .route("/applications", get(applications::list_page))
        .route("/applications/new", get(applications::new_page))
        .route("/applications/{id}", get(applications::detail_page))
        .route("/applications/{id}/edit", get(applications::edit_page))
        // Artifacts
        .route("/artifacts", get(artifacts::list_page))
        .route("/artifacts/new", get(artifacts::new_page))
        .route("/artifacts/{id}", get(artifacts::detail_page))
        .route("/artifacts/{id}/edit", get(artifacts::edit_page))
        // Tasks
        .route("/tasks", get(tasks::list_page))
        .route("/tasks/new", get(tasks::new_page))
        .route("/tasks/{id}", get(tasks::detail_page))
        .route("/tasks/{id}/edit", get(tasks::edit_page))
        // Decisions
        .route("/decisions", get(decisions::list_page))
        .route("/decisions/new", get(decisions::new_page))
        .route("/decisions/{id}", get(decisions::detail_page))
        .route("/decisions/{id}/edit", get(decisions::edit_page))
        // Integrations
        .route("/integrations", get(integrations::list_page))
        .route("/integrations/new", get(integrations::new_page))
        .route("/integrations/{id}", get(integrations::detail_page))
        .route("/integrations/{id}/edit", get(integrations::edit_page))
}

/// Who is signed in, for the navigation bar.
pub struct Nav {
    pub user_name: String,
    pub is_admin: bool,
    pub active: &'static str,
}

impl Nav {
    pub fn anonymous() -> Self {
        Nav {
            user_name: String::new(),
            is_admin: false,
            active: "",
        }
    }

    pub fn signed_in(&self) -> bool {
        !self.user_name.is_empty()
    }
}

pub(crate) async fn nav(
    state: &SharedState,
    auth: &AuthUser,
    active: &'static str,
) -> Result<Nav, AppError> {
    let user_name = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .map(|u| u.display_name())
        .unwrap_or_else(|| auth.username.clone());
    Ok(Nav {
        user_name,
        is_admin: auth.is_admin,
        active,
    })
}

pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

pub(crate) fn options<'a, I>(choices: I, selected: &str) -> Vec<SelectOption>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    choices
        .into_iter()
        .map(|(value, label)| SelectOption {
            selected: value == selected,
            value: value.to_string(),
            label: label.to_string(),
        })
        .collect()
}

/// One input on a form or filter bar. `kind` is one of `text`, `textarea`,
/// `date`, `number`, `select`, `checkbox` or `lines` (a textarea sent as a
/// list of lines).
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: &'static str,
    pub value: String,
    pub options: Vec<SelectOption>,
    pub required: bool,
    pub help: &'static str,
}

impl FormField {
    pub fn new(name: &'static str, label: &'static str, kind: &'static str) -> Self {
        FormField {
            name,
            label,
            kind,
            value: String::new(),
            options: Vec::new(),
            required: false,
            help: "",
        }
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn help(mut self, help: &'static str) -> Self {
        self.help = help;
        self
    }

    /// A select with a leading blank entry labelled `blank`.
    pub fn choices(mut self, blank: Option<&str>, mut options: Vec<SelectOption>) -> Self {
        if let Some(blank) = blank {
            options.insert(
                0,
                SelectOption {
                    value: String::new(),
                    label: blank.to_string(),
                    selected: options.iter().all(|o| !o.selected),
                },
            );
        }
        self.options = options;
        self
    }

    pub fn checked(&self) -> bool {
        self.value == "true"
    }
}

pub struct ListRow {
    pub id: String,
    pub url: String,
    pub cells: Vec<String>,
}

pub struct Pagination {
    pub page: i64,
    pub total_pages: i64,
    pub total: i64,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

impl Pagination {
    /// Links that keep the current filters and change only `page`.
    pub fn new(path: &str, filters: &[(&str, String)], page: Page, total: i64) -> Self {
        let number = page.number();
        let total_pages = page.total_pages(total).max(1);
        let link = |n: i64| {
            let mut query: Vec<String> = filters
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| format!("{k}={}", percent_encode(v)))
                .collect();
            query.push(format!("page={n}"));
            format!("{path}?{}", query.join("&"))
        };
        Pagination {
            page: number,
            total_pages,
            total,
            prev_url: (number > 1).then(|| link(number - 1)),
            next_url: (number < total_pages).then(|| link(number + 1)),
        }
    }
}

pub struct DetailField {
    pub label: &'static str,
    pub value: String,
    pub url: Option<String>,
}

impl DetailField {
    pub fn new(label: &'static str, value: impl Into<String>) -> Self {
        DetailField {
            label,
            value: value.into(),
            url: None,
        }
    }

    pub fn link(label: &'static str, value: impl Into<String>, url: String) -> Self {
        DetailField {
            label,
            value: value.into(),
            url: Some(url),
        }
    }
}

pub struct SectionRow {
    pub url: String,
    pub title: String,
    pub meta: String,
}

pub struct Section {
    pub title: &'static str,
    pub empty: &'static str,
    pub rows: Vec<SectionRow>,
}

pub(crate) fn fmt_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn fmt_opt_date(date: Option<NaiveDate>) -> String {
    date.map(fmt_date).unwrap_or_default()
}

pub(crate) fn fmt_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

/// Label for a stored choice value, or the raw value if it is unknown.
pub(crate) fn label_or_raw(value: &str, parse: impl Fn(&str) -> Option<&'static str>) -> String {
    parse(value).map(str::to_string).unwrap_or_else(|| value.to_string())
}

/// Action and assignee pickers for bulk task updates.
pub struct BulkControls {
    pub actions: Vec<SelectOption>,
    pub assignees: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "list.html")]
pub struct ListTemplate {
    pub nav: Nav,
    pub title: &'static str,
    pub new_url: String,
    pub filters: Vec<FormField>,
    pub columns: Vec<&'static str>,
    pub rows: Vec<ListRow>,
    pub pagination: Pagination,
    pub bulk: Option<BulkControls>,
}

#[derive(Template)]
#[template(path = "detail.html")]
pub struct DetailTemplate {
    pub nav: Nav,
    pub title: String,
    pub kind: &'static str,
    pub badges: Vec<String>,
    pub fields: Vec<DetailField>,
    pub description: String,
    pub content: Option<String>,
    pub sections: Vec<Section>,
    pub back_url: &'static str,
    pub edit_url: String,
    pub delete_api: String,
    pub download_url: Option<String>,
    pub upload_api: Option<String>,
    pub status_api: Option<String>,
    pub status_options: Vec<SelectOption>,
}

impl DetailTemplate {
    pub fn new(nav: Nav, kind: &'static str, back_url: &'static str, id: uuid::Uuid) -> Self {
        DetailTemplate {
            nav,
            title: String::new(),
            kind,
            badges: Vec::new(),
            fields: Vec::new(),
            description: String::new(),
            content: None,
            sections: Vec::new(),
            back_url,
            edit_url: format!("{back_url}/{id}/edit"),
            delete_api: format!("/api/v1{back_url}/{id}"),
            download_url: None,
            upload_api: None,
            status_api: None,
            status_options: Vec::new(),
        }
    }
}

#[derive(Template)]
#[template(path = "form.html")]
pub struct FormTemplate {
    pub nav: Nav,
    pub title: String,
    /// API endpoint the JSON body goes to.
    pub action: String,
    pub method: &'static str,
    /// Page prefix; the created or updated id is appended after a save.
    pub redirect: &'static str,
    pub cancel_url: String,
    pub fields: Vec<FormField>,
}

impl FormTemplate {
    pub fn create(nav: Nav, title: &str, section: &'static str, fields: Vec<FormField>) -> Self {
        FormTemplate {
            nav,
            title: title.to_string(),
            action: format!("/api/v1{section}"),
            method: "POST",
            redirect: section,
            cancel_url: section.to_string(),
            fields,
        }
    }

    pub fn edit(
        nav: Nav,
        title: String,
        section: &'static str,
        id: uuid::Uuid,
        fields: Vec<FormField>,
    ) -> Self {
        FormTemplate {
            nav,
            title,
            action: format!("/api/v1{section}/{id}"),
            method: "PUT",
            redirect: section,
            cancel_url: format!("{section}/{id}"),
            fields,
        }
    }
}

pub(crate) fn render<T: Template>(template: T) -> Html<String> {
    Html(template.render().unwrap_or_default())
}

pub(crate) async fn project_options(
    state: &SharedState,
    selected: &str,
) -> Result<Vec<SelectOption>, AppError> {
    let projects = db::projects::list_all(&state.pool).await?;
    Ok(projects
        .iter()
        .map(|p| SelectOption {
            value: p.id.to_string(),
            label: p.name.clone(),
            selected: p.id.to_string() == selected,
        })
        .collect())
}

/// Applications labelled "Project / Application".
pub(crate) async fn application_options(
    state: &SharedState,
    selected: &str,
) -> Result<Vec<SelectOption>, AppError> {
    let rows = db::applications::list_all(&state.pool).await?;
    Ok(rows
        .iter()
        .map(|r| SelectOption {
            value: r.application.id.to_string(),
            label: format!("{} / {}", r.project_name, r.application.name),
            selected: r.application.id.to_string() == selected,
        })
        .collect())
}

pub(crate) async fn user_options(
    state: &SharedState,
    selected: &str,
) -> Result<Vec<SelectOption>, AppError> {
    let users = db::users::list_all(&state.pool).await?;
    Ok(users
        .iter()
        .map(|u| SelectOption {
            value: u.id.to_string(),
            label: u.display_name(),
            selected: u.id.to_string() == selected,
        })
        .collect())
}
