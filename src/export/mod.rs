//! Snapshot of tracker data for backup and reporting.
//!
//! [`collect`] gathers the selected record types into uniform [`Dataset`]s;
//! the writer submodules turn a snapshot into JSON, CSV or XLSX bytes. Both
//! the `export` command and `GET /api/v1/export` go through here.

pub mod csv;
pub mod json;
pub mod xlsx;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::db::Page;
use crate::models::Project;

#[derive(Debug)]
pub enum ExportError {
    ProjectNotFound(Uuid),
    InvalidOptions(String),
    Database(sqlx::Error),
    Io(std::io::Error),
    Json(serde_json::Error),
    Xlsx(rust_xlsxwriter::XlsxError),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::ProjectNotFound(id) => write!(f, "Project with ID {id} not found"),
            ExportError::InvalidOptions(msg) => write!(f, "{msg}"),
            ExportError::Database(e) => write!(f, "Database error: {e}"),
            ExportError::Io(e) => write!(f, "I/O error: {e}"),
            ExportError::Json(e) => write!(f, "JSON error: {e}"),
            ExportError::Xlsx(e) => write!(f, "Excel error: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<sqlx::Error> for ExportError {
    fn from(e: sqlx::Error) -> Self {
        ExportError::Database(e)
    }
}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Io(e)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        ExportError::Json(e)
    }
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        ExportError::Xlsx(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Excel,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            "excel" | "xlsx" => Some(ExportFormat::Excel),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "excel",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

/// The record types an export can include, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Projects,
    Applications,
    Tasks,
    Artifacts,
    Decisions,
    Integrations,
}

impl RecordType {
    pub const ALL: &'static [RecordType] = &[
        RecordType::Projects,
        RecordType::Applications,
        RecordType::Tasks,
        RecordType::Artifacts,
        RecordType::Decisions,
        RecordType::Integrations,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "projects" => Some(RecordType::Projects),
            "applications" => Some(RecordType::Applications),
            "tasks" => Some(RecordType::Tasks),
            "artifacts" => Some(RecordType::Artifacts),
            "decisions" => Some(RecordType::Decisions),
            "integrations" => Some(RecordType::Integrations),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Projects => "projects",
            RecordType::Applications => "applications",
            RecordType::Tasks => "tasks",
            RecordType::Artifacts => "artifacts",
            RecordType::Decisions => "decisions",
            RecordType::Integrations => "integrations",
        }
    }

    /// Sheet name and summary label.
    pub fn title(&self) -> &'static str {
        match self {
            RecordType::Projects => "Projects",
            RecordType::Applications => "Applications",
            RecordType::Tasks => "Tasks",
            RecordType::Artifacts => "Artifacts",
            RecordType::Decisions => "Decisions",
            RecordType::Integrations => "Integrations",
        }
    }

    fn columns(&self) -> &'static [&'static str] {
        match self {
            RecordType::Projects => &[
                "id", "name", "description", "status", "owner", "start_date", "target_date",
                "created_at", "updated_at",
            ],
            RecordType::Applications => &[
                "id", "name", "description", "status", "complexity", "project_id", "project",
                "version", "estimated_weeks", "features", "tech_stack", "created_at",
                "updated_at",
            ],
            RecordType::Tasks => &[
                "id", "title", "description", "status", "priority", "assignee", "project_id",
                "project", "application_id", "application", "due_date", "estimated_hours",
                "actual_hours", "created_at", "updated_at",
            ],
            RecordType::Artifacts => &[
                "id", "name", "artifact_type", "description", "status", "version",
                "application_id", "application", "project", "file_name", "file_size",
                "created_at", "updated_at",
            ],
            RecordType::Decisions => &[
                "id", "title", "description", "rationale", "status", "impact", "project_id",
                "project", "decided_date", "decision_maker", "created_at", "updated_at",
            ],
            RecordType::Integrations => &[
                "id", "from_application", "to_application", "project", "integration_type",
                "status", "complexity", "estimated_weeks", "description", "created_at",
                "updated_at",
            ],
        }
    }
}

/// Parse an include list, rejecting unknown names. Empty means every type.
pub fn parse_include<'a, I>(names: I) -> Result<Vec<RecordType>, ExportError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut include = Vec::new();
    for name in names.into_iter().map(str::trim).filter(|n| !n.is_empty()) {
        let kind = RecordType::parse(name).ok_or_else(|| {
            ExportError::InvalidOptions(format!("Unknown data type: {name}"))
        })?;
        if !include.contains(&kind) {
            include.push(kind);
        }
    }
    if include.is_empty() {
        include.extend_from_slice(RecordType::ALL);
    }
    Ok(include)
}

/// One exported value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Int(i64),
    List(Vec<String>),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl Cell {
    /// Rendering used by CSV files and spreadsheet text cells.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Int(n) => n.to_string(),
            Cell::List(items) => items.join(", "),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
            Cell::Timestamp(t) => t.to_rfc3339(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Cell::Null => serde_json::Value::Null,
            Cell::Int(n) => serde_json::Value::from(*n),
            Cell::List(items) => serde_json::Value::from(items.clone()),
            other => serde_json::Value::String(other.to_text()),
        }
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<Uuid> for Cell {
    fn from(id: Uuid) -> Self {
        Cell::Text(id.to_string())
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Int(n)
    }
}

impl From<i32> for Cell {
    fn from(n: i32) -> Self {
        Cell::Int(n.into())
    }
}

impl From<NaiveDate> for Cell {
    fn from(d: NaiveDate) -> Self {
        Cell::Date(d)
    }
}

impl From<DateTime<Utc>> for Cell {
    fn from(t: DateTime<Utc>) -> Self {
        Cell::Timestamp(t)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Null, Into::into)
    }
}

/// All records of one type, as rows aligned with `columns`.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub kind: RecordType,
    pub columns: &'static [&'static str],
    pub rows: Vec<Vec<Cell>>,
}

impl Dataset {
    fn new(kind: RecordType) -> Self {
        Dataset {
            kind,
            columns: kind.columns(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ExportData {
    pub timestamp: DateTime<Utc>,
    pub project: Option<Project>,
    pub datasets: Vec<Dataset>,
}

impl ExportData {
    /// Project name, or `None` for a whole-database export.
    pub fn project_name(&self) -> Option<&str> {
        self.project.as_ref().map(|p| p.name.as_str())
    }

    pub fn total_records(&self) -> usize {
        self.datasets.iter().map(Dataset::len).sum()
    }

    pub fn dataset(&self, kind: RecordType) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.kind == kind)
    }
}

/// A file produced by [`write_files`].
#[derive(Debug, Clone)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub records: usize,
}

/// Gather `include` for one project (when `project_id` is set) or for all
/// projects.
pub async fn collect(
    pool: &PgPool,
    project_id: Option<Uuid>,
    include: &[RecordType],
) -> Result<ExportData, ExportError> {
    let project = match project_id {
        Some(id) => Some(
            db::projects::find_by_id(pool, id)
                .await?
                .ok_or(ExportError::ProjectNotFound(id))?,
        ),
        None => None,
    };

    let mut datasets = Vec::with_capacity(include.len());
    for kind in RecordType::ALL.iter().filter(|k| include.contains(k)) {
        let dataset = match kind {
            RecordType::Projects => projects(pool, project.as_ref()).await?,
            RecordType::Applications => applications(pool, project_id).await?,
            RecordType::Tasks => tasks(pool, project_id).await?,
            RecordType::Artifacts => artifacts(pool, project_id).await?,
            RecordType::Decisions => decisions(pool, project_id).await?,
            RecordType::Integrations => integrations(pool, project_id).await?,
        };
        datasets.push(dataset);
    }

    Ok(ExportData {
        timestamp: Utc::now(),
        project,
        datasets,
    })
}

async fn projects(pool: &PgPool, only: Option<&Project>) -> Result<Dataset, sqlx::Error> {
    let projects = match only {
        Some(p) => vec![p.clone()],
        None => db::projects::list_all(pool).await?,
    };
    let owners: HashMap<Uuid, String> = db::users::list_all(pool)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    let mut set = Dataset::new(RecordType::Projects);
    for p in projects {
        let owner = owners.get(&p.owner_id).cloned().unwrap_or_default();
        set.rows.push(vec![
            p.id.into(),
            p.name.into(),
            p.description.into(),
            p.status.into(),
            owner.into(),
            p.start_date.into(),
            p.target_date.into(),
            p.created_at.into(),
            p.updated_at.into(),
        ]);
    }
    Ok(set)
}

async fn applications(pool: &PgPool, project_id: Option<Uuid>) -> Result<Dataset, sqlx::Error> {
    let filter = db::applications::ApplicationFilter {
        project_id,
        ..Default::default()
    };
    let rows = db::applications::list(pool, &filter, Page::all()).await?;

    let mut set = Dataset::new(RecordType::Applications);
    for row in rows {
        let a = row.application;
        set.rows.push(vec![
            a.id.into(),
            a.name.into(),
            a.description.into(),
            a.status.into(),
            a.complexity.into(),
            a.project_id.into(),
            row.project_name.into(),
            a.version.into(),
            a.estimated_weeks.into(),
            Cell::List(a.features.0),
            Cell::List(a.tech_stack.0),
            a.created_at.into(),
            a.updated_at.into(),
        ]);
    }
    Ok(set)
}

async fn tasks(pool: &PgPool, project_id: Option<Uuid>) -> Result<Dataset, sqlx::Error> {
    let filter = db::tasks::TaskFilter {
        project_id,
        ..Default::default()
    };
    let rows = db::tasks::list(pool, &filter, Page::all()).await?;

    let mut set = Dataset::new(RecordType::Tasks);
    for row in rows {
        let t = row.task;
        set.rows.push(vec![
            t.id.into(),
            t.title.into(),
            t.description.into(),
            t.status.into(),
            t.priority.into(),
            t.assignee.into(),
            row.project_id.into(),
            row.project_name.into(),
            t.application_id.into(),
            row.application_name.into(),
            t.due_date.into(),
            t.estimated_hours.into(),
            t.actual_hours.into(),
            t.created_at.into(),
            t.updated_at.into(),
        ]);
    }
    Ok(set)
}

async fn artifacts(pool: &PgPool, project_id: Option<Uuid>) -> Result<Dataset, sqlx::Error> {
    let filter = db::artifacts::ArtifactFilter {
        project_id,
        ..Default::default()
    };
    let rows = db::artifacts::list(pool, &filter, Page::all()).await?;

    let mut set = Dataset::new(RecordType::Artifacts);
    for row in rows {
        let a = row.artifact;
        set.rows.push(vec![
            a.id.into(),
            a.name.into(),
            a.artifact_type.into(),
            a.description.into(),
            a.status.into(),
            a.version.into(),
            a.application_id.into(),
            row.application_name.into(),
            row.project_name.into(),
            a.file_name.into(),
            a.file_size.into(),
            a.created_at.into(),
            a.updated_at.into(),
        ]);
    }
    Ok(set)
}

async fn decisions(pool: &PgPool, project_id: Option<Uuid>) -> Result<Dataset, sqlx::Error> {
    let filter = db::decisions::DecisionFilter {
        project_id,
        ..Default::default()
    };
    let rows = db::decisions::list(pool, &filter, Page::all()).await?;

    let mut set = Dataset::new(RecordType::Decisions);
    for row in rows {
        let d = row.decision;
        set.rows.push(vec![
            d.id.into(),
            d.title.into(),
            d.description.into(),
            d.rationale.into(),
            d.status.into(),
            d.impact.into(),
            d.project_id.into(),
            row.project_name.into(),
            d.decided_date.into(),
            d.decision_maker.into(),
            d.created_at.into(),
            d.updated_at.into(),
        ]);
    }
    Ok(set)
}

async fn integrations(pool: &PgPool, project_id: Option<Uuid>) -> Result<Dataset, sqlx::Error> {
    let filter = db::integrations::IntegrationFilter {
        project_id,
        ..Default::default()
    };
    let rows = db::integrations::list(pool, &filter, Page::all()).await?;

    let mut set = Dataset::new(RecordType::Integrations);
    for row in rows {
        let i = row.integration;
        set.rows.push(vec![
            i.id.into(),
            row.from_app_name.into(),
            row.to_app_name.into(),
            row.project_name.into(),
            i.integration_type.into(),
            i.status.into(),
            i.complexity.into(),
            i.estimated_weeks.into(),
            i.description.into(),
            i.created_at.into(),
            i.updated_at.into(),
        ]);
    }
    Ok(set)
}

/// `<dir>/devtracker_export_<YYYYmmdd_HHMMSS>.<ext>`
pub fn default_path(dir: &Path, format: ExportFormat, now: DateTime<Utc>) -> PathBuf {
    dir.join(format!(
        "devtracker_export_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    ))
}

/// Write `data` to disk. JSON and Excel produce `path` itself; CSV produces
/// one `<stem>_<type>.csv` per non-empty type next to it.
pub fn write_files(
    data: &ExportData,
    format: ExportFormat,
    path: &Path,
) -> Result<Vec<WrittenFile>, ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    match format {
        ExportFormat::Json => {
            std::fs::write(path, json::to_bytes(data)?)?;
            Ok(vec![WrittenFile {
                path: path.to_path_buf(),
                records: data.total_records(),
            }])
        }
        ExportFormat::Excel => {
            std::fs::write(path, xlsx::to_bytes(data)?)?;
            Ok(vec![WrittenFile {
                path: path.to_path_buf(),
                records: data.total_records(),
            }])
        }
        ExportFormat::Csv => {
            let mut written = Vec::new();
            for dataset in data.datasets.iter().filter(|d| !d.is_empty()) {
                let csv_path = csv::file_path(path, dataset.kind);
                std::fs::write(&csv_path, csv::to_bytes(dataset))?;
                written.push(WrittenFile {
                    path: csv_path,
                    records: dataset.len(),
                });
            }
            Ok(written)
        }
    }
}
