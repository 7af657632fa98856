use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde::Deserialize;

use super::id_param;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::export::{self, ExportError, ExportFormat};
use crate::middleware::audit;
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    pub format: Option<String>,
    pub project: Option<String>,
    /// Comma-separated record types.
    pub include: Option<String>,
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::ProjectNotFound(_) => AppError::NotFound(err.to_string()),
            ExportError::InvalidOptions(msg) => AppError::BadRequest(msg),
            ExportError::Database(e) => AppError::Database(e),
            other => AppError::Internal(other.to_string()),
        }
    }
}

pub async fn export(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ExportParams>,
) -> Result<impl IntoResponse, AppError> {
    let format = match params.format.as_deref().filter(|f| !f.is_empty()) {
        None => ExportFormat::Json,
        Some(f) => ExportFormat::parse(f)
            .ok_or_else(|| AppError::BadRequest(format!("Unsupported export format: {f}")))?,
    };
    let project_id = id_param("project", params.project.as_deref())?;
    let include = export::parse_include(params.include.as_deref().unwrap_or("").split(','))?;

    if format == ExportFormat::Csv && include.len() != 1 {
        return Err(AppError::BadRequest(
            "CSV export requires exactly one data type in include".to_string(),
        ));
    }

    let data = export::collect(&state.pool, project_id, &include).await?;
    let body = match format {
        ExportFormat::Json => export::json::to_bytes(&data)?,
        ExportFormat::Excel => export::xlsx::to_bytes(&data)?,
        ExportFormat::Csv => data
            .datasets
            .first()
            .map(export::csv::to_bytes)
            .unwrap_or_default(),
    };

    let file_name = export::default_path(std::path::Path::new(""), format, data.timestamp);
    let file_name = match format {
        ExportFormat::Csv => export::csv::file_path(&file_name, include[0]),
        _ => file_name,
    };
    let file_name = file_name.to_string_lossy().into_owned();

    tracing::info!(
        user = %auth.username,
        format = format.as_str(),
        records = data.total_records(),
        "Data exported"
    );
    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "data.exported",
        "export",
        project_id,
        Some(serde_json::json!({
            "format": format.as_str(),
            "records": data.total_records(),
        })),
    )
    .await;

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    ))
}
