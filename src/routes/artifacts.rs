use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{deleted, id_param, page_from, unknown_choice, Paginated};
use crate::auth::AuthUser;
use crate::db;
use crate::db::artifacts::{ArtifactFilter, ArtifactRow};
use crate::error::AppError;
use crate::forms::artifact::{validate_upload, ArtifactData, ArtifactInput};
use crate::middleware::audit;
use crate::models::{next_version, Artifact, INITIAL_VERSION};
use crate::state::SharedState;
use crate::storage::{self, upload};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub application: Option<String>,
    pub project: Option<String>,
    #[serde(rename = "type")]
    pub artifact_type: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListParams {
    pub(crate) fn filter(&self) -> Result<ArtifactFilter, AppError> {
        Ok(ArtifactFilter {
            application_id: id_param("application", self.application.as_deref())?,
            project_id: id_param("project", self.project.as_deref())?,
            artifact_type: self.artifact_type.clone(),
            status: self.status.clone(),
            search: self.search.clone(),
            updated_since: None,
        })
    }
}

/// An artifact as the API returns it: the row plus its derived file figures.
#[derive(Serialize)]
pub struct ArtifactView {
    #[serde(flatten)]
    pub artifact: Artifact,
    pub has_file: bool,
    pub file_size_mb: f64,
    pub download_url: Option<String>,
}

impl From<Artifact> for ArtifactView {
    fn from(artifact: Artifact) -> Self {
        let download_url = artifact
            .has_file()
            .then(|| format!("/api/v1/artifacts/{}/download", artifact.id));
        Self {
            has_file: artifact.has_file(),
            file_size_mb: artifact.file_size_mb(),
            download_url,
            artifact,
        }
    }
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<ArtifactRow>>, AppError> {
    let filter = params.filter()?;
    let page = page_from(params.page, params.per_page);

    let artifacts = db::artifacts::list(&state.pool, &filter, page).await?;
    let total = db::artifacts::count(&state.pool, &filter).await?;

    Ok(Json(Paginated::new(artifacts, total, page)))
}

async fn check_application(state: &SharedState, data: &ArtifactData) -> Result<(), AppError> {
    if let Some(application_id) = data.application_id {
        db::applications::find_by_id(&state.pool, application_id)
            .await?
            .ok_or_else(|| unknown_choice("application_id"))?;
    }
    Ok(())
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<ArtifactInput>,
) -> Result<Json<ArtifactView>, AppError> {
    let data = req.validate()?;
    check_application(&state, &data).await?;

    let version = data.version.clone().unwrap_or_else(|| INITIAL_VERSION.to_string());
    let artifact = db::artifacts::create(&state.pool, Some(auth.user_id), &version, &data)
        .await
        .map_err(|e| AppError::from_constraint(e, "Artifact already exists"))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "artifact.created",
        "artifact",
        Some(artifact.id),
        Some(serde_json::json!({ "name": artifact.name, "version": artifact.version })),
    )
    .await;

    Ok(Json(artifact.into()))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ArtifactView>, AppError> {
    let artifact = db::artifacts::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Artifact not found".to_string()))?;
    Ok(Json(artifact.into()))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ArtifactInput>,
) -> Result<Json<ArtifactView>, AppError> {
    let existing = db::artifacts::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Artifact not found".to_string()))?;

    let data = req.validate()?;
    check_application(&state, &data).await?;

    let version = if data.increment_version {
        next_version(&existing.version)
    } else {
        data.version.clone().unwrap_or_else(|| existing.version.clone())
    };

    let artifact = db::artifacts::update(&state.pool, id, &version, &data)
        .await
        .map_err(|e| AppError::from_constraint(e, "Artifact already exists"))?
        .ok_or_else(|| AppError::NotFound("Artifact not found".to_string()))?;

    if artifact.version != existing.version {
        tracing::info!(
            artifact = %artifact.name,
            from = %existing.version,
            to = %artifact.version,
            "Artifact version changed"
        );
    }
    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "artifact.updated",
        "artifact",
        Some(artifact.id),
        Some(serde_json::json!({ "version": artifact.version })),
    )
    .await;

    Ok(Json(artifact.into()))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let existing = db::artifacts::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Artifact not found".to_string()))?;

    db::artifacts::delete(&state.pool, id).await?;

    if let Some(path) = existing.file_path.as_deref() {
        if let Err(e) = state.store.delete(path).await {
            tracing::warn!(path, "Failed to remove artifact file: {e}");
        }
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "artifact.deleted",
        "artifact",
        Some(id),
        None,
    )
    .await;

    Ok(deleted())
}

/// Storage key for a new upload, made unique when another artifact already
/// uses the plain name.
async fn storage_key(
    state: &SharedState,
    artifact: &Artifact,
    file_name: &str,
) -> Result<String, AppError> {
    let (project, application) = match db::artifacts::find_row(&state.pool, artifact.id).await? {
        Some(row) => (
            row.project_name.unwrap_or_else(|| "unassigned".to_string()),
            row.application_name.unwrap_or_else(|| "unassigned".to_string()),
        ),
        None => ("unassigned".to_string(), "unassigned".to_string()),
    };

    let key = storage::artifact_key(&project, &application, file_name);
    if !db::artifacts::file_path_taken(&state.pool, &key, artifact.id).await? {
        return Ok(key);
    }

    let id = artifact.id.simple().to_string();
    let suffix = &id[..7];
    let unique_name = match file_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{suffix}.{ext}"),
        None => format!("{file_name}_{suffix}"),
    };
    Ok(storage::artifact_key(&project, &application, &unique_name))
}

pub async fn upload(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ArtifactView>, AppError> {
    let artifact = db::artifacts::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Artifact not found".to_string()))?;

    let file = upload::parse_file_upload(&headers, body)
        .await
        .map_err(|msg| {
            let mut errors = crate::forms::FieldErrors::new();
            errors.add("file", msg);
            AppError::Validation(errors)
        })?;
    validate_upload(&file.file_name, file.data.len(), state.config.max_upload_size)?;

    let key = storage_key(&state, &artifact, &file.file_name).await?;
    let size = file.data.len() as i64;
    state.store.save(&key, file.data).await?;

    let updated = db::artifacts::set_file(&state.pool, id, &key, &file.file_name, size)
        .await?
        .ok_or_else(|| AppError::NotFound("Artifact not found".to_string()))?;

    if let Some(old) = artifact.file_path.as_deref().filter(|old| *old != key) {
        if let Err(e) = state.store.delete(old).await {
            tracing::warn!(path = old, "Failed to remove replaced artifact file: {e}");
        }
    }

    tracing::info!(artifact = %updated.name, file = %file.file_name, bytes = size, "Artifact file uploaded");
    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "artifact.file_uploaded",
        "artifact",
        Some(id),
        Some(serde_json::json!({ "file_name": file.file_name, "size": size })),
    )
    .await;

    Ok(Json(updated.into()))
}

pub async fn download(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let artifact = db::artifacts::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Artifact not found".to_string()))?;

    let path = artifact
        .file_path
        .as_deref()
        .ok_or_else(|| AppError::NotFound("Artifact has no file".to_string()))?;
    let data = state.store.load(path).await.map_err(|e| {
        tracing::warn!(path, "Artifact file missing from storage: {e}");
        AppError::NotFound("Artifact file not found".to_string())
    })?;

    let file_name = artifact
        .file_name
        .as_deref()
        .map(storage::sanitize_segment)
        .unwrap_or_else(|| "download".to_string());

    Ok((
        [
            (
                header::CONTENT_TYPE,
                storage::content_type_for(&file_name).to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        data,
    ))
}

pub async fn versions(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ArtifactView>>, AppError> {
    let artifact = db::artifacts::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Artifact not found".to_string()))?;

    let history = db::artifacts::version_history(&state.pool, &artifact).await?;
    Ok(Json(history.into_iter().map(ArtifactView::from).collect()))
}
