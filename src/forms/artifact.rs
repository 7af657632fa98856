use serde::Deserialize;
use uuid::Uuid;

use super::{choice, optional_text, required_text, FieldErrors};
use crate::models::choices::{ArtifactStatus, ArtifactType};

/// Extensions accepted for artifact uploads.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "txt", "py", "js", "html", "css", "md", "json", "xml",
];

#[derive(Debug, Default, Deserialize)]
pub struct ArtifactInput {
    pub application_id: Option<Uuid>,
    pub name: Option<String>,
    #[serde(rename = "type", alias = "artifact_type")]
    pub artifact_type: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub version: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub increment_version: bool,
}

#[derive(Debug, Clone)]
pub struct ArtifactData {
    pub application_id: Option<Uuid>,
    pub name: String,
    pub artifact_type: Option<ArtifactType>,
    pub description: String,
    pub content: String,
    /// Explicit version, if one was sent.
    pub version: Option<String>,
    pub status: ArtifactStatus,
    pub increment_version: bool,
}

impl ArtifactInput {
    pub fn validate(&self) -> Result<ArtifactData, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = required_text(&mut errors, "name", self.name.as_deref(), Some(200));
        let content = required_text(&mut errors, "content", self.content.as_deref(), None);
        let description = optional_text(&mut errors, "description", self.description.as_deref(), None);

        let artifact_type = match self.artifact_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(v) => {
                let parsed = ArtifactType::parse(v);
                if parsed.is_none() {
                    errors.add(
                        "type",
                        format!(
                            "Select a valid choice. '{v}' is not one of: {}.",
                            ArtifactType::expected()
                        ),
                    );
                }
                parsed
            }
        };

        let status = choice(
            &mut errors,
            "status",
            self.status.as_deref(),
            ArtifactStatus::Draft,
            ArtifactStatus::parse,
            ArtifactStatus::expected,
        );

        let version = optional_text(&mut errors, "version", self.version.as_deref(), Some(10));
        let version = (!version.is_empty()).then_some(version);

        errors.into_result(ArtifactData {
            application_id: self.application_id,
            name,
            artifact_type,
            description,
            content,
            version,
            status,
            increment_version: self.increment_version,
        })
    }
}

/// Check an uploaded file against the size limit and extension allow-list.
pub fn validate_upload(file_name: &str, size: usize, max_size: usize) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if file_name.trim().is_empty() {
        errors.add("file", "No file was submitted.");
        return Err(errors);
    }

    if size > max_size {
        let max_mb = max_size / (1024 * 1024);
        errors.add("file", format!("File size cannot exceed {max_mb}MB."));
    }

    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        errors.add(
            "file",
            format!(
                "File type '{extension}' not allowed. Allowed types: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ),
        );
    }

    errors.into_result(())
}
