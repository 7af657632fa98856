//! Artifact file storage.

pub mod local;
pub mod upload;

use async_trait::async_trait;
use bytes::Bytes;

pub use local::LocalFileStore;

#[derive(Debug)]
pub struct StorageError {
    pub message: String,
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError {
            message: format!("I/O error: {e}"),
        }
    }
}

impl From<String> for StorageError {
    fn from(s: String) -> Self {
        StorageError { message: s }
    }
}

/// Where uploaded artifact files live. Keys are relative, `/`-separated paths.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn save(&self, key: &str, data: Bytes) -> Result<(), StorageError>;
    async fn load(&self, key: &str) -> Result<Bytes, StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Storage key for an artifact upload: `artifacts/<project>/<application>/<file>`.
/// Each segment is reduced to a safe file name.
pub fn artifact_key(project: &str, application: &str, file_name: &str) -> String {
    format!(
        "artifacts/{}/{}/{}",
        sanitize_segment(project),
        sanitize_segment(application),
        sanitize_segment(file_name)
    )
}

/// Drop path separators, quotes, `..` and control characters; whitespace
/// becomes `_`. The result is also safe inside a quoted header parameter.
pub fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .replace("..", "")
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '"') && !c.is_control())
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_').to_string();
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

/// MIME type served for a stored file, by extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" | "py" => "text/plain; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",
        "js" => "text/javascript; charset=utf-8",
        "html" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "json" => "application/json",
        "xml" => "application/xml",
        _ => "application/octet-stream",
    }
}
