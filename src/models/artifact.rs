use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)$").expect("valid version pattern"));

pub const INITIAL_VERSION: &str = "1.0";

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Artifact {
    pub id: Uuid,
    pub application_id: Option<Uuid>,
    pub name: String,
    pub artifact_type: Option<String>,
    pub description: String,
    pub content: String,
    pub version: String,
    pub status: String,
    #[serde(skip_serializing)]
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Artifact {
    /// Stored file size in megabytes, two decimals; zero without a file.
    pub fn file_size_mb(&self) -> f64 {
        match self.file_size {
            Some(bytes) => (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0,
            None => 0.0,
        }
    }

    pub fn has_file(&self) -> bool {
        self.file_path.is_some()
    }
}

/// Bump the minor part of a `major.minor` version. Anything unparsable
/// restarts at `1.1`.
pub fn next_version(current: &str) -> String {
    VERSION_RE
        .captures(current.trim())
        .and_then(|caps| {
            let major: u32 = caps[1].parse().ok()?;
            let minor: u32 = caps[2].parse().ok()?;
            Some(format!("{major}.{}", minor + 1))
        })
        .unwrap_or_else(|| "1.1".to_string())
}
