//! Case-insensitive substring search across the tracked entities.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::like_pattern;

/// One search hit, already shaped for the API and the search page.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct SearchHit {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: String,
    pub context: Option<String>,
}

impl SearchHit {
    /// Page that shows the matched record.
    pub fn url(&self) -> String {
        let section = match self.kind.as_str() {
            "project" => "projects",
            "application" => "applications",
            "task" => "tasks",
            "artifact" => "artifacts",
            "decision" => "decisions",
            _ => "integrations",
        };
        format!("/{section}/{}", self.id)
    }
}

const SEARCH_SQL: &str = "
(SELECT 'project' AS kind, id, name AS title, left(description, 100) AS description,
        status, NULL::text AS context
   FROM projects WHERE name ILIKE $1 OR description ILIKE $1
   ORDER BY updated_at DESC LIMIT $2)
UNION ALL
(SELECT 'application', a.id, a.name, left(a.description, 100), a.status, p.name
   FROM applications a JOIN projects p ON a.project_id = p.id
   WHERE a.name ILIKE $1 OR a.description ILIKE $1
   ORDER BY a.updated_at DESC LIMIT $2)
UNION ALL
(SELECT 'task', t.id, t.title, left(t.description, 100), t.status, a.name
   FROM tasks t JOIN applications a ON t.application_id = a.id
   WHERE t.title ILIKE $1 OR t.description ILIKE $1
   ORDER BY t.updated_at DESC LIMIT $2)
UNION ALL
(SELECT 'artifact', ar.id, ar.name, left(ar.description, 100), ar.status, a.name
   FROM artifacts ar LEFT JOIN applications a ON ar.application_id = a.id
   WHERE ar.name ILIKE $1 OR ar.description ILIKE $1 OR ar.content ILIKE $1
   ORDER BY ar.updated_at DESC LIMIT $2)
UNION ALL
(SELECT 'decision', d.id, d.title, left(d.description, 100), d.status, p.name
   FROM decisions d JOIN projects p ON d.project_id = p.id
   WHERE d.title ILIKE $1 OR d.description ILIKE $1 OR d.rationale ILIKE $1
   ORDER BY d.updated_at DESC LIMIT $2)
UNION ALL
(SELECT 'integration', i.id, fa.name || ' -> ' || ta.name, left(i.description, 100), i.status,
        i.integration_type
   FROM integrations i
   JOIN applications fa ON i.from_app_id = fa.id
   JOIN applications ta ON i.to_app_id = ta.id
   WHERE i.description ILIKE $1 OR fa.name ILIKE $1 OR ta.name ILIKE $1
   ORDER BY i.updated_at DESC LIMIT $2)";

/// At most `per_type` hits for each entity type, grouped by type.
pub async fn search(pool: &PgPool, term: &str, per_type: i64) -> Result<Vec<SearchHit>, sqlx::Error> {
    sqlx::query_as::<_, SearchHit>(SEARCH_SQL)
        .bind(like_pattern(term))
        .bind(per_type)
        .fetch_all(pool)
        .await
}

/// Name completions: `Project: <name>` and `App: <name>`.
pub async fn suggestions(pool: &PgPool, term: &str, per_type: i64) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "(SELECT 'Project: ' || name FROM projects WHERE name ILIKE $1 ORDER BY name LIMIT $2)
         UNION ALL
         (SELECT 'App: ' || name FROM applications WHERE name ILIKE $1 ORDER BY name LIMIT $2)",
    )
    .bind(like_pattern(term))
    .bind(per_type)
    .fetch_all(pool)
    .await
}
