use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Server-side record of a refresh token. Only the SHA-256 of the token is
/// stored; a row is spent once and then kept until expiry for reuse detection.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}
