use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::User;

/// Lifetime of an access token; the refresh token outlives it.
pub const ACCESS_TOKEN_MINUTES: i64 = 15;

/// Access-token payload. Carries enough to authorize a request without a
/// database round trip.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    pub adm: bool,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn for_user(user: &User) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id,
            name: user.username.clone(),
            adm: user.is_admin,
            iat: now.timestamp(),
            exp: (now + Duration::minutes(ACCESS_TOKEN_MINUTES)).timestamp(),
        }
    }
}

pub fn sign_access_token(user: &User, secret: &str) -> Result<String, AppError> {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &Claims::for_user(user),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign access token: {e}")))
}

/// Rejects tampered, expired or otherwise malformed tokens as 401.
pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("Rejected access token: {e}");
            AppError::Unauthorized("Invalid or expired token".to_string())
        })
}
