//! Access/refresh token pairs and the cookies that carry them.

use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::auth::jwt;
use crate::db;
use crate::error::AppError;
use crate::models::User;

pub const REFRESH_TOKEN_DAYS: i64 = 7;

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// Sign an access token and persist a fresh refresh token for `user`.
pub async fn issue(pool: &PgPool, jwt_secret: &str, user: User) -> Result<AuthResponse, AppError> {
    let access_token = jwt::sign_access_token(&user, jwt_secret)?;

    let refresh_token = generate_refresh_token();
    db::refresh_tokens::create(
        pool,
        user.id,
        &hash_token(&refresh_token),
        Utc::now() + Duration::days(REFRESH_TOKEN_DAYS),
    )
    .await?;

    Ok(AuthResponse {
        access_token,
        refresh_token,
        user,
    })
}

/// Trade a presented refresh token for a new pair. A token that was
/// already spent signals theft, so every session of its owner ends.
pub async fn rotate(pool: &PgPool, jwt_secret: &str, presented: &str) -> Result<AuthResponse, AppError> {
    let token_hash = hash_token(presented);

    let Some(stored) = db::refresh_tokens::claim(pool, &token_hash).await? else {
        if let Some(user_id) = db::refresh_tokens::owner_of(pool, &token_hash).await? {
            tracing::warn!(%user_id, "Refresh token reuse detected, revoking all sessions");
            db::refresh_tokens::revoke_user(pool, user_id).await?;
            return Err(AppError::Unauthorized(
                "Refresh token reuse detected. All sessions revoked.".to_string(),
            ));
        }
        return Err(AppError::Unauthorized("Invalid refresh token".to_string()));
    };

    if stored.expires_at < Utc::now() {
        return Err(AppError::Unauthorized("Refresh token expired".to_string()));
    }

    let user = db::users::find_by_id(pool, stored.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    issue(pool, jwt_secret, user).await
}

pub fn cookies(session: &AuthResponse, secure: bool) -> CookieJar {
    let access = Cookie::build(("access_token", session.access_token.clone()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(jwt::ACCESS_TOKEN_MINUTES))
        .build();

    let refresh = Cookie::build(("refresh_token", session.refresh_token.clone()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(REFRESH_TOKEN_DAYS))
        .build();

    CookieJar::new().add(access).add(refresh)
}

pub fn clear_cookies() -> CookieJar {
    let access = Cookie::build(("access_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    let refresh = Cookie::build(("refresh_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    CookieJar::new().add(access).add(refresh)
}

fn generate_refresh_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
