use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::auth::jwt;
use crate::error::AppError;
use crate::state::SharedState;

/// The signed-in user, taken from a bearer token or the `access_token` cookie.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub is_admin: bool,
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }

    /// Owners may change their own records; admins may change anything.
    pub fn require_owner_or_admin(&self, owner_id: Uuid) -> Result<(), AppError> {
        if self.is_admin || self.user_id == owner_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only the owner or an admin can do that".to_string(),
            ))
        }
    }

    fn from_token(token: &str, secret: &str) -> Result<Self, AppError> {
        let claims = jwt::verify_access_token(token, secret)?;
        Ok(AuthUser {
            user_id: claims.sub,
            username: claims.name,
            is_admin: claims.adm,
        })
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth_header) = parts.headers.get("authorization") {
            let auth_str = auth_header
                .to_str()
                .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return AuthUser::from_token(token, &state.config.jwt_secret);
            }
        }

        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(cookie) = jar.get("access_token") {
            return AuthUser::from_token(cookie.value(), &state.config.jwt_secret);
        }

        Err(AppError::Unauthorized(
            "Missing authentication token".to_string(),
        ))
    }
}
