use axum::extract::State;
use axum::Json;
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::auth::session::{self, AuthResponse};
use crate::auth::{password, AuthUser};
use crate::config::RegistrationMode;
use crate::db;
use crate::db::users::NewUser;
use crate::error::AppError;
use crate::forms::auth::{check_password, ProfileInput, RegisterInput};
use crate::forms::FieldErrors;
use crate::middleware::audit;
use crate::models::User;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct LoginRequest {
    /// Username or email address.
    #[serde(alias = "email")]
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterInput>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let data = req.validate()?;
    let pw_hash = password::hash(&data.password).map_err(AppError::Internal)?;

    // Advisory lock serialises the first-user bootstrap
    let mut tx = state.pool.begin().await?;
    sqlx::query("SELECT pg_advisory_xact_lock(1)")
        .execute(&mut *tx)
        .await?;

    let existing = db::users::count_all(&mut *tx).await?;
    if existing > 0 && state.config.registration == RegistrationMode::Closed {
        return Err(AppError::Forbidden(
            "Registration is disabled. Ask an administrator for an account.".to_string(),
        ));
    }

    let user = db::users::create(
        &mut *tx,
        &NewUser {
            username: &data.username,
            email: &data.email,
            password_hash: &pw_hash,
            first_name: &data.first_name,
            last_name: &data.last_name,
            role: data.role.as_str(),
            is_admin: existing == 0,
        },
    )
    .await
    .map_err(|e| {
        AppError::from_constraint(e, "A user with that username or email already exists")
    })?;

    tx.commit().await?;

    tracing::info!(username = %user.username, admin = user.is_admin, "User registered");
    audit::log_event(
        &state.pool,
        Some(user.id),
        "user.registered",
        "user",
        Some(user.id),
        None,
    )
    .await;

    let session = session::issue(&state.pool, &state.config.jwt_secret, user).await?;
    let jar = session::cookies(&session, state.config.secure_cookies());
    Ok((jar, Json(session)))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let login = req.username.trim();

    if state.login_limiter.check(login).is_err() {
        tracing::warn!(login, "Login rate limit hit");
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let Some(user) = db::users::find_by_login(&state.pool, login).await? else {
        password::verify_dummy(&req.password);
        state.login_limiter.record_failure(login);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };

    let valid = password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        state.login_limiter.record_failure(login);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }
    state.login_limiter.reset(login);

    audit::log_event(
        &state.pool,
        Some(user.id),
        "user.login",
        "user",
        Some(user.id),
        None,
    )
    .await;

    let session = session::issue(&state.pool, &state.config.jwt_secret, user).await?;
    let jar = session::cookies(&session, state.config.secure_cookies());
    Ok((jar, Json(session)))
}

pub async fn refresh(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let refresh_value = jar
        .get("refresh_token")
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token".to_string()))?;

    let session = session::rotate(&state.pool, &state.config.jwt_secret, &refresh_value).await?;
    let jar = session::cookies(&session, state.config.secure_cookies());
    Ok((jar, Json(session)))
}

pub async fn logout(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    if let Some(cookie) = jar.get("refresh_token") {
        db::refresh_tokens::revoke(&state.pool, &session::hash_token(cookie.value())).await?;
    }

    Ok((
        session::clear_cookies(),
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

pub async fn change_password(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let mut errors = FieldErrors::new();
    check_password(&mut errors, "new_password", &req.new_password);
    errors.into_result(())?;

    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let valid = password::verify(&req.current_password, &user.password_hash)
        .map_err(AppError::Internal)?;
    if !valid {
        let mut errors = FieldErrors::new();
        errors.add("current_password", "Your old password was entered incorrectly.");
        return Err(errors.into());
    }

    let pw_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, user.id, &pw_hash).await?;

    // Every other session ends with the old password
    db::refresh_tokens::revoke_user(&state.pool, user.id).await?;

    audit::log_event(
        &state.pool,
        Some(user.id),
        "user.password_changed",
        "user",
        Some(user.id),
        None,
    )
    .await;

    let session = session::issue(&state.pool, &state.config.jwt_secret, user).await?;
    let jar = session::cookies(&session, state.config.secure_cookies());
    Ok((jar, Json(session)))
}

pub async fn me(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<User>, AppError> {
    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;
    Ok(Json(user))
}

pub async fn update_me(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<ProfileInput>,
) -> Result<Json<User>, AppError> {
    let profile = req.validate()?;

    let user = db::users::update_profile(&state.pool, auth.user_id, &profile)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::Unauthorized("User not found".to_string()),
            e => AppError::from_constraint(e, "That email address is already in use"),
        })?;

    audit::log_event(
        &state.pool,
        Some(user.id),
        "user.profile_updated",
        "user",
        Some(user.id),
        None,
    )
    .await;

    Ok(Json(user))
}
