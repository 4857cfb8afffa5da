use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageDto, UserDto};
use crate::config::Config;
use crate::entities::users;
use crate::security;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// ============================================================================
// Session cookie plumbing
// ============================================================================

/// Pull the session token out of the Cookie header, if any.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').map(str::trim).find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        (name == cookie_name && !value.is_empty()).then(|| value.to_string())
    })
}

/// Effective SameSite/Secure pair for the session cookie. In development
/// a strict/lax default is promoted to None+Secure so the cookie survives
/// cross-origin requests from a dev frontend; production values pass
/// through untouched.
fn cookie_flags(config: &Config) -> (String, bool) {
    let samesite = config.session.cookie_samesite.to_ascii_lowercase();
    if config.server.is_development() && matches!(samesite.as_str(), "strict" | "lax") {
        return ("None".to_string(), true);
    }
    let samesite = match samesite.as_str() {
        "strict" => "Strict",
        "none" => "None",
        _ => "Lax",
    };
    (samesite.to_string(), config.session.cookie_secure)
}

fn build_session_cookie(config: &Config, token: &str, max_age_seconds: i64) -> String {
    let (samesite, secure) = cookie_flags(config);
    let mut cookie = format!(
        "{name}={token}; HttpOnly; Path=/; Max-Age={max_age_seconds}; SameSite={samesite}",
        name = config.session.cookie_name,
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn clear_session_cookie(config: &Config) -> String {
    build_session_cookie(config, "", 0)
}

/// Resolve the session cookie to a user, if one is present and valid.
/// Absent cookie, unknown token, expired session and vanished user all
/// collapse to None; only store failures surface as errors.
pub async fn optional_user(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<users::Model>, ApiError> {
    let Some(token) = session_token(headers, &state.config.session.cookie_name) else {
        return Ok(None);
    };

    let Some(user_id) = state.store.resolve_session(&token).await? else {
        return Ok(None);
    };

    Ok(state.store.find_user_by_id(user_id).await?)
}

/// Session-authenticated user or 401.
pub async fn require_user(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<users::Model, ApiError> {
    optional_user(state, headers)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/auth/login
/// The failure message is identical for unknown usernames and wrong
/// passwords so the endpoint cannot be used for account enumeration.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Username and password are required"));
    }
    if payload.password.len() > security::MAX_PASSWORD_BYTES {
        return Err(ApiError::validation(format!(
            "Password cannot be longer than {} bytes",
            security::MAX_PASSWORD_BYTES
        )));
    }

    let is_valid = state
        .store
        .verify_user_password(&payload.username, &payload.password)
        .await?;

    if !is_valid {
        tracing::warn!(username = %payload.username, "Failed login attempt");
        return Err(ApiError::unauthorized("Invalid username or password"));
    }

    let user = state
        .store
        .find_user_by_username(&payload.username)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid username or password"))?;

    state.store.touch_last_login(user.id).await?;

    let token = state
        .store
        .create_session(user.id, state.config.session.ttl_minutes)
        .await?;

    let cookie = build_session_cookie(
        &state.config,
        &token,
        state.config.session.ttl_minutes * 60,
    );

    tracing::info!(username = %user.username, user_id = user.id, "Login successful");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::success(UserDto::from(user))),
    ))
}

/// POST /api/v1/auth/logout
/// Destroys the session row and clears the cookie. Idempotent: an absent
/// or already-dead session still yields a success.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = session_token(&headers, &state.config.session.cookie_name) {
        state.store.destroy_session(&token).await?;
    }

    Ok((
        [(header::SET_COOKIE, clear_session_cookie(&state.config))],
        Json(ApiResponse::success(MessageDto::new("Logged out"))),
    ))
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = require_user(&state, &headers).await?;
    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// POST /api/v1/auth/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageDto>>, ApiError> {
    let user = require_user(&state, &headers).await?;

    if payload.new_password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "New password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    // Both passwords hit bcrypt, so both get the byte ceiling up front.
    if payload.current_password.len() > security::MAX_PASSWORD_BYTES
        || payload.new_password.len() > security::MAX_PASSWORD_BYTES
    {
        return Err(ApiError::validation(format!(
            "Password cannot be longer than {} bytes",
            security::MAX_PASSWORD_BYTES
        )));
    }
    if payload.current_password == payload.new_password {
        return Err(ApiError::validation(
            "New password must be different from current password",
        ));
    }

    let is_valid = state
        .store
        .verify_user_password(&user.username, &payload.current_password)
        .await?;

    if !is_valid {
        return Err(ApiError::validation("Current password is incorrect"));
    }

    state
        .store
        .update_user_password(user.id, &payload.new_password)
        .await?;

    tracing::info!(username = %user.username, "Password changed");

    Ok(Json(ApiResponse::success(MessageDto::new(
        "Password updated successfully",
    ))))
}
