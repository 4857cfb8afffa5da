use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

use super::access::authorize_board_write;
use super::{AccessTokenCreatedDto, AccessTokenDto, ApiError, ApiResponse, AppState};
use crate::db::TokenPatch;

#[derive(Deserialize)]
pub struct CreateTokenRequest {
    pub name: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct UpdateTokenRequest {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    /// Present-and-null clears the expiry (never expires); absent leaves
    /// it untouched.
    #[serde(default, deserialize_with = "present")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::deserialize(deserializer).map(Some)
}

/// POST /api/v1/boards/{id}/access-tokens
/// The response is the only place the plaintext secret ever appears.
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<i32>,
    headers: HeaderMap,
    Json(payload): Json<CreateTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_board_write(&state, board_id, &headers).await?;

    let (token, secret) = state
        .store
        .issue_access_token(board_id, payload.name, payload.expires_at)
        .await?;

    tracing::info!(board_id, token_id = token.id, "Access token issued");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AccessTokenCreatedDto {
            token: AccessTokenDto::from(token),
            secret,
        })),
    ))
}

/// GET /api/v1/boards/{id}/access-tokens
pub async fn list_tokens(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<i32>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Vec<AccessTokenDto>>>, ApiError> {
    authorize_board_write(&state, board_id, &headers).await?;

    let tokens = state.store.list_access_tokens(board_id).await?;

    Ok(Json(ApiResponse::success(
        tokens.into_iter().map(AccessTokenDto::from).collect(),
    )))
}

/// PATCH /api/v1/boards/{id}/access-tokens/{token_id}
pub async fn update_token(
    State(state): State<Arc<AppState>>,
    Path((board_id, token_id)): Path<(i32, i32)>,
    headers: HeaderMap,
    Json(payload): Json<UpdateTokenRequest>,
) -> Result<Json<ApiResponse<AccessTokenDto>>, ApiError> {
    authorize_board_write(&state, board_id, &headers).await?;

    let token = state
        .store
        .find_access_token(board_id, token_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Access token", token_id))?;

    let token = state
        .store
        .update_access_token(
            token,
            TokenPatch {
                name: payload.name,
                is_active: payload.is_active,
                expires_at: payload.expires_at,
            },
        )
        .await?;

    tracing::info!(board_id, token_id, "Access token updated");

    Ok(Json(ApiResponse::success(AccessTokenDto::from(token))))
}

/// DELETE /api/v1/boards/{id}/access-tokens/{token_id}
/// Hard delete; use PATCH with `is_active: false` for revocation.
pub async fn delete_token(
    State(state): State<Arc<AppState>>,
    Path((board_id, token_id)): Path<(i32, i32)>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    authorize_board_write(&state, board_id, &headers).await?;

    if !state.store.delete_access_token(board_id, token_id).await? {
        return Err(ApiError::not_found("Access token", token_id));
    }

    tracing::info!(board_id, token_id, "Access token deleted");

    Ok(StatusCode::NO_CONTENT)
}
