use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::access::{authorize_board_read, authorize_board_write};
use super::auth::require_user;
use super::{AccessTokenQuery, ApiError, ApiResponse, AppState, BoardDetailDto, BoardDto};

#[derive(Deserialize)]
pub struct CreateBoardRequest {
    pub title: String,
    pub description: Option<String>,
    pub layout_config: Option<serde_json::Value>,
}

#[derive(Deserialize)]
pub struct UpdateBoardRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub layout_config: Option<serde_json::Value>,
}

/// GET /api/v1/boards
/// Regular users see their own boards; admins see everything.
pub async fn list_boards(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Vec<BoardDto>>>, ApiError> {
    let user = require_user(&state, &headers).await?;

    let boards = if user.is_admin {
        state.store.list_all_boards().await?
    } else {
        state.store.list_boards_for_owner(user.id).await?
    };

    Ok(Json(ApiResponse::success(
        boards.into_iter().map(BoardDto::from).collect(),
    )))
}

/// POST /api/v1/boards
pub async fn create_board(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateBoardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&state, &headers).await?;

    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::validation("Board title is required"));
    }

    let board = state
        .store
        .create_board(user.id, title, payload.description, payload.layout_config)
        .await?;

    tracing::info!(board_id = board.id, owner_id = user.id, title = %board.title, "Board created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(BoardDto::from(board))),
    ))
}

/// GET /api/v1/boards/{id}
/// The one dual-auth endpoint: a board-scoped access token grants
/// anonymous read, otherwise the session/ownership rules apply.
pub async fn get_board(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<i32>,
    Query(query): Query<AccessTokenQuery>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<BoardDetailDto>>, ApiError> {
    let detail =
        authorize_board_read(&state, board_id, query.access_token.as_deref(), &headers).await?;

    Ok(Json(ApiResponse::success(BoardDetailDto::from(detail))))
}

/// PUT /api/v1/boards/{id}
pub async fn update_board(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<i32>,
    headers: HeaderMap,
    Json(payload): Json<UpdateBoardRequest>,
) -> Result<Json<ApiResponse<BoardDto>>, ApiError> {
    authorize_board_write(&state, board_id, &headers).await?;

    if let Some(title) = &payload.title
        && title.trim().is_empty()
    {
        return Err(ApiError::validation("Board title cannot be empty"));
    }

    let board = state
        .store
        .update_board(
            board_id,
            payload.title,
            payload.description,
            payload.layout_config,
        )
        .await?
        .ok_or_else(|| ApiError::board_not_found(board_id))?;

    tracing::info!(board_id, "Board updated");

    Ok(Json(ApiResponse::success(BoardDto::from(board))))
}

/// DELETE /api/v1/boards/{id}
/// Cascades to widgets, settings and access tokens.
pub async fn delete_board(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<i32>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    authorize_board_write(&state, board_id, &headers).await?;

    if !state.store.delete_board(board_id).await? {
        return Err(ApiError::board_not_found(board_id));
    }

    tracing::info!(board_id, "Board deleted");

    Ok(StatusCode::NO_CONTENT)
}
