use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde::Deserialize;
use std::sync::Arc;

use super::access::authorize_board_write;
use super::{ApiError, ApiResponse, AppState, SettingsDto};
use crate::db::SettingsPatch;

#[derive(Deserialize)]
pub struct UpdateSettingsRequest {
    pub background_type: Option<String>,
    pub background_source: Option<String>,
    pub background_config: Option<serde_json::Value>,
    pub background_preset: Option<String>,
    pub resolution_width: Option<i32>,
    pub resolution_height: Option<i32>,
    pub aspect_ratio: Option<String>,
    pub orientation: Option<String>,
    pub auto_rotate_pages: Option<bool>,
    pub lockout_mode: Option<bool>,
}

impl From<UpdateSettingsRequest> for SettingsPatch {
    fn from(payload: UpdateSettingsRequest) -> Self {
        Self {
            background_type: payload.background_type,
            background_source: payload.background_source,
            background_config: payload.background_config,
            background_preset: payload.background_preset,
            resolution_width: payload.resolution_width,
            resolution_height: payload.resolution_height,
            aspect_ratio: payload.aspect_ratio,
            orientation: payload.orientation,
            auto_rotate_pages: payload.auto_rotate_pages,
            lockout_mode: payload.lockout_mode,
        }
    }
}

/// GET /api/v1/boards/{id}/settings
/// Creates the default settings row on first access.
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<i32>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<SettingsDto>>, ApiError> {
    authorize_board_write(&state, board_id, &headers).await?;

    let settings = state.store.board_settings(board_id).await?;

    Ok(Json(ApiResponse::success(SettingsDto::from(settings))))
}

/// PUT /api/v1/boards/{id}/settings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<i32>,
    headers: HeaderMap,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<Json<ApiResponse<SettingsDto>>, ApiError> {
    authorize_board_write(&state, board_id, &headers).await?;

    let settings = state
        .store
        .update_board_settings(board_id, payload.into())
        .await?;

    tracing::info!(board_id, "Board settings updated");

    Ok(Json(ApiResponse::success(SettingsDto::from(settings))))
}
