use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::access::authorize_board_write;
use super::{ApiError, ApiResponse, AppState, WidgetDto};

/// Closed list of widget types the frontend knows how to render.
pub const VALID_WIDGET_TYPES: &[&str] = &[
    "clock",
    "weather",
    "news",
    "calendar",
    "note",
    "google_calendar",
    "microsoft_calendar",
    "stock",
    "tradingview",
    "crypto",
    "graph",
    "metric",
    "email",
    "slack",
    "discord",
    "teams",
    "todo",
    "photo",
    "fitbit",
    "smart_home",
    "home_assistant",
    "qr_code",
    "bookmark",
];

#[derive(Deserialize)]
pub struct CreateWidgetRequest {
    #[serde(rename = "type")]
    pub widget_type: String,
    pub config: Option<serde_json::Value>,
    pub position: Option<serde_json::Value>,
}

#[derive(Deserialize)]
pub struct UpdateWidgetRequest {
    #[serde(rename = "type")]
    pub widget_type: Option<String>,
    pub config: Option<serde_json::Value>,
    pub position: Option<serde_json::Value>,
}

fn validate_widget_type(widget_type: &str) -> Result<(), ApiError> {
    if VALID_WIDGET_TYPES.contains(&widget_type) {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "Invalid widget type. Must be one of: {}",
            VALID_WIDGET_TYPES.join(", ")
        )))
    }
}

/// POST /api/v1/boards/{id}/widgets
pub async fn create_widget(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<i32>,
    headers: HeaderMap,
    Json(payload): Json<CreateWidgetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_board_write(&state, board_id, &headers).await?;

    validate_widget_type(&payload.widget_type)?;

    let widget = state
        .store
        .create_widget(
            board_id,
            &payload.widget_type,
            payload.config,
            payload.position,
        )
        .await?;

    tracing::info!(board_id, widget_id = widget.id, widget_type = %widget.widget_type, "Widget created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(WidgetDto::from(widget))),
    ))
}

/// PUT /api/v1/boards/{id}/widgets/{widget_id}
pub async fn update_widget(
    State(state): State<Arc<AppState>>,
    Path((board_id, widget_id)): Path<(i32, i32)>,
    headers: HeaderMap,
    Json(payload): Json<UpdateWidgetRequest>,
) -> Result<Json<ApiResponse<WidgetDto>>, ApiError> {
    authorize_board_write(&state, board_id, &headers).await?;

    if let Some(widget_type) = &payload.widget_type {
        validate_widget_type(widget_type)?;
    }

    let widget = state
        .store
        .find_widget(board_id, widget_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Widget", widget_id))?;

    let widget = state
        .store
        .update_widget(widget, payload.widget_type, payload.config, payload.position)
        .await?;

    tracing::info!(board_id, widget_id, "Widget updated");

    Ok(Json(ApiResponse::success(WidgetDto::from(widget))))
}

/// DELETE /api/v1/boards/{id}/widgets/{widget_id}
pub async fn delete_widget(
    State(state): State<Arc<AppState>>,
    Path((board_id, widget_id)): Path<(i32, i32)>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    authorize_board_write(&state, board_id, &headers).await?;

    if !state.store.delete_widget(board_id, widget_id).await? {
        return Err(ApiError::not_found("Widget", widget_id));
    }

    tracing::info!(board_id, widget_id, "Widget deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types_pass() {
        assert!(validate_widget_type("clock").is_ok());
        assert!(validate_widget_type("home_assistant").is_ok());
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(validate_widget_type("kitchen_sink").is_err());
        assert!(validate_widget_type("").is_err());
        // Case matters for a closed enumeration.
        assert!(validate_widget_type("Clock").is_err());
    }
}
