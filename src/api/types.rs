use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::BoardDetail;
use crate::entities::{board_access_tokens, board_settings, boards, users, widgets};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageDto {
    pub message: String,
}

impl MessageDto {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Public user shape; never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<users::Model> for UserDto {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            is_admin: model.is_admin,
            created_at: model.created_at,
            last_login_at: model.last_login_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BoardDto {
    pub id: i32,
    pub owner_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub layout_config: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<boards::Model> for BoardDto {
    fn from(model: boards::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            title: model.title,
            description: model.description,
            layout_config: model.layout_config,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WidgetDto {
    pub id: i32,
    pub board_id: i32,
    #[serde(rename = "type")]
    pub widget_type: String,
    pub config: Option<serde_json::Value>,
    pub position: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<widgets::Model> for WidgetDto {
    fn from(model: widgets::Model) -> Self {
        Self {
            id: model.id,
            board_id: model.board_id,
            widget_type: model.widget_type,
            config: model.config,
            position: model.position,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SettingsDto {
    pub id: i32,
    pub board_id: i32,
    pub background_type: Option<String>,
    pub background_source: Option<String>,
    pub background_config: Option<serde_json::Value>,
    pub background_preset: Option<String>,
    pub resolution_width: Option<i32>,
    pub resolution_height: Option<i32>,
    pub aspect_ratio: Option<String>,
    pub orientation: Option<String>,
    pub auto_rotate_pages: bool,
    pub lockout_mode: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<board_settings::Model> for SettingsDto {
    fn from(model: board_settings::Model) -> Self {
        Self {
            id: model.id,
            board_id: model.board_id,
            background_type: model.background_type,
            background_source: model.background_source,
            background_config: model.background_config,
            background_preset: model.background_preset,
            resolution_width: model.resolution_width,
            resolution_height: model.resolution_height,
            aspect_ratio: model.aspect_ratio,
            orientation: model.orientation,
            auto_rotate_pages: model.auto_rotate_pages,
            lockout_mode: model.lockout_mode,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Board plus its widgets and settings, the read-endpoint payload.
#[derive(Debug, Serialize)]
pub struct BoardDetailDto {
    #[serde(flatten)]
    pub board: BoardDto,
    pub widgets: Vec<WidgetDto>,
    pub settings: Option<SettingsDto>,
}

impl From<BoardDetail> for BoardDetailDto {
    fn from(detail: BoardDetail) -> Self {
        Self {
            board: detail.board.into(),
            widgets: detail.widgets.into_iter().map(WidgetDto::from).collect(),
            settings: detail.settings.map(SettingsDto::from),
        }
    }
}

/// Token metadata as listed back to the board owner. Carries the digest's
/// row, never the secret.
#[derive(Debug, Serialize)]
pub struct AccessTokenDto {
    pub id: i32,
    pub board_id: i32,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl From<board_access_tokens::Model> for AccessTokenDto {
    fn from(model: board_access_tokens::Model) -> Self {
        Self {
            id: model.id,
            board_id: model.board_id,
            name: model.name,
            created_at: model.created_at,
            expires_at: model.expires_at,
            last_used_at: model.last_used_at,
            is_active: model.is_active,
        }
    }
}

/// Creation response: the only place the plaintext secret ever appears.
#[derive(Debug, Serialize)]
pub struct AccessTokenCreatedDto {
    #[serde(flatten)]
    pub token: AccessTokenDto,
    /// Shown exactly once; not retrievable afterwards.
    pub secret: String,
}

#[derive(Debug, Deserialize)]
pub struct AccessTokenQuery {
    pub access_token: Option<String>,
}
