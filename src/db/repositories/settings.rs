use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter, Set,
};

use crate::entities::board_settings;

/// Patch for a settings update; every field independently optional.
#[derive(Debug, Default, Clone)]
pub struct SettingsPatch {
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

pub struct SettingsRepository {
    conn: DatabaseConnection,
}

impl SettingsRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Fetch a board's settings row, creating the default singleton on
    /// first access.
    pub async fn get_or_create(&self, board_id: i32) -> Result<board_settings::Model> {
        let existing = board_settings::Entity::find()
            .filter(board_settings::Column::BoardId.eq(board_id))
            .one(&self.conn)
            .await
            .context("Failed to query board settings")?;

        if let Some(settings) = existing {
            return Ok(settings);
        }

        let now = Utc::now();
        let settings = board_settings::ActiveModel {
            id: NotSet,
            board_id: Set(board_id),
            background_type: Set(None),
            background_source: Set(None),
            background_config: Set(None),
            background_preset: Set(None),
            resolution_width: Set(None),
            resolution_height: Set(None),
            aspect_ratio: Set(None),
            orientation: Set(None),
            auto_rotate_pages: Set(false),
            lockout_mode: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };

        settings
            .insert(&self.conn)
            .await
            .context("Failed to insert default board settings")
    }

    pub async fn update(
        &self,
        board_id: i32,
        patch: SettingsPatch,
    ) -> Result<board_settings::Model> {
        let settings = self.get_or_create(board_id).await?;

        let mut active: board_settings::ActiveModel = settings.into();
        if let Some(value) = patch.background_type {
            active.background_type = Set(Some(value));
        }
        if let Some(value) = patch.background_source {
            active.background_source = Set(Some(value));
        }
        if let Some(value) = patch.background_config {
            active.background_config = Set(Some(value));
        }
        if let Some(value) = patch.background_preset {
            active.background_preset = Set(Some(value));
        }
        if let Some(value) = patch.resolution_width {
            active.resolution_width = Set(Some(value));
        }
        if let Some(value) = patch.resolution_height {
            active.resolution_height = Set(Some(value));
        }
        if let Some(value) = patch.aspect_ratio {
            active.aspect_ratio = Set(Some(value));
        }
        if let Some(value) = patch.orientation {
            active.orientation = Set(Some(value));
        }
        if let Some(value) = patch.auto_rotate_pages {
            active.auto_rotate_pages = Set(value);
        }
        if let Some(value) = patch.lockout_mode {
            active.lockout_mode = Set(value);
        }
        active.updated_at = Set(Utc::now());

        active
            .update(&self.conn)
            .await
            .context("Failed to update board settings")
    }
}
