use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter, Set,
};

use crate::entities::widgets;

pub struct WidgetRepository {
    conn: DatabaseConnection,
}

impl WidgetRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Fetch a widget scoped to its board; a widget id from another board
    /// resolves to None.
    pub async fn get_for_board(
        &self,
        board_id: i32,
        widget_id: i32,
    ) -> Result<Option<widgets::Model>> {
        widgets::Entity::find_by_id(widget_id)
            .filter(widgets::Column::BoardId.eq(board_id))
            .one(&self.conn)
            .await
            .context("Failed to query widget")
    }

    pub async fn create(
        &self,
        board_id: i32,
        widget_type: &str,
        config: Option<serde_json::Value>,
        position: Option<serde_json::Value>,
    ) -> Result<widgets::Model> {
        let now = Utc::now();
        let widget = widgets::ActiveModel {
            id: NotSet,
            board_id: Set(board_id),
            widget_type: Set(widget_type.to_string()),
            config: Set(config),
            position: Set(position),
            created_at: Set(now),
            updated_at: Set(now),
        };

        widget
            .insert(&self.conn)
            .await
            .context("Failed to insert widget")
    }

    pub async fn update(
        &self,
        widget: widgets::Model,
        widget_type: Option<String>,
        config: Option<serde_json::Value>,
        position: Option<serde_json::Value>,
    ) -> Result<widgets::Model> {
        let mut active: widgets::ActiveModel = widget.into();
        if let Some(widget_type) = widget_type {
            active.widget_type = Set(widget_type);
        }
        if let Some(config) = config {
            active.config = Set(Some(config));
        }
        if let Some(position) = position {
            active.position = Set(Some(position));
        }
        active.updated_at = Set(Utc::now());

        active
            .update(&self.conn)
            .await
            .context("Failed to update widget")
    }

    pub async fn delete(&self, board_id: i32, widget_id: i32) -> Result<bool> {
        let result = widgets::Entity::delete_many()
            .filter(widgets::Column::Id.eq(widget_id))
            .filter(widgets::Column::BoardId.eq(board_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete widget")?;
        Ok(result.rows_affected > 0)
    }
}
