use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::entities::{board_settings, boards, widgets};

/// A board together with its widgets and (optional) settings row, the shape
/// the read path hands back to callers.
#[derive(Debug, Clone)]
pub struct BoardDetail {
    pub board: boards::Model,
    pub widgets: Vec<widgets::Model>,
    pub settings: Option<board_settings::Model>,
}

/// Raised by writes that would violate the per-owner title uniqueness.
/// Kept as a distinct type so the API layer can map it to a 409 without
/// string-matching driver errors.
#[derive(Debug, thiserror::Error)]
#[error("a board titled '{0}' already exists for this user")]
pub struct DuplicateTitle(pub String);

pub struct BoardRepository {
    conn: DatabaseConnection,
}

impl BoardRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<boards::Model>> {
        boards::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query board by id")
    }

    /// Board plus widgets and settings, eagerly loaded.
    pub async fn get_detail(&self, id: i32) -> Result<Option<BoardDetail>> {
        let Some(board) = self.get(id).await? else {
            return Ok(None);
        };

        let widgets = widgets::Entity::find()
            .filter(widgets::Column::BoardId.eq(id))
            .order_by_asc(widgets::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query widgets for board")?;

        let settings = board_settings::Entity::find()
            .filter(board_settings::Column::BoardId.eq(id))
            .one(&self.conn)
            .await
            .context("Failed to query settings for board")?;

        Ok(Some(BoardDetail {
            board,
            widgets,
            settings,
        }))
    }

    /// Boards owned by a user, newest first.
    pub async fn list_for_owner(&self, owner_id: i32) -> Result<Vec<boards::Model>> {
        boards::Entity::find()
            .filter(boards::Column::OwnerId.eq(owner_id))
            .order_by_desc(boards::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list boards for owner")
    }

    /// All boards, newest first. Admin-only listing.
    pub async fn list_all(&self) -> Result<Vec<boards::Model>> {
        boards::Entity::find()
            .order_by_desc(boards::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list boards")
    }

    /// Create a board. The duplicate check and insert run in one
    /// transaction so a conflicting concurrent insert cannot produce a
    /// half-applied state; the unique index is the backstop.
    pub async fn create(
        &self,
        owner_id: i32,
        title: &str,
        description: Option<String>,
        layout_config: Option<serde_json::Value>,
    ) -> Result<boards::Model> {
        let txn = self.conn.begin().await.context("Failed to open transaction")?;

        let duplicate = boards::Entity::find()
            .filter(boards::Column::OwnerId.eq(owner_id))
            .filter(boards::Column::Title.eq(title))
            .one(&txn)
            .await
            .context("Failed to check for duplicate title")?;

        if duplicate.is_some() {
            txn.rollback().await.ok();
            return Err(DuplicateTitle(title.to_string()).into());
        }

        let now = Utc::now();
        let board = boards::ActiveModel {
            id: NotSet,
            owner_id: Set(owner_id),
            title: Set(title.to_string()),
            description: Set(description),
            layout_config: Set(layout_config),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let board = board
            .insert(&txn)
            .await
            .map_err(|err| map_unique_violation(err, title))?;

        txn.commit().await.context("Failed to commit board insert")?;
        Ok(board)
    }

    /// Partial update inside a single transaction; rolls back entirely on a
    /// title conflict so no field change is observably persisted.
    pub async fn update(
        &self,
        id: i32,
        title: Option<String>,
        description: Option<String>,
        layout_config: Option<serde_json::Value>,
    ) -> Result<Option<boards::Model>> {
        let txn = self.conn.begin().await.context("Failed to open transaction")?;

        let Some(board) = boards::Entity::find_by_id(id)
            .one(&txn)
            .await
            .context("Failed to query board for update")?
        else {
            txn.rollback().await.ok();
            return Ok(None);
        };

        if let Some(new_title) = &title
            && *new_title != board.title
        {
            let duplicate = boards::Entity::find()
                .filter(boards::Column::OwnerId.eq(board.owner_id))
                .filter(boards::Column::Title.eq(new_title.as_str()))
                .filter(boards::Column::Id.ne(id))
                .one(&txn)
                .await
                .context("Failed to check for duplicate title")?;

            if duplicate.is_some() {
                txn.rollback().await.ok();
                return Err(DuplicateTitle(new_title.clone()).into());
            }
        }

        let conflict_title = title.clone().unwrap_or_else(|| board.title.clone());

        let mut active: boards::ActiveModel = board.into();
        if let Some(title) = title {
            active.title = Set(title);
        }
        if let Some(description) = description {
            active.description = Set(Some(description));
        }
        if let Some(layout_config) = layout_config {
            active.layout_config = Set(Some(layout_config));
        }
        active.updated_at = Set(Utc::now());

        let board = active
            .update(&txn)
            .await
            .map_err(|err| map_unique_violation(err, &conflict_title))?;

        txn.commit().await.context("Failed to commit board update")?;
        Ok(Some(board))
    }

    /// Delete a board. Widgets, settings and access tokens go with it via
    /// FK cascade. Returns false when the board did not exist.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = boards::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete board")?;
        Ok(result.rows_affected > 0)
    }
}

/// SQLite reports constraint breaches as a generic query error; translate
/// the unique-index case into the typed conflict.
fn map_unique_violation(err: sea_orm::DbErr, title: &str) -> anyhow::Error {
    if err.to_string().contains("UNIQUE constraint") {
        DuplicateTitle(title.to_string()).into()
    } else {
        anyhow::Error::new(err).context("Failed to write board")
    }
}
