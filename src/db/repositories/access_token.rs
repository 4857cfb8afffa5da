use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::board_access_tokens;
use crate::security;

/// Patch for a token update; every field independently optional. The
/// expiry uses a nested Option so a caller can distinguish "leave as is"
/// from "clear to never-expires".
#[derive(Debug, Default, Clone)]
pub struct TokenPatch {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

/// Board access token registry. Only SHA-256 digests are persisted; the
/// plaintext secret leaves `issue` exactly once and is gone after that.
pub struct AccessTokenRepository {
    conn: DatabaseConnection,
}

impl AccessTokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Issue a token for a board. Returns the stored row and the plaintext
    /// secret; the secret cannot be recovered by any later operation.
    pub async fn issue(
        &self,
        board_id: i32,
        name: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(board_access_tokens::Model, String)> {
        let secret = security::generate_secret();

        let token = board_access_tokens::ActiveModel {
            id: NotSet,
            board_id: Set(board_id),
            token_hash: Set(security::hash_token(&secret)),
            name: Set(name),
            created_at: Set(Utc::now()),
            expires_at: Set(expires_at),
            last_used_at: Set(None),
            is_active: Set(true),
        };

        let model = token
            .insert(&self.conn)
            .await
            .context("Failed to insert access token")?;

        Ok((model, secret))
    }

    /// Resolve a plaintext candidate to its token row: exact digest lookup,
    /// then the usability check (active, not expired). On success the row's
    /// `last_used_at` is advanced as a side effect. Two concurrent uses of
    /// the same token may race on that write; the later value wins and no
    /// ordering is guaranteed.
    pub async fn resolve(&self, candidate: &str) -> Result<Option<board_access_tokens::Model>> {
        let token_hash = security::hash_token(candidate);

        let token = board_access_tokens::Entity::find()
            .filter(board_access_tokens::Column::TokenHash.eq(&token_hash))
            .one(&self.conn)
            .await
            .context("Failed to query access token by hash")?;

        let Some(token) = token else {
            return Ok(None);
        };

        if !token.is_usable(Utc::now()) {
            return Ok(None);
        }

        let mut active: board_access_tokens::ActiveModel = token.into();
        active.last_used_at = Set(Some(Utc::now()));
        let touched = active
            .update(&self.conn)
            .await
            .context("Failed to record access token use")?;

        Ok(Some(touched))
    }

    /// Tokens for a board, newest first. Digests only, no secrets.
    pub async fn list_for_board(
        &self,
        board_id: i32,
    ) -> Result<Vec<board_access_tokens::Model>> {
        board_access_tokens::Entity::find()
            .filter(board_access_tokens::Column::BoardId.eq(board_id))
            .order_by_desc(board_access_tokens::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list access tokens")
    }

    /// Fetch a token scoped to its board.
    pub async fn get_for_board(
        &self,
        board_id: i32,
        token_id: i32,
    ) -> Result<Option<board_access_tokens::Model>> {
        board_access_tokens::Entity::find_by_id(token_id)
            .filter(board_access_tokens::Column::BoardId.eq(board_id))
            .one(&self.conn)
            .await
            .context("Failed to query access token")
    }

    pub async fn update(
        &self,
        token: board_access_tokens::Model,
        patch: TokenPatch,
    ) -> Result<board_access_tokens::Model> {
        let mut active: board_access_tokens::ActiveModel = token.into();
        if let Some(name) = patch.name {
            active.name = Set(Some(name));
        }
        if let Some(is_active) = patch.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(expires_at) = patch.expires_at {
            active.expires_at = Set(expires_at);
        }

        active
            .update(&self.conn)
            .await
            .context("Failed to update access token")
    }

    /// Hard delete, distinct from flipping `is_active` off.
    pub async fn delete(&self, board_id: i32, token_id: i32) -> Result<bool> {
        let result = board_access_tokens::Entity::delete_many()
            .filter(board_access_tokens::Column::Id.eq(token_id))
            .filter(board_access_tokens::Column::BoardId.eq(board_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete access token")?;
        Ok(result.rows_affected > 0)
    }
}
