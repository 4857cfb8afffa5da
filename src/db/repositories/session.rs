use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, NotSet,
    QueryFilter, Set,
};

use crate::entities::sessions;
use crate::security;

/// Server-side session registry. Lifecycle per token:
/// absent -> active -> (expired | deleted). Expiry is fixed at creation;
/// it is not extended by later requests.
pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create a session for a user and return the plaintext token. The
    /// token is never re-derivable after this call.
    pub async fn create(&self, user_id: i32, ttl_minutes: i64) -> Result<String> {
        let token = security::generate_secret();
        let now = Utc::now();

        let session = sessions::ActiveModel {
            id: NotSet,
            token: Set(token.clone()),
            user_id: Set(user_id),
            created_at: Set(now),
            expires_at: Set(now + Duration::minutes(ttl_minutes)),
        };

        session
            .insert(&self.conn)
            .await
            .context("Failed to insert session")?;

        Ok(token)
    }

    /// Resolve a token to its user id. An expired row is deleted on first
    /// access (lazy expiry, no background sweeper) and resolves to None.
    pub async fn resolve(&self, token: &str) -> Result<Option<i32>> {
        let session = sessions::Entity::find()
            .filter(sessions::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query session by token")?;

        let Some(session) = session else {
            return Ok(None);
        };

        if Utc::now() > session.expires_at {
            session
                .delete(&self.conn)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        Ok(Some(session.user_id))
    }

    /// Idempotent delete; no-op when the token is unknown.
    pub async fn destroy(&self, token: &str) -> Result<()> {
        sessions::Entity::delete_many()
            .filter(sessions::Column::Token.eq(token))
            .exec(&self.conn)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }
}
