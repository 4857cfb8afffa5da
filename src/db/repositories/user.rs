use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter, Set,
};
use tokio::task;

use crate::entities::users;
use crate::security;

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by id")
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")
    }

    /// Create a user with a freshly hashed password.
    /// bcrypt is CPU-intensive, so hashing runs on a blocking task.
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<users::Model> {
        let password = password.to_string();
        let password_hash = task::spawn_blocking(move || security::hash_password(&password))
            .await
            .context("Password hashing task panicked")??;

        let user = users::ActiveModel {
            id: NotSet,
            username: Set(username.to_string()),
            email: Set(None),
            password_hash: Set(password_hash),
            is_admin: Set(is_admin),
            created_at: Set(Utc::now()),
            last_login_at: Set(None),
        };

        user.insert(&self.conn)
            .await
            .context("Failed to insert user")
    }

    /// Verify a password for a username. Returns false for both unknown
    /// users and wrong passwords so callers cannot distinguish the two.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        let Some(user) = self.get_by_username(username).await? else {
            return Ok(false);
        };

        let password = password.to_string();
        let password_hash = user.password_hash;

        let is_valid =
            task::spawn_blocking(move || security::verify_password(&password, &password_hash))
                .await
                .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    pub async fn update_password(&self, user_id: i32, new_password: &str) -> Result<()> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User {user_id} not found"))?;

        let password = new_password.to_string();
        let new_hash = task::spawn_blocking(move || security::hash_password(&password))
            .await
            .context("Password hashing task panicked")??;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn touch_last_login(&self, user_id: i32) -> Result<()> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for login timestamp")?
            .ok_or_else(|| anyhow::anyhow!("User {user_id} not found"))?;

        let mut active: users::ActiveModel = user.into();
        active.last_login_at = Set(Some(Utc::now()));
        active.update(&self.conn).await?;

        Ok(())
    }
}
