use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{board_access_tokens, board_settings, boards, users, widgets};

pub mod migrator;
pub mod repositories;

pub use repositories::access_token::TokenPatch;
pub use repositories::board::{BoardDetail, DuplicateTitle};
pub use repositories::settings::SettingsPatch;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    fn board_repo(&self) -> repositories::board::BoardRepository {
        repositories::board::BoardRepository::new(self.conn.clone())
    }

    fn widget_repo(&self) -> repositories::widget::WidgetRepository {
        repositories::widget::WidgetRepository::new(self.conn.clone())
    }

    fn settings_repo(&self) -> repositories::settings::SettingsRepository {
        repositories::settings::SettingsRepository::new(self.conn.clone())
    }

    fn access_token_repo(&self) -> repositories::access_token::AccessTokenRepository {
        repositories::access_token::AccessTokenRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn find_user_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<users::Model> {
        self.user_repo().create(username, password, is_admin).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn update_user_password(&self, user_id: i32, new_password: &str) -> Result<()> {
        self.user_repo().update_password(user_id, new_password).await
    }

    pub async fn touch_last_login(&self, user_id: i32) -> Result<()> {
        self.user_repo().touch_last_login(user_id).await
    }

    // ========== Sessions ==========

    pub async fn create_session(&self, user_id: i32, ttl_minutes: i64) -> Result<String> {
        self.session_repo().create(user_id, ttl_minutes).await
    }

    pub async fn resolve_session(&self, token: &str) -> Result<Option<i32>> {
        self.session_repo().resolve(token).await
    }

    pub async fn destroy_session(&self, token: &str) -> Result<()> {
        self.session_repo().destroy(token).await
    }

    // ========== Boards ==========

    pub async fn find_board_by_id(&self, id: i32) -> Result<Option<boards::Model>> {
        self.board_repo().get(id).await
    }

    pub async fn find_board_detail(&self, id: i32) -> Result<Option<BoardDetail>> {
        self.board_repo().get_detail(id).await
    }

    pub async fn list_boards_for_owner(&self, owner_id: i32) -> Result<Vec<boards::Model>> {
        self.board_repo().list_for_owner(owner_id).await
    }

    pub async fn list_all_boards(&self) -> Result<Vec<boards::Model>> {
        self.board_repo().list_all().await
    }

    pub async fn create_board(
        &self,
        owner_id: i32,
        title: &str,
        description: Option<String>,
        layout_config: Option<serde_json::Value>,
    ) -> Result<boards::Model> {
        self.board_repo()
            .create(owner_id, title, description, layout_config)
            .await
    }

    pub async fn update_board(
        &self,
        id: i32,
        title: Option<String>,
        description: Option<String>,
        layout_config: Option<serde_json::Value>,
    ) -> Result<Option<boards::Model>> {
        self.board_repo()
            .update(id, title, description, layout_config)
            .await
    }

    pub async fn delete_board(&self, id: i32) -> Result<bool> {
        self.board_repo().delete(id).await
    }

    // ========== Widgets ==========

    pub async fn find_widget(
        &self,
        board_id: i32,
        widget_id: i32,
    ) -> Result<Option<widgets::Model>> {
        self.widget_repo().get_for_board(board_id, widget_id).await
    }

    pub async fn create_widget(
        &self,
        board_id: i32,
        widget_type: &str,
        config: Option<serde_json::Value>,
        position: Option<serde_json::Value>,
    ) -> Result<widgets::Model> {
        self.widget_repo()
            .create(board_id, widget_type, config, position)
            .await
    }

    pub async fn update_widget(
        &self,
        widget: widgets::Model,
        widget_type: Option<String>,
        config: Option<serde_json::Value>,
        position: Option<serde_json::Value>,
    ) -> Result<widgets::Model> {
        self.widget_repo()
            .update(widget, widget_type, config, position)
            .await
    }

    pub async fn delete_widget(&self, board_id: i32, widget_id: i32) -> Result<bool> {
        self.widget_repo().delete(board_id, widget_id).await
    }

    // ========== Board settings ==========

    pub async fn board_settings(&self, board_id: i32) -> Result<board_settings::Model> {
        self.settings_repo().get_or_create(board_id).await
    }

    pub async fn update_board_settings(
        &self,
        board_id: i32,
        patch: SettingsPatch,
    ) -> Result<board_settings::Model> {
        self.settings_repo().update(board_id, patch).await
    }

    // ========== Board access tokens ==========

    pub async fn issue_access_token(
        &self,
        board_id: i32,
        name: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(board_access_tokens::Model, String)> {
        self.access_token_repo()
            .issue(board_id, name, expires_at)
            .await
    }

    pub async fn resolve_access_token(
        &self,
        candidate: &str,
    ) -> Result<Option<board_access_tokens::Model>> {
        self.access_token_repo().resolve(candidate).await
    }

    pub async fn list_access_tokens(
        &self,
        board_id: i32,
    ) -> Result<Vec<board_access_tokens::Model>> {
        self.access_token_repo().list_for_board(board_id).await
    }

    pub async fn find_access_token(
        &self,
        board_id: i32,
        token_id: i32,
    ) -> Result<Option<board_access_tokens::Model>> {
        self.access_token_repo()
            .get_for_board(board_id, token_id)
            .await
    }

    pub async fn update_access_token(
        &self,
        token: board_access_tokens::Model,
        patch: TokenPatch,
    ) -> Result<board_access_tokens::Model> {
        self.access_token_repo().update(token, patch).await
    }

    pub async fn delete_access_token(&self, board_id: i32, token_id: i32) -> Result<bool> {
        self.access_token_repo().delete(board_id, token_id).await
    }
}
