pub use super::board_access_tokens::Entity as BoardAccessTokens;
pub use super::board_settings::Entity as BoardSettings;
pub use super::boards::Entity as Boards;
pub use super::sessions::Entity as Sessions;
pub use super::users::Entity as Users;
pub use super::widgets::Entity as Widgets;
