pub mod prelude;

pub mod board_access_tokens;
pub mod board_settings;
pub mod boards;
pub mod sessions;
pub mod users;
pub mod widgets;
