pub mod access_token;
pub mod board;
pub mod session;
pub mod settings;
pub mod user;
pub mod widget;
