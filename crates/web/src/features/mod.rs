pub mod auth;
pub mod ranking;
pub mod users;
