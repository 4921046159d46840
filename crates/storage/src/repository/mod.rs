pub mod contest;
pub mod rating;
pub mod session;
pub mod user;
