mod contest;
mod rating;
mod session;
mod user;

pub use contest::Contest;
pub use rating::{RatingCalculation, RatingHistory};
pub use session::Session;
pub use user::{MANAGE_USER, User};

#[cfg(test)]
pub(crate) use user::test_user;
