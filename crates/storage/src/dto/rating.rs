use serde::Serialize;
use utoipa::ToSchema;

/// Label of the synthetic entry standing for the rating every user starts with.
pub const INITIAL_LABEL: &str = "initial";

/// One point of a user's rating trajectory as shown on the profile page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RatingTrajectoryEntry {
    /// Contest title, or `initial` for the seed entry.
    pub label: String,
    pub value: i32,
    /// Change against the chronologically preceding entry; absent on the seed.
    pub delta: Option<i32>,
    pub rank: Option<i32>,
    pub participants: Option<i64>,
}

impl RatingTrajectoryEntry {
    pub fn initial(default_rating: i32) -> Self {
        Self {
            label: INITIAL_LABEL.to_string(),
            value: default_rating,
            delta: None,
            rank: None,
            participants: None,
        }
    }
}
