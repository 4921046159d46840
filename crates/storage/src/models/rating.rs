use sqlx::FromRow;

/// One run of the external rating computation over a contest.
///
/// Ids are handed out in computation order, so they order history rows even
/// when a contest is recalculated long after it took place.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RatingCalculation {
    pub id: i32,
    pub contest_id: i32,
}

/// Rating outcome of one user in one calculation. Unique per (user, calculation).
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RatingHistory {
    pub rating_calculation_id: i32,
    pub user_id: i32,
    pub rating_after: i32,
    pub rank: i32,
}
