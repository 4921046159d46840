use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Contest {
    pub id: i32,
    pub title: String,
}
