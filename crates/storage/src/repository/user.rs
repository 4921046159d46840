use std::collections::BTreeSet;

use sqlx::{PgPool, QueryBuilder};

use crate::dto::common::PaginationParams;
use crate::dto::user::UserOrdering;
use crate::error::{Result, StorageError};
use crate::models::User;

const USER_COLUMNS: &str = r#"
    id, username, nickname, email, password, information, sex, level, rating,
    ac_num, is_admin, is_available, is_show, public_email, prefer_formatted_code,
    download_data, register_time
"#;

pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by ID, privileges included
    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        self.with_privileges(user).await
    }

    /// Find a user by exact username, privileges included
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        self.with_privileges(user).await
    }

    async fn with_privileges(&self, user: Option<User>) -> Result<Option<User>> {
        match user {
            Some(mut user) => {
                user.privileges = self.privileges(user.id).await?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    pub async fn privileges(&self, user_id: i32) -> Result<BTreeSet<String>> {
        let privileges: Vec<String> =
            sqlx::query_scalar("SELECT privilege FROM user_privilege WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(self.pool)
                .await?;

        Ok(privileges.into_iter().collect())
    }

    /// Number of users visible in public listings
    pub async fn count_shown(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_show = TRUE")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// One page of visible users. Rows come back without privileges.
    pub async fn list_shown(
        &self,
        ordering: UserOrdering,
        pagination: &PaginationParams,
    ) -> Result<Vec<User>> {
        let mut query = QueryBuilder::new(format!(
            "SELECT {USER_COLUMNS} FROM users WHERE is_show = TRUE ORDER BY "
        ));
        query.push(ordering.field.as_column());
        query.push(" ");
        query.push(ordering.order.as_sql());
        query.push(", id ASC LIMIT ");
        query.push_bind(pagination.limit() as i64);
        query.push(" OFFSET ");
        query.push_bind(pagination.offset());

        let users = query.build_query_as::<User>().fetch_all(self.pool).await?;

        Ok(users)
    }

    /// Persist the user row and replace its privilege set in one transaction
    pub async fn save(&self, user: &User) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2,
                nickname = $3,
                email = $4,
                password = $5,
                information = $6,
                sex = $7,
                level = $8,
                is_available = $9,
                is_show = $10,
                public_email = $11,
                prefer_formatted_code = $12,
                download_data = $13
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.nickname)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.information)
        .bind(user.sex)
        .bind(user.level)
        .bind(user.is_available)
        .bind(user.is_show)
        .bind(user.public_email)
        .bind(user.prefer_formatted_code)
        .bind(user.download_data)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            let error = StorageError::from(e);
            if error.is_unique_violation() {
                return StorageError::ConstraintViolation("Username already exists".to_string());
            }
            error
        })?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        sqlx::query("DELETE FROM user_privilege WHERE user_id = $1")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        for privilege in &user.privileges {
            sqlx::query("INSERT INTO user_privilege (user_id, privilege) VALUES ($1, $2)")
                .bind(user.id)
                .bind(privilege)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(())
    }
}
