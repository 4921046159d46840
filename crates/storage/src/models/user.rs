use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use sqlx::FromRow;

/// Capability required to edit identity fields and availability of other users.
pub const MANAGE_USER: &str = "manage_user";

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub nickname: String,
    pub email: String,
    pub password: String,
    pub information: String,
    pub sex: i32,
    pub level: i32,
    pub rating: i32,
    pub ac_num: i32,
    pub is_admin: bool,
    pub is_available: bool,
    pub is_show: bool,
    pub public_email: bool,
    pub prefer_formatted_code: bool,
    pub download_data: bool,
    pub register_time: NaiveDateTime,
    /// Loaded from `user_privilege`, not a column of `users`.
    #[sqlx(skip)]
    pub privileges: BTreeSet<String>,
}

impl User {
    /// Administrators implicitly hold every capability.
    pub fn has_privilege(&self, privilege: &str) -> bool {
        self.is_admin || self.privileges.contains(privilege)
    }

    /// Whether `actor` may open and submit the edit page of this user.
    pub fn is_allowed_edit_by(&self, actor: Option<&User>) -> bool {
        match actor {
            None => false,
            Some(actor) => actor.has_privilege(MANAGE_USER) || actor.id == self.id,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_user(id: i32, username: &str) -> User {
    User {
        id,
        username: username.to_string(),
        nickname: username.to_string(),
        email: format!("{username}@example.com"),
        password: "secret".to_string(),
        information: String::new(),
        sex: 0,
        level: 0,
        rating: 1500,
        ac_num: 0,
        is_admin: false,
        is_available: true,
        is_show: true,
        public_email: false,
        prefer_formatted_code: true,
        download_data: false,
        register_time: NaiveDateTime::default(),
        privileges: BTreeSet::new(),
    }
}
