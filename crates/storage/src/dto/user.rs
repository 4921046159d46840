use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::common::PaginationParams;
use super::rating::RatingTrajectoryEntry;
use crate::models::User;

/// Column a user listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserSortField {
    AcNum,
    Rating,
    Id,
    Username,
    RegisterTime,
}

impl UserSortField {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ac_num" => Some(Self::AcNum),
            "rating" => Some(Self::Rating),
            "id" => Some(Self::Id),
            "username" => Some(Self::Username),
            "register_time" => Some(Self::RegisterTime),
            _ => None,
        }
    }

    pub fn as_column(&self) -> &'static str {
        match self {
            Self::AcNum => "ac_num",
            Self::Rating => "rating",
            Self::Id => "id",
            Self::Username => "username",
            Self::RegisterTime => "register_time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// The two public user listings and the sort keys each one accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserListKind {
    Ranklist,
    Userlist,
}

impl UserListKind {
    pub fn allows(&self, field: UserSortField) -> bool {
        use UserSortField::*;
        match self {
            Self::Ranklist => matches!(field, AcNum | Rating | Id | Username),
            Self::Userlist => matches!(field, RegisterTime | Id | Username),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserOrdering {
    pub field: UserSortField,
    pub order: SortOrder,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl UserListQuery {
    pub fn pagination(&self) -> PaginationParams {
        let defaults = PaginationParams::default();
        PaginationParams {
            page: self.page.unwrap_or(defaults.page),
            page_size: self.page_size.unwrap_or(defaults.page_size),
        }
    }

    /// Resolves the requested ordering, falling back to the configured defaults
    /// for whichever of `sort` and `order` is missing.
    pub fn ordering(
        &self,
        kind: UserListKind,
        default_sort: &str,
        default_order: &str,
    ) -> Result<UserOrdering, String> {
        let sort = self.sort.as_deref().unwrap_or(default_sort);
        let order = self.order.as_deref().unwrap_or(default_order);

        let field = UserSortField::parse(sort)
            .filter(|field| kind.allows(*field))
            .ok_or_else(|| "Invalid sort parameters".to_string())?;
        let order = SortOrder::parse(order).ok_or_else(|| "Invalid sort parameters".to_string())?;

        Ok(UserOrdering { field, order })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FindUserQuery {
    #[serde(alias = "nickname")]
    pub username: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FindUserResponse {
    pub user_id: i32,
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub nickname: String,
    /// Present only when the viewer is allowed to see it.
    pub email: Option<String>,
    pub information: String,
    pub sex: i32,
    pub level: i32,
    pub rating: i32,
    pub ac_num: i32,
    pub is_admin: bool,
    pub is_available: bool,
    pub public_email: bool,
    pub prefer_formatted_code: bool,
    pub download_data: bool,
    pub register_time: NaiveDateTime,
}

impl UserResponse {
    pub fn from_user(user: User, email_visible: bool) -> Self {
        Self {
            id: user.id,
            email: email_visible.then_some(user.email),
            username: user.username,
            nickname: user.nickname,
            information: user.information,
            sex: user.sex,
            level: user.level,
            rating: user.rating,
            ac_num: user.ac_num,
            is_admin: user.is_admin,
            is_available: user.is_available,
            public_email: user.public_email,
            prefer_formatted_code: user.prefer_formatted_code,
            download_data: user.download_data,
            register_time: user.register_time,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let email_visible = user.public_email;
        Self::from_user(user, email_visible)
    }
}

/// Profile page of a user.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfileResponse {
    pub user: UserResponse,
    pub allowed_edit: bool,
    pub email_visible: bool,
    /// Most recent contest first, the `initial` entry last.
    pub rating_history: Vec<RatingTrajectoryEntry>,
}

/// Edit page of a user.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserEditView {
    pub user: UserResponse,
    pub privileges: Vec<String>,
    /// Whether the viewing actor holds `manage_user`.
    pub allowed_manage: bool,
}

impl UserEditView {
    pub fn new(user: User, allowed_manage: bool) -> Self {
        let privileges = user.privileges.iter().cloned().collect();
        Self {
            user: UserResponse::from_user(user, true),
            privileges,
            allowed_manage,
        }
    }
}

/// Privileges as submitted by a form: either one value or several.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PrivilegeInput {
    One(String),
    Many(Vec<String>),
}

impl PrivilegeInput {
    /// A missing input is the empty set.
    pub fn normalize(input: Option<&PrivilegeInput>) -> BTreeSet<String> {
        match input {
            None => BTreeSet::new(),
            Some(Self::One(privilege)) => BTreeSet::from([privilege.clone()]),
            Some(Self::Many(privileges)) => privileges.iter().cloned().collect(),
        }
    }
}

/// Proposed changes to a user. Absent fields are left untouched, except
/// `privileges`: a request by an administrator always replaces the whole set.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct EditUserRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,

    pub username: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    #[validate(length(max = 120))]
    pub email: Option<String>,
    pub level: Option<i32>,

    pub privileges: Option<PrivilegeInput>,
    pub is_available: Option<bool>,
    pub download_data: Option<bool>,

    #[validate(length(max = 80, message = "Nickname must be at most 80 characters"))]
    pub nickname: Option<String>,
    pub information: Option<String>,
    pub sex: Option<i32>,
    pub public_email: Option<bool>,
    pub prefer_formatted_code: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 80, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserResponse,
}
