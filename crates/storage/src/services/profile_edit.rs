use std::collections::BTreeSet;

use crate::dto::user::{EditUserRequest, PrivilegeInput};
use crate::error::{DomainError, DomainResult};
use crate::models::{MANAGE_USER, User};
use crate::store::IdentityStore;

const USERNAME_MIN_LEN: usize = 3;
const USERNAME_MAX_LEN: usize = 16;

/// Usernames are 3 to 16 characters of ASCII letters, digits, `-` and `_`.
pub fn is_valid_username(username: &str) -> bool {
    (USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Field changes that passed every layer of a request.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AcceptedChanges {
    pub password: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub level: Option<i32>,
    pub privileges: Option<BTreeSet<String>>,
    pub is_available: Option<bool>,
    pub download_data: Option<bool>,
    pub nickname: Option<String>,
    pub information: Option<String>,
    pub sex: Option<i32>,
    pub public_email: Option<bool>,
    pub prefer_formatted_code: Option<bool>,
}

impl AcceptedChanges {
    /// Returns `target` with the accepted changes applied on top.
    pub fn merge_into(self, target: &User) -> User {
        let mut user = target.clone();
        if let Some(password) = self.password {
            user.password = password;
        }
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(level) = self.level {
            user.level = level;
        }
        if let Some(privileges) = self.privileges {
            user.privileges = privileges;
        }
        if let Some(is_available) = self.is_available {
            user.is_available = is_available;
        }
        if let Some(download_data) = self.download_data {
            user.download_data = download_data;
        }
        if let Some(nickname) = self.nickname {
            user.nickname = nickname;
        }
        if let Some(information) = self.information {
            user.information = information;
        }
        if let Some(sex) = self.sex {
            user.sex = sex;
        }
        if let Some(public_email) = self.public_email {
            user.public_email = public_email;
        }
        if let Some(prefer_formatted_code) = self.prefer_formatted_code {
            user.prefer_formatted_code = prefer_formatted_code;
        }
        user
    }
}

type Gate = fn(actor: &User, target: &User) -> bool;
type Transform = fn(
    request: &EditUserRequest,
    actor: &User,
    target: &User,
    changes: &mut AcceptedChanges,
) -> DomainResult<()>;

/// A group of fields guarded by its own capability check.
struct Layer {
    name: &'static str,
    gate: Gate,
    apply: Transform,
}

/// Gates are evaluated independently of one another; the first transform
/// error rejects the whole request.
const LAYERS: &[Layer] = &[
    Layer {
        name: "password",
        gate: always,
        apply: change_password,
    },
    Layer {
        name: "identity",
        gate: manages_users,
        apply: change_identity,
    },
    Layer {
        name: "privileges",
        gate: is_admin,
        apply: replace_privileges,
    },
    Layer {
        name: "availability",
        gate: may_toggle_availability,
        apply: change_availability,
    },
    Layer {
        name: "download_data",
        gate: is_admin,
        apply: change_download_data,
    },
    Layer {
        name: "profile",
        gate: always,
        apply: change_profile,
    },
];

fn always(_actor: &User, _target: &User) -> bool {
    true
}

fn manages_users(actor: &User, _target: &User) -> bool {
    actor.has_privilege(MANAGE_USER)
}

fn is_admin(actor: &User, _target: &User) -> bool {
    actor.is_admin
}

fn may_toggle_availability(actor: &User, target: &User) -> bool {
    actor.has_privilege(MANAGE_USER) && !target.is_admin
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn change_password(
    request: &EditUserRequest,
    actor: &User,
    target: &User,
    changes: &mut AcceptedChanges,
) -> DomainResult<()> {
    let (Some(old), Some(new)) = (
        non_empty(&request.old_password),
        non_empty(&request.new_password),
    ) else {
        return Ok(());
    };

    if target.password != old && !actor.has_privilege(MANAGE_USER) {
        return Err(DomainError::WrongPassword);
    }
    changes.password = Some(new.to_string());
    Ok(())
}

fn change_identity(
    request: &EditUserRequest,
    _actor: &User,
    _target: &User,
    changes: &mut AcceptedChanges,
) -> DomainResult<()> {
    if let Some(username) = &request.username {
        if !is_valid_username(username) {
            return Err(DomainError::InvalidUsername);
        }
        changes.username = Some(username.clone());
    }
    changes.email = request.email.clone();
    changes.level = request.level;
    Ok(())
}

fn replace_privileges(
    request: &EditUserRequest,
    _actor: &User,
    _target: &User,
    changes: &mut AcceptedChanges,
) -> DomainResult<()> {
    changes.privileges = Some(PrivilegeInput::normalize(request.privileges.as_ref()));
    Ok(())
}

fn change_availability(
    request: &EditUserRequest,
    _actor: &User,
    _target: &User,
    changes: &mut AcceptedChanges,
) -> DomainResult<()> {
    changes.is_available = request.is_available;
    Ok(())
}

fn change_download_data(
    request: &EditUserRequest,
    _actor: &User,
    _target: &User,
    changes: &mut AcceptedChanges,
) -> DomainResult<()> {
    changes.download_data = request.download_data;
    Ok(())
}

fn change_profile(
    request: &EditUserRequest,
    _actor: &User,
    _target: &User,
    changes: &mut AcceptedChanges,
) -> DomainResult<()> {
    changes.nickname = request.nickname.clone();
    changes.information = request.information.clone();
    changes.sex = request.sex;
    changes.public_email = request.public_email;
    changes.prefer_formatted_code = request.prefer_formatted_code;
    Ok(())
}

/// Decides which parts of an edit request an actor may apply to a target.
pub struct ProfileEditPolicy;

impl ProfileEditPolicy {
    /// Pure evaluation: returns the updated target, never touching the inputs.
    pub fn evaluate(
        actor: Option<&User>,
        target: &User,
        request: &EditUserRequest,
    ) -> DomainResult<User> {
        let actor = actor
            .filter(|actor| target.is_allowed_edit_by(Some(*actor)))
            .ok_or(DomainError::Unauthorized)?;

        let mut changes = AcceptedChanges::default();
        for layer in LAYERS {
            if (layer.gate)(actor, target) {
                (layer.apply)(request, actor, target, &mut changes)?;
            } else {
                tracing::debug!(
                    layer = layer.name,
                    actor_id = actor.id,
                    target_id = target.id,
                    "Edit layer not permitted, ignoring its fields"
                );
            }
        }

        Ok(changes.merge_into(target))
    }
}

#[derive(Debug)]
pub struct ProfileEditOutcome {
    pub user: User,
    /// Set when the actor edited themselves; the session must pick up `user`.
    pub refresh_session: bool,
}

/// Load, evaluate and persist an edit request in one step.
pub async fn edit_profile<S: IdentityStore>(
    store: &S,
    actor: Option<&User>,
    target_id: i32,
    request: &EditUserRequest,
) -> DomainResult<ProfileEditOutcome> {
    let target = store
        .find_by_id(target_id)
        .await?
        .ok_or(DomainError::NotFound("User"))?;

    let updated = ProfileEditPolicy::evaluate(actor, &target, request)?;
    store.save(&updated).await?;

    let refresh_session = actor.is_some_and(|actor| actor.id == updated.id);

    tracing::info!(
        actor_id = actor.map(|actor| actor.id),
        target_id = updated.id,
        "User profile updated"
    );

    Ok(ProfileEditOutcome {
        user: updated,
        refresh_session,
    })
}

/// Hide a user from listings and revoke access, keeping the row.
pub async fn soft_delete<S: IdentityStore>(
    store: &S,
    actor: Option<&User>,
    target_id: i32,
) -> DomainResult<User> {
    let target = store
        .find_by_id(target_id)
        .await?
        .ok_or(DomainError::NotFound("User"))?;

    if target.is_admin {
        return Err(DomainError::InvalidInput(
            "Administrator accounts cannot be deleted".to_string(),
        ));
    }
    if !target.is_allowed_edit_by(actor) {
        return Err(DomainError::Unauthorized);
    }

    let hidden = User {
        is_show: false,
        is_available: false,
        ..target
    };
    store.save(&hidden).await?;

    tracing::info!(
        actor_id = actor.map(|actor| actor.id),
        target_id = hidden.id,
        "User hidden"
    );

    Ok(hidden)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::Result;
    use crate::models::test_user;

    #[derive(Default)]
    struct FakeIdentityStore {
        users: Mutex<HashMap<i32, User>>,
    }

    impl FakeIdentityStore {
        fn with(users: &[&User]) -> Self {
            let store = Self::default();
            for user in users {
                store.users.lock().unwrap().insert(user.id, (*user).clone());
            }
            store
        }

        fn snapshot(&self, id: i32) -> User {
            self.users.lock().unwrap()[&id].clone()
        }
    }

    #[async_trait]
    impl IdentityStore for FakeIdentityStore {
        async fn find_by_id(&self, id: i32) -> Result<Option<User>> {
            Ok(self.users.lock().unwrap().get(&id).cloned())
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .values()
                .find(|user| user.username == username)
                .cloned())
        }

        async fn save(&self, user: &User) -> Result<()> {
            self.users.lock().unwrap().insert(user.id, user.clone());
            Ok(())
        }
    }

    fn admin(id: i32) -> User {
        let mut user = test_user(id, "root");
        user.is_admin = true;
        user
    }

    fn manager(id: i32) -> User {
        let mut user = test_user(id, "moderator");
        user.privileges.insert(MANAGE_USER.to_string());
        user
    }

    #[test]
    fn test_username_predicate() {
        assert!(is_valid_username("abc"));
        assert!(is_valid_username("user_name-16char"));
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username("seventeen_chars_x"));
        assert!(!is_valid_username("bad name"));
        assert!(!is_valid_username("ünicode"));
    }

    #[tokio::test]
    async fn test_stranger_is_unauthorized_and_nothing_changes() {
        let target = test_user(1, "alice");
        let stranger = test_user(2, "eve");
        let store = FakeIdentityStore::with(&[&target, &stranger]);
        let request = EditUserRequest {
            nickname: Some("pwned".to_string()),
            new_password: Some("x".to_string()),
            old_password: Some("secret".to_string()),
            ..Default::default()
        };

        let result = edit_profile(&store, Some(&stranger), 1, &request).await;

        assert!(matches!(result, Err(DomainError::Unauthorized)));
        assert_eq!(store.snapshot(1), target);
    }

    #[tokio::test]
    async fn test_anonymous_is_unauthorized() {
        let target = test_user(1, "alice");
        let store = FakeIdentityStore::with(&[&target]);

        let result = edit_profile(&store, None, 1, &EditUserRequest::default()).await;

        assert!(matches!(result, Err(DomainError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_missing_target_is_not_found() {
        let actor = admin(1);
        let store = FakeIdentityStore::with(&[&actor]);

        let result = edit_profile(&store, Some(&actor), 42, &EditUserRequest::default()).await;

        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_self_edit_without_new_password_keeps_password() {
        let alice = test_user(1, "alice");
        let store = FakeIdentityStore::with(&[&alice]);
        let request = EditUserRequest {
            nickname: Some("Al".to_string()),
            old_password: Some("x".to_string()),
            ..Default::default()
        };

        let outcome = edit_profile(&store, Some(&alice), 1, &request)
            .await
            .unwrap();

        assert_eq!(outcome.user.nickname, "Al");
        assert_eq!(outcome.user.password, "secret");
        assert!(outcome.refresh_session);
        assert_eq!(store.snapshot(1).nickname, "Al");
    }

    #[tokio::test]
    async fn test_self_password_change_checks_old_password() {
        let alice = test_user(1, "alice");
        let store = FakeIdentityStore::with(&[&alice]);

        let wrong = EditUserRequest {
            old_password: Some("guess".to_string()),
            new_password: Some("new".to_string()),
            nickname: Some("changed".to_string()),
            ..Default::default()
        };
        let result = edit_profile(&store, Some(&alice), 1, &wrong).await;
        assert!(matches!(result, Err(DomainError::WrongPassword)));
        assert_eq!(store.snapshot(1), alice);

        let right = EditUserRequest {
            old_password: Some("secret".to_string()),
            new_password: Some("new".to_string()),
            ..Default::default()
        };
        let outcome = edit_profile(&store, Some(&alice), 1, &right).await.unwrap();
        assert_eq!(outcome.user.password, "new");
    }

    #[tokio::test]
    async fn test_manager_resets_password_without_old_one() {
        let target = test_user(1, "alice");
        let actor = manager(2);
        let store = FakeIdentityStore::with(&[&target, &actor]);
        let request = EditUserRequest {
            old_password: Some("whatever".to_string()),
            new_password: Some("reset".to_string()),
            ..Default::default()
        };

        let outcome = edit_profile(&store, Some(&actor), 1, &request).await.unwrap();

        assert_eq!(outcome.user.password, "reset");
        assert!(!outcome.refresh_session);
    }

    #[tokio::test]
    async fn test_manager_privilege_change_ignored_but_nickname_applied() {
        let mut target = test_user(1, "alice");
        target.privileges.insert("upload_problem".to_string());
        let actor = manager(2);
        let store = FakeIdentityStore::with(&[&target, &actor]);
        let request = EditUserRequest {
            privileges: Some(PrivilegeInput::One(MANAGE_USER.to_string())),
            download_data: Some(true),
            nickname: Some("Ally".to_string()),
            ..Default::default()
        };

        let outcome = edit_profile(&store, Some(&actor), 1, &request).await.unwrap();

        assert_eq!(outcome.user.nickname, "Ally");
        assert_eq!(
            outcome.user.privileges,
            BTreeSet::from(["upload_problem".to_string()])
        );
        assert!(!outcome.user.download_data);
    }

    #[tokio::test]
    async fn test_admin_scalar_privilege_becomes_singleton() {
        let mut target = test_user(1, "alice");
        target.privileges.insert("upload_problem".to_string());
        let actor = admin(2);
        let store = FakeIdentityStore::with(&[&target, &actor]);
        let request = EditUserRequest {
            privileges: Some(PrivilegeInput::One(MANAGE_USER.to_string())),
            ..Default::default()
        };

        edit_profile(&store, Some(&actor), 1, &request).await.unwrap();

        assert_eq!(
            store.snapshot(1).privileges,
            BTreeSet::from([MANAGE_USER.to_string()])
        );
    }

    #[tokio::test]
    async fn test_admin_absent_privileges_clears_set() {
        let mut target = test_user(1, "alice");
        target.privileges.insert("upload_problem".to_string());
        let actor = admin(2);
        let store = FakeIdentityStore::with(&[&target, &actor]);

        edit_profile(&store, Some(&actor), 1, &EditUserRequest::default())
            .await
            .unwrap();

        assert!(store.snapshot(1).privileges.is_empty());
    }

    #[tokio::test]
    async fn test_admin_privilege_replacement_keeps_admin_flag() {
        let mut target = admin(1);
        target.privileges.insert(MANAGE_USER.to_string());
        let actor = admin(2);
        let store = FakeIdentityStore::with(&[&target, &actor]);

        let outcome = edit_profile(&store, Some(&actor), 1, &EditUserRequest::default())
            .await
            .unwrap();

        assert!(outcome.user.privileges.is_empty());
        assert!(outcome.user.is_admin);
    }

    #[tokio::test]
    async fn test_invalid_username_rejects_whole_request() {
        let target = test_user(1, "alice");
        let actor = admin(2);
        let store = FakeIdentityStore::with(&[&target, &actor]);
        let request = EditUserRequest {
            username: Some("ab".to_string()),
            nickname: Some("new nick".to_string()),
            privileges: Some(PrivilegeInput::Many(vec!["x".to_string()])),
            ..Default::default()
        };

        let result = edit_profile(&store, Some(&actor), 1, &request).await;

        assert!(matches!(result, Err(DomainError::InvalidUsername)));
        assert_eq!(store.snapshot(1), target);
    }

    #[tokio::test]
    async fn test_username_ignored_without_manage_user() {
        let alice = test_user(1, "alice");
        let store = FakeIdentityStore::with(&[&alice]);
        let request = EditUserRequest {
            username: Some("x".to_string()),
            email: Some("new@example.com".to_string()),
            level: Some(9),
            ..Default::default()
        };

        let outcome = edit_profile(&store, Some(&alice), 1, &request).await.unwrap();

        assert_eq!(outcome.user.username, "alice");
        assert_eq!(outcome.user.email, "alice@example.com");
        assert_eq!(outcome.user.level, 0);
    }

    #[tokio::test]
    async fn test_manager_without_username_keeps_it() {
        let target = test_user(1, "alice");
        let actor = manager(2);
        let store = FakeIdentityStore::with(&[&target, &actor]);
        let request = EditUserRequest {
            email: Some("a2@example.com".to_string()),
            nickname: Some("Al".to_string()),
            ..Default::default()
        };

        let outcome = edit_profile(&store, Some(&actor), 1, &request).await.unwrap();

        assert_eq!(outcome.user.username, "alice");
        assert_eq!(outcome.user.email, "a2@example.com");
        assert_eq!(outcome.user.nickname, "Al");
        assert_eq!(store.snapshot(1).username, "alice");
    }

    #[tokio::test]
    async fn test_manager_edits_identity_fields() {
        let target = test_user(1, "alice");
        let actor = manager(2);
        let store = FakeIdentityStore::with(&[&target, &actor]);
        let request = EditUserRequest {
            username: Some("alice_2".to_string()),
            email: Some("a2@example.com".to_string()),
            level: Some(3),
            is_available: Some(false),
            ..Default::default()
        };

        let outcome = edit_profile(&store, Some(&actor), 1, &request).await.unwrap();

        assert_eq!(outcome.user.username, "alice_2");
        assert_eq!(outcome.user.email, "a2@example.com");
        assert_eq!(outcome.user.level, 3);
        assert!(!outcome.user.is_available);
    }

    #[tokio::test]
    async fn test_admin_availability_cannot_be_toggled() {
        let target = admin(1);
        let actor = admin(2);
        let store = FakeIdentityStore::with(&[&target, &actor]);
        let request = EditUserRequest {
            is_available: Some(false),
            download_data: Some(true),
            ..Default::default()
        };

        let outcome = edit_profile(&store, Some(&actor), 1, &request).await.unwrap();

        assert!(outcome.user.is_available);
        assert!(outcome.user.download_data);
    }

    #[test]
    fn test_evaluate_does_not_touch_inputs() {
        let target = test_user(1, "alice");
        let before = target.clone();
        let request = EditUserRequest {
            nickname: Some("Al".to_string()),
            public_email: Some(true),
            ..Default::default()
        };

        let updated = ProfileEditPolicy::evaluate(Some(&target), &target, &request).unwrap();

        assert_eq!(target, before);
        assert_eq!(updated.nickname, "Al");
        assert!(updated.public_email);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_user() {
        let target = test_user(1, "alice");
        let actor = manager(2);
        let store = FakeIdentityStore::with(&[&target, &actor]);

        let hidden = soft_delete(&store, Some(&actor), 1).await.unwrap();

        assert!(!hidden.is_show);
        assert!(!hidden.is_available);
        assert_eq!(store.snapshot(1), hidden);
    }

    #[tokio::test]
    async fn test_soft_delete_refuses_admins_and_strangers() {
        let root = admin(1);
        let alice = test_user(2, "alice");
        let eve = test_user(3, "eve");
        let store = FakeIdentityStore::with(&[&root, &alice, &eve]);

        let result = soft_delete(&store, Some(&root), 1).await;
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));

        let result = soft_delete(&store, Some(&eve), 2).await;
        assert!(matches!(result, Err(DomainError::Unauthorized)));
        assert!(store.snapshot(2).is_show);
    }
}
