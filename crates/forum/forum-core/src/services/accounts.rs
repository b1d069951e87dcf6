use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{ForumError, ForumResult};
use crate::models::{Document, Role, User, UserProfile};
use crate::password::{hash_password, verify_password};
use crate::retry::{retry_on_conflict, MAX_WRITE_ATTEMPTS};
use crate::store::{StoreError, StoreHandle};

/// Sign-up request
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub avatar: Option<String>,
}

/// Profile fields a user may change. Absent or empty fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub skill_level: Option<String>,
}

/// Registration, login and profile management
#[derive(Clone)]
pub struct AccountService {
    store: StoreHandle,
    admins: Arc<HashSet<String>>,
}

impl AccountService {
    pub fn new(store: StoreHandle, admins: impl IntoIterator<Item = String>) -> Self {
        Self {
            store,
            admins: Arc::new(admins.into_iter().collect()),
        }
    }

    /// Create an account. The username becomes the document id.
    pub async fn register(&self, registration: Registration) -> ForumResult<UserProfile> {
        let Registration {
            username,
            password,
            display_name,
            avatar,
        } = registration;

        validate_username(&username)?;
        if password.is_empty() || display_name.trim().is_empty() {
            return Err(ForumError::Validation(
                "Missing username, password, or displayName".to_string(),
            ));
        }

        let role = if self.admins.contains(&username) {
            Role::Admin
        } else {
            Role::User
        };

        let user = User {
            id: username.clone(),
            rev: None,
            username: username.clone(),
            password_hash: hash_password(&password)?,
            display_name,
            avatar: avatar.filter(|a| !a.is_empty()),
            role,
            skill_level: None,
            created_at: Utc::now(),
        };
        let profile = user.profile();

        match self.store.insert(Document::from(user)).await {
            Ok(_) => {
                info!(username = %username, ?role, "Registered user");
                Ok(profile)
            }
            // The id is the username, so a taken id means a taken username
            Err(StoreError::VersionConflict(_)) => {
                debug!(username = %username, "Registration for existing user");
                Err(ForumError::AlreadyExists("User exists".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check credentials and return the stored account
    pub async fn authenticate(&self, username: &str, password: &str) -> ForumResult<User> {
        let invalid = || ForumError::Unauthorized("Invalid credentials".to_string());

        let user = match self.user(username).await {
            Ok(user) => user,
            Err(ForumError::NotFound(_)) => {
                debug!(username, "Login for unknown user");
                return Err(invalid());
            }
            Err(e) => return Err(e),
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(username, "Login with wrong password");
            return Err(invalid());
        }

        Ok(user)
    }

    /// Load an account by username
    pub async fn user(&self, username: &str) -> ForumResult<User> {
        self.store
            .get(username)
            .await?
            .into_user()
            .ok_or_else(|| ForumError::NotFound(format!("User {username}")))
    }

    /// Public profile of an account
    pub async fn profile(&self, username: &str) -> ForumResult<UserProfile> {
        Ok(self.user(username).await?.profile())
    }

    /// Apply profile changes with the bounded conflict retry
    pub async fn update_profile(&self, username: &str, update: ProfileUpdate) -> ForumResult<UserProfile> {
        let update = &update;

        let profile = retry_on_conflict(MAX_WRITE_ATTEMPTS, move || async move {
            let mut user = self.user(username).await?;

            if let Some(display_name) = non_empty(&update.display_name) {
                user.display_name = display_name;
            }
            if let Some(avatar) = non_empty(&update.avatar) {
                user.avatar = Some(avatar);
            }
            if let Some(skill_level) = non_empty(&update.skill_level) {
                user.skill_level = Some(skill_level);
            }

            let profile = user.profile();
            self.store.update(Document::from(user)).await?;
            Ok(profile)
        })
        .await?;

        info!(username, "Updated profile");
        Ok(profile)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Usernames double as document ids and URL segments
fn validate_username(username: &str) -> ForumResult<()> {
    if username.is_empty() {
        return Err(ForumError::Validation(
            "Missing username, password, or displayName".to_string(),
        ));
    }
    if username.starts_with('_') {
        return Err(ForumError::Validation(
            "Username may not start with '_'".to_string(),
        ));
    }
    if username.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(ForumError::Validation(
            "Username may not contain whitespace or '/'".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> AccountService {
        AccountService::new(Arc::new(MemoryStore::new()), vec!["admin".to_string()])
    }

    fn registration(username: &str) -> Registration {
        Registration {
            username: username.into(),
            password: "s3cret-pass".into(),
            display_name: format!("{username} display"),
            avatar: None,
        }
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let accounts = service();

        let profile = accounts.register(registration("alice")).await.unwrap();
        assert_eq!(profile.username, "alice");
        assert_eq!(profile.role, Role::User);

        let user = accounts.authenticate("alice", "s3cret-pass").await.unwrap();
        assert_eq!(user.id, "alice");
        assert_ne!(user.password_hash, "s3cret-pass");
    }

    #[tokio::test]
    async fn test_admin_list_grants_role() {
        let accounts = service();
        let profile = accounts.register(registration("admin")).await.unwrap();
        assert_eq!(profile.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let accounts = service();
        accounts.register(registration("alice")).await.unwrap();

        let err = accounts.register(registration("alice")).await.unwrap_err();
        assert!(matches!(err, ForumError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_invalid_registrations() {
        let accounts = service();

        for name in ["", "_design", "bad name", "a/b"] {
            let err = accounts.register(registration(name)).await.unwrap_err();
            assert!(matches!(err, ForumError::Validation(_)), "{name:?}");
        }

        let mut missing_password = registration("bob");
        missing_password.password.clear();
        assert!(matches!(
            accounts.register(missing_password).await,
            Err(ForumError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_bad_credentials_are_unauthorized() {
        let accounts = service();
        accounts.register(registration("alice")).await.unwrap();

        let wrong = accounts.authenticate("alice", "nope").await.unwrap_err();
        assert!(matches!(wrong, ForumError::Unauthorized(_)));

        let unknown = accounts.authenticate("nobody", "nope").await.unwrap_err();
        assert!(matches!(unknown, ForumError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_update_profile_keeps_unset_fields() {
        let accounts = service();
        accounts.register(registration("alice")).await.unwrap();

        let profile = accounts
            .update_profile(
                "alice",
                ProfileUpdate {
                    display_name: Some(String::new()),
                    avatar: Some("avatars/a.png".into()),
                    skill_level: Some("Senior".into()),
                },
            )
            .await
            .unwrap();

        assert_eq!(profile.display_name, "alice display");
        assert_eq!(profile.avatar.as_deref(), Some("avatars/a.png"));
        assert_eq!(profile.skill_level.as_deref(), Some("Senior"));
        assert_eq!(accounts.profile("alice").await.unwrap(), profile);
    }

    #[tokio::test]
    async fn test_profile_of_unknown_user() {
        let err = service().profile("ghost").await.unwrap_err();
        assert!(matches!(err, ForumError::NotFound(_)));
    }
}
