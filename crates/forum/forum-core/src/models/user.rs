use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Skill level shown for authors who never set one
pub const UNRATED: &str = "Unrated";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// A registered account. The document id is the username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default)]
    pub id: String,

    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    pub username: String,

    /// Argon2 PHC string
    #[serde(rename = "password")]
    pub password_hash: String,

    pub display_name: String,

    #[serde(default)]
    pub avatar: Option<String>,

    #[serde(default)]
    pub role: Role,

    #[serde(default)]
    pub skill_level: Option<String>,

    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn skill_level_or_default(&self) -> &str {
        self.skill_level.as_deref().unwrap_or(UNRATED)
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            avatar: self.avatar.clone(),
            role: self.role,
            skill_level: self.skill_level.clone(),
            created_at: self.created_at,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
        }
    }
}

/// Public view of an account; never carries the password hash
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub username: String,
    pub display_name: String,
    pub avatar: Option<String>,
    pub role: Role,
    pub skill_level: Option<String>,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// The authenticated caller of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub display_name: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
