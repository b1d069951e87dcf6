use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A topic channel that posts are filed under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(rename = "_id", default)]
    pub id: String,

    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    pub name: String,

    pub description: String,

    /// Username of the creator
    pub author: String,

    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Channel {
    pub fn new(name: String, description: String, author: String) -> Self {
        Self {
            id: String::new(),
            rev: None,
            name,
            description,
            author,
            created_at: Utc::now(),
        }
    }
}
