use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ForumError;
use crate::models::user::User;

/// A single user's vote on a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Up,
    Down,
}

impl FromStr for VoteChoice {
    type Err = ForumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(VoteChoice::Up),
            "down" => Ok(VoteChoice::Down),
            other => Err(ForumError::InvalidChoice(other.to_string())),
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteChoice::Up => write!(f, "up"),
            VoteChoice::Down => write!(f, "down"),
        }
    }
}

/// Up and down counts derived from a record's votes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    pub upvotes: u32,
    pub downvotes: u32,
}

/// Whether a record opens a thread or answers one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    #[serde(rename = "post")]
    Post,
    #[serde(rename = "response")]
    Reply,
}

/// A post or a reply.
///
/// Posts carry a topic and a channel; replies carry the id of the record they answer,
/// which may itself be a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Document id, assigned by the store on insert
    #[serde(rename = "_id", default)]
    pub id: String,

    /// Store revision of the last read
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    /// Record this reply answers; absent for posts
    #[serde(rename = "parentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_ref: Option<String>,

    /// Channel a post was made in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,

    /// Post headline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    /// Username of the author
    #[serde(default)]
    pub author: String,

    /// Author display name at the time of writing
    #[serde(default)]
    pub display_name: String,

    #[serde(rename = "avatar", default)]
    pub avatar_ref: Option<String>,

    /// Text content
    #[serde(rename = "data", default)]
    pub body: String,

    #[serde(rename = "image", default)]
    pub attachment_ref: Option<String>,

    #[serde(default)]
    pub skill_level: Option<String>,

    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,

    /// Voter username to vote
    #[serde(default)]
    pub votes: BTreeMap<String, VoteChoice>,
}

impl Record {
    /// Create a post in `channel_id` attributed to `author`
    pub fn new_post(
        author: &User,
        channel_id: String,
        topic: String,
        body: String,
        attachment_ref: Option<String>,
    ) -> Self {
        let mut record = Self::authored_by(author, body, attachment_ref);
        record.channel_id = Some(channel_id);
        record.topic = Some(topic);
        record
    }

    /// Create a reply to `parent_ref` attributed to `author`
    pub fn new_reply(
        author: &User,
        parent_ref: String,
        body: String,
        attachment_ref: Option<String>,
    ) -> Self {
        let mut record = Self::authored_by(author, body, attachment_ref);
        record.parent_ref = Some(parent_ref);
        record
    }

    fn authored_by(author: &User, body: String, attachment_ref: Option<String>) -> Self {
        Self {
            id: String::new(),
            rev: None,
            parent_ref: None,
            channel_id: None,
            topic: None,
            author: author.username.clone(),
            display_name: author.display_name.clone(),
            avatar_ref: author.avatar.clone(),
            body,
            attachment_ref,
            skill_level: Some(author.skill_level_or_default().to_string()),
            created_at: Utc::now(),
            votes: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> RecordKind {
        if self.parent_ref.is_some() {
            RecordKind::Reply
        } else {
            RecordKind::Post
        }
    }

    /// Count the current up and down entries
    pub fn tally(&self) -> VoteTally {
        self.votes.values().fold(VoteTally::default(), |mut tally, choice| {
            match choice {
                VoteChoice::Up => tally.upvotes += 1,
                VoteChoice::Down => tally.downvotes += 1,
            }
            tally
        })
    }
}

/// A record as served to clients, with its derived vote counts
#[derive(Debug, Clone, Serialize)]
pub struct RecordView {
    #[serde(rename = "type")]
    pub kind: RecordKind,

    #[serde(flatten)]
    pub record: Record,

    pub upvotes: u32,
    pub downvotes: u32,
}

impl From<Record> for RecordView {
    fn from(record: Record) -> Self {
        let tally = record.tally();
        Self {
            kind: record.kind(),
            record,
            upvotes: tally.upvotes,
            downvotes: tally.downvotes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_choice_parsing() {
        assert_eq!("up".parse::<VoteChoice>().unwrap(), VoteChoice::Up);
        assert_eq!("down".parse::<VoteChoice>().unwrap(), VoteChoice::Down);

        let err = "sideways".parse::<VoteChoice>().unwrap_err();
        assert!(matches!(err, ForumError::InvalidChoice(ref c) if c == "sideways"));
    }

    #[test]
    fn test_record_wire_format() {
        let json = serde_json::json!({
            "_id": "r1",
            "_rev": "1-abc",
            "parentId": "p1",
            "author": "alice",
            "displayName": "Alice",
            "data": "hello",
            "timestamp": "2024-05-01T10:00:00Z",
            "votes": { "bob": "up", "carol": "down" },
            "upvotes": 7
        });

        let record: Record = serde_json::from_value(json).unwrap();
        assert_eq!(record.kind(), RecordKind::Reply);
        assert_eq!(record.body, "hello");

        // Stored counters are ignored in favour of the ledger
        let view = RecordView::from(record);
        assert_eq!(view.upvotes, 1);
        assert_eq!(view.downvotes, 1);

        let out = serde_json::to_value(&view).unwrap();
        assert_eq!(out["type"], "response");
        assert_eq!(out["parentId"], "p1");
        assert_eq!(out["upvotes"], 1);
    }
}
