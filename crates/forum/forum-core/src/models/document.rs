use serde::{Deserialize, Serialize};

use crate::models::channel::Channel;
use crate::models::record::{Record, RecordKind};
use crate::models::user::User;

/// Value of the `type` discriminator on stored documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    Post,
    Response,
    Channel,
    User,
}

impl DocKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocKind::Post => "post",
            DocKind::Response => "response",
            DocKind::Channel => "channel",
            DocKind::User => "user",
        }
    }
}

/// Everything the record store holds, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Document {
    Post(Record),
    Response(Record),
    Channel(Channel),
    User(User),
}

impl Document {
    pub fn kind(&self) -> DocKind {
        match self {
            Document::Post(_) => DocKind::Post,
            Document::Response(_) => DocKind::Response,
            Document::Channel(_) => DocKind::Channel,
            Document::User(_) => DocKind::User,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Document::Post(r) | Document::Response(r) => &r.id,
            Document::Channel(c) => &c.id,
            Document::User(u) => &u.id,
        }
    }

    pub fn rev(&self) -> Option<&str> {
        match self {
            Document::Post(r) | Document::Response(r) => r.rev.as_deref(),
            Document::Channel(c) => c.rev.as_deref(),
            Document::User(u) => u.rev.as_deref(),
        }
    }

    /// Stamp the id and revision assigned by the store
    pub fn set_meta(&mut self, id: String, rev: String) {
        let (id_slot, rev_slot) = match self {
            Document::Post(r) | Document::Response(r) => (&mut r.id, &mut r.rev),
            Document::Channel(c) => (&mut c.id, &mut c.rev),
            Document::User(u) => (&mut u.id, &mut u.rev),
        };
        *id_slot = id;
        *rev_slot = Some(rev);
    }

    /// Username the document is attributed to
    pub fn author(&self) -> Option<&str> {
        match self {
            Document::Post(r) | Document::Response(r) => Some(&r.author),
            Document::Channel(c) => Some(&c.author),
            Document::User(_) => None,
        }
    }

    pub fn into_record(self) -> Option<Record> {
        match self {
            Document::Post(r) | Document::Response(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_channel(self) -> Option<Channel> {
        match self {
            Document::Channel(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_user(self) -> Option<User> {
        match self {
            Document::User(u) => Some(u),
            _ => None,
        }
    }
}

impl From<Record> for Document {
    fn from(record: Record) -> Self {
        match record.kind() {
            RecordKind::Post => Document::Post(record),
            RecordKind::Reply => Document::Response(record),
        }
    }
}

impl From<Channel> for Document {
    fn from(channel: Channel) -> Self {
        Document::Channel(channel)
    }
}

impl From<User> for Document {
    fn from(user: User) -> Self {
        Document::User(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_document_tagging() {
        let channel = Channel::new("rust".into(), "All things Rust".into(), "alice".into());
        let value = serde_json::to_value(Document::from(channel)).unwrap();
        assert_eq!(value["type"], "channel");
        assert_eq!(value["name"], "rust");

        let parsed: Document = serde_json::from_value(serde_json::json!({
            "type": "response",
            "_id": "r9",
            "_rev": "3-ff",
            "parentId": "p1",
            "author": "bob",
            "data": "agreed",
            "timestamp": Utc::now().to_rfc3339(),
        }))
        .unwrap();
        assert_eq!(parsed.kind(), DocKind::Response);
        assert_eq!(parsed.id(), "r9");
        assert_eq!(parsed.rev(), Some("3-ff"));
        assert_eq!(parsed.author(), Some("bob"));
    }
}
