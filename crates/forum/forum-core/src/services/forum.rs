//! Posts, replies, channels and the read-only views derived from them.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ForumError, ForumResult};
use crate::leaderboard::{compute_stats, posting_extremes, LeaderboardEntry, PostingExtremes};
use crate::models::{Channel, DocKind, Document, Identity, Record, RecordView, User};
use crate::retry::{retry_on_conflict, MAX_WRITE_ATTEMPTS};
use crate::search;
use crate::store::{Selector, StoreError, StoreHandle};
use crate::thread::{build_tree, ThreadReply, ThreadView};

/// A new post as submitted by a client
#[derive(Debug, Clone)]
pub struct NewPost {
    pub topic: String,
    pub body: String,
    pub channel_id: String,
    pub attachment_ref: Option<String>,
}

/// A new reply as submitted by a client
#[derive(Debug, Clone)]
pub struct NewReply {
    pub parent_ref: String,
    pub body: String,
    pub attachment_ref: Option<String>,
}

/// Every post and reply, split by kind
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordSet {
    pub posts: Vec<RecordView>,
    pub responses: Vec<RecordView>,
}

#[derive(Clone)]
pub struct ForumService {
    store: StoreHandle,
}

impl ForumService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// The stored account behind an authenticated identity
    async fn author(&self, identity: &Identity) -> ForumResult<User> {
        match self.store.get(&identity.username).await {
            Ok(doc) => doc
                .into_user()
                .ok_or_else(|| ForumError::Unauthorized("Unknown user".to_string())),
            Err(StoreError::NotFound(_)) => {
                warn!(username = %identity.username, "Token for a user that no longer exists");
                Err(ForumError::Unauthorized("Unknown user".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create a post in an existing channel
    pub async fn create_post(&self, identity: &Identity, post: NewPost) -> ForumResult<String> {
        if post.topic.trim().is_empty() || post.body.trim().is_empty() || post.channel_id.is_empty() {
            return Err(ForumError::Validation(
                "Missing topic, data, or channelId".to_string(),
            ));
        }

        self.channel(&post.channel_id).await?;
        let author = self.author(identity).await?;

        let record = Record::new_post(
            &author,
            post.channel_id,
            post.topic,
            post.body,
            non_empty(post.attachment_ref),
        );
        let meta = self.store.insert(Document::from(record)).await?;

        info!(id = %meta.id, author = %author.username, "Created post");
        Ok(meta.id)
    }

    /// Reply to a post or to another reply
    pub async fn create_reply(&self, identity: &Identity, reply: NewReply) -> ForumResult<String> {
        if reply.parent_ref.is_empty() || reply.body.trim().is_empty() {
            return Err(ForumError::Validation("Missing parentId or data".to_string()));
        }

        self.record(&reply.parent_ref).await?;
        let author = self.author(identity).await?;

        let record = Record::new_reply(
            &author,
            reply.parent_ref,
            reply.body,
            non_empty(reply.attachment_ref),
        );
        let meta = self.store.insert(Document::from(record)).await?;

        info!(id = %meta.id, author = %author.username, "Created reply");
        Ok(meta.id)
    }

    /// Fetch a post or reply
    pub async fn record(&self, id: &str) -> ForumResult<Record> {
        self.store
            .get(id)
            .await?
            .into_record()
            .ok_or_else(|| ForumError::NotFound(id.to_string()))
    }

    pub async fn create_channel(
        &self,
        identity: &Identity,
        name: String,
        description: String,
    ) -> ForumResult<String> {
        if name.trim().is_empty() || description.trim().is_empty() {
            return Err(ForumError::Validation(
                "Missing name or description".to_string(),
            ));
        }

        let author = self.author(identity).await?;
        let channel = Channel::new(name, description, author.username);
        let meta = self.store.insert(Document::from(channel)).await?;

        info!(id = %meta.id, author = %identity.username, "Created channel");
        Ok(meta.id)
    }

    pub async fn channel(&self, id: &str) -> ForumResult<Channel> {
        self.store
            .get(id)
            .await?
            .into_channel()
            .ok_or_else(|| ForumError::NotFound(format!("Channel {id}")))
    }

    /// All channels, oldest first
    pub async fn channels(&self) -> ForumResult<Vec<Channel>> {
        let mut channels: Vec<Channel> = self
            .store
            .find(&Selector::kind(DocKind::Channel))
            .await?
            .into_iter()
            .filter_map(Document::into_channel)
            .collect();

        channels.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(channels)
    }

    /// Posts filed under a channel, newest first
    pub async fn channel_posts(&self, channel_id: &str) -> ForumResult<Vec<RecordView>> {
        self.channel(channel_id).await?;

        let mut posts: Vec<Record> = self
            .fetch(Selector::kind(DocKind::Post))
            .await?
            .into_iter()
            .filter(|post| post.channel_id.as_deref() == Some(channel_id))
            .collect();

        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(posts.into_iter().map(RecordView::from).collect())
    }

    async fn fetch(&self, selector: Selector) -> ForumResult<Vec<Record>> {
        Ok(self
            .store
            .find(&selector)
            .await?
            .into_iter()
            .filter_map(Document::into_record)
            .collect())
    }

    /// Posts and replies fetched in a single query
    async fn snapshot(&self) -> ForumResult<(Vec<Record>, Vec<Record>)> {
        let records = self.fetch(Selector::records()).await?;
        Ok(records.into_iter().partition(|r| r.parent_ref.is_none()))
    }

    pub async fn all_records(&self) -> ForumResult<RecordSet> {
        let (posts, replies) = self.snapshot().await?;

        Ok(RecordSet {
            posts: posts.into_iter().map(RecordView::from).collect(),
            responses: replies.into_iter().map(RecordView::from).collect(),
        })
    }

    /// A post with its replies in pre-order, each tagged with its depth
    pub async fn thread(&self, post_id: &str) -> ForumResult<ThreadView> {
        let post = match self.store.get(post_id).await? {
            Document::Post(post) => post,
            _ => return Err(ForumError::NotFound(format!("Post {post_id}"))),
        };
        let replies = self.fetch(Selector::kind(DocKind::Response)).await?;

        let entries = build_tree(post_id, &replies);
        debug!(post_id, replies = entries.len(), "Built thread");

        Ok(ThreadView {
            post: RecordView::from(post),
            replies: entries.into_iter().map(ThreadReply::from).collect(),
        })
    }

    /// Remove any document. Admin only; replies to a deleted record are left in place.
    pub async fn delete(&self, identity: &Identity, id: &str) -> ForumResult<()> {
        if !identity.is_admin() {
            warn!(username = %identity.username, id, "Non-admin delete attempt");
            return Err(ForumError::Forbidden("Admin only".to_string()));
        }

        retry_on_conflict(MAX_WRITE_ATTEMPTS, move || async move {
            let doc = self.store.get(id).await?;
            let rev = doc.rev().unwrap_or_default().to_string();
            self.store.delete(id, &rev).await?;
            Ok(())
        })
        .await?;

        info!(id, admin = %identity.username, "Deleted document");
        Ok(())
    }

    /// Posts and replies whose body contains `query`, ignoring case
    pub async fn search_content(&self, query: &str) -> ForumResult<Vec<RecordView>> {
        if query.is_empty() {
            return Err(ForumError::Validation("Missing search query".to_string()));
        }

        let records = self.fetch(Selector::records()).await?;
        Ok(search::search_content(&records, query)
            .into_iter()
            .cloned()
            .map(RecordView::from)
            .collect())
    }

    /// Posts and replies written by `author`
    pub async fn search_author(&self, author: &str) -> ForumResult<Vec<RecordView>> {
        if author.is_empty() {
            return Err(ForumError::Validation("Missing username".to_string()));
        }

        let records = self.fetch(Selector::records().author(author)).await?;
        Ok(records.into_iter().map(RecordView::from).collect())
    }

    pub async fn leaderboard(&self) -> ForumResult<Vec<LeaderboardEntry>> {
        let (posts, replies) = self.snapshot().await?;
        Ok(compute_stats(&posts, &replies))
    }

    pub async fn posting_extremes(&self) -> ForumResult<PostingExtremes> {
        Ok(posting_extremes(&self.leaderboard().await?))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
