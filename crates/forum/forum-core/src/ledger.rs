//! Vote ledger.
//!
//! Each record keeps a map from voter to vote. Casting the vote a voter already holds
//! retracts it, casting the other one switches it. Counts are always recomputed from the
//! map, so they can never drift from the votes actually held.

use tracing::{debug, info};

use crate::error::{ForumError, ForumResult};
use crate::models::{Document, Record, VoteChoice, VoteTally};
use crate::retry::{retry_on_conflict, MAX_WRITE_ATTEMPTS};
use crate::store::StoreHandle;

/// Apply `voter`'s `choice` to the record in memory and return the new counts
pub fn apply_vote(record: &mut Record, voter: &str, choice: VoteChoice) -> VoteTally {
    match record.votes.get(voter) {
        Some(existing) if *existing == choice => {
            record.votes.remove(voter);
        }
        _ => {
            record.votes.insert(voter.to_string(), choice);
        }
    }

    record.tally()
}

/// Persists votes against the record store
#[derive(Clone)]
pub struct VoteLedger {
    store: StoreHandle,
}

impl VoteLedger {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Cast a vote on a post or reply.
    ///
    /// Fetches the record, applies the vote and writes it back at the fetched revision.
    /// A concurrent write restarts the cycle from a fresh fetch.
    pub async fn cast(&self, record_id: &str, voter: &str, choice: VoteChoice) -> ForumResult<VoteTally> {
        let tally = retry_on_conflict(MAX_WRITE_ATTEMPTS, move || async move {
            let mut record = self
                .store
                .get(record_id)
                .await?
                .into_record()
                .ok_or_else(|| ForumError::NotFound(record_id.to_string()))?;

            let tally = apply_vote(&mut record, voter, choice);
            self.store.update(Document::from(record)).await?;

            debug!(record_id, voter, %choice, "Vote applied");
            Ok(tally)
        })
        .await?;

        info!(
            record_id,
            upvotes = tally.upvotes,
            downvotes = tally.downvotes,
            "Vote recorded"
        );
        Ok(tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::store::{DocMeta, MemoryStore, RecordStore, Selector, StoreResult};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn author() -> User {
        User {
            id: "alice".into(),
            rev: None,
            username: "alice".into(),
            password_hash: String::new(),
            display_name: "Alice".into(),
            avatar: None,
            role: Default::default(),
            skill_level: None,
            created_at: Utc::now(),
        }
    }

    fn post() -> Record {
        Record::new_post(&author(), "c1".into(), "Topic".into(), "Body".into(), None)
    }

    #[test]
    fn test_same_vote_twice_retracts() {
        let mut record = post();
        let before = record.tally();

        let first = apply_vote(&mut record, "bob", VoteChoice::Up);
        assert_eq!(first, VoteTally { upvotes: 1, downvotes: 0 });

        let second = apply_vote(&mut record, "bob", VoteChoice::Up);
        assert_eq!(second, before);
        assert!(!record.votes.contains_key("bob"));
    }

    #[test]
    fn test_switching_vote_keeps_one_entry() {
        let mut record = post();

        apply_vote(&mut record, "bob", VoteChoice::Up);
        let tally = apply_vote(&mut record, "bob", VoteChoice::Down);

        assert_eq!(tally, VoteTally { upvotes: 0, downvotes: 1 });
        assert_eq!(record.votes.len(), 1);
        assert_eq!(record.votes.get("bob"), Some(&VoteChoice::Down));
    }

    #[test]
    fn test_votes_from_different_users_accumulate() {
        let mut record = post();

        apply_vote(&mut record, "bob", VoteChoice::Up);
        apply_vote(&mut record, "carol", VoteChoice::Up);
        let tally = apply_vote(&mut record, "dave", VoteChoice::Down);

        assert_eq!(tally, VoteTally { upvotes: 2, downvotes: 1 });
    }

    #[tokio::test]
    async fn test_cast_persists_and_toggles() {
        let store = Arc::new(MemoryStore::new());
        let meta = store.insert(Document::from(post())).await.unwrap();
        let ledger = VoteLedger::new(store.clone());

        let tally = ledger.cast(&meta.id, "bob", VoteChoice::Up).await.unwrap();
        assert_eq!(tally.upvotes, 1);

        let stored = store.get(&meta.id).await.unwrap().into_record().unwrap();
        assert_eq!(stored.votes.get("bob"), Some(&VoteChoice::Up));

        let tally = ledger.cast(&meta.id, "bob", VoteChoice::Up).await.unwrap();
        assert_eq!(tally, VoteTally::default());
    }

    #[tokio::test]
    async fn test_cast_on_missing_record() {
        let ledger = VoteLedger::new(Arc::new(MemoryStore::new()));

        let err = ledger.cast("nope", "bob", VoteChoice::Up).await.unwrap_err();
        assert!(matches!(err, ForumError::NotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_cast_on_channel_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let channel = crate::models::Channel::new("c".into(), "d".into(), "alice".into());
        let meta = store.insert(Document::from(channel)).await.unwrap();

        let err = VoteLedger::new(store)
            .cast(&meta.id, "bob", VoteChoice::Up)
            .await
            .unwrap_err();
        assert!(matches!(err, ForumError::NotFound(_)));
    }

    /// Lets a competing voter slip in before the first `conflicts` updates land
    struct RacingStore {
        inner: MemoryStore,
        conflicts: AtomicUsize,
    }

    #[async_trait]
    impl RecordStore for RacingStore {
        async fn insert(&self, doc: Document) -> StoreResult<DocMeta> {
            self.inner.insert(doc).await
        }

        async fn update(&self, doc: Document) -> StoreResult<DocMeta> {
            if self.conflicts.load(Ordering::SeqCst) > 0 {
                self.conflicts.fetch_sub(1, Ordering::SeqCst);

                let mut competing = self.inner.get(doc.id()).await?.into_record().unwrap();
                apply_vote(&mut competing, "mallory", VoteChoice::Down);
                self.inner.update(Document::from(competing)).await?;
            }
            self.inner.update(doc).await
        }

        async fn get(&self, id: &str) -> StoreResult<Document> {
            self.inner.get(id).await
        }

        async fn delete(&self, id: &str, rev: &str) -> StoreResult<()> {
            self.inner.delete(id, rev).await
        }

        async fn find(&self, selector: &Selector) -> StoreResult<Vec<Document>> {
            self.inner.find(selector).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_vote_is_not_lost() {
        let store = Arc::new(RacingStore {
            inner: MemoryStore::new(),
            conflicts: AtomicUsize::new(1),
        });
        let meta = store.insert(Document::from(post())).await.unwrap();

        let tally = VoteLedger::new(store.clone())
            .cast(&meta.id, "bob", VoteChoice::Up)
            .await
            .unwrap();

        // Both the competing vote and ours survive
        assert_eq!(tally, VoteTally { upvotes: 1, downvotes: 1 });
        let stored = store.get(&meta.id).await.unwrap().into_record().unwrap();
        assert_eq!(stored.votes.len(), 2);
    }

    #[tokio::test]
    async fn test_conflict_surfaces_after_bound() {
        let store = Arc::new(RacingStore {
            inner: MemoryStore::new(),
            conflicts: AtomicUsize::new(10),
        });
        let meta = store.insert(Document::from(post())).await.unwrap();

        let err = VoteLedger::new(store)
            .cast(&meta.id, "bob", VoteChoice::Up)
            .await
            .unwrap_err();
        assert!(matches!(err, ForumError::VersionConflict(_)));
    }
}
