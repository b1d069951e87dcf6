use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{DocMeta, RecordStore, Selector, StoreError, StoreResult};
use crate::models::Document;

/// In-memory implementation of the record store.
///
/// Revisions follow the `<generation>-<nonce>` shape so that ids and revisions look
/// the same as those handed out by CouchDB.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<String, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }

    fn next_rev(prev: Option<&str>) -> String {
        let generation = prev
            .and_then(|rev| rev.split_once('-'))
            .and_then(|(generation, _)| generation.parse::<u64>().ok())
            .unwrap_or(0);

        format!("{}-{}", generation + 1, Uuid::new_v4().simple())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, mut doc: Document) -> StoreResult<DocMeta> {
        let id = if doc.id().is_empty() {
            Uuid::new_v4().simple().to_string()
        } else {
            doc.id().to_string()
        };

        let mut docs = self.docs.write().await;
        if docs.contains_key(&id) {
            return Err(StoreError::VersionConflict(id));
        }

        let rev = Self::next_rev(None);
        doc.set_meta(id.clone(), rev.clone());
        debug!(id = %id, kind = doc.kind().as_str(), "Inserted document");
        docs.insert(id.clone(), doc);

        Ok(DocMeta { id, rev })
    }

    async fn update(&self, mut doc: Document) -> StoreResult<DocMeta> {
        let id = doc.id().to_string();
        let mut docs = self.docs.write().await;

        let current = docs
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if current.rev() != doc.rev() {
            return Err(StoreError::VersionConflict(id));
        }

        let rev = Self::next_rev(doc.rev());
        doc.set_meta(id.clone(), rev.clone());
        docs.insert(id.clone(), doc);

        Ok(DocMeta { id, rev })
    }

    async fn get(&self, id: &str) -> StoreResult<Document> {
        self.docs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: &str, rev: &str) -> StoreResult<()> {
        let mut docs = self.docs.write().await;

        let current = docs
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if current.rev() != Some(rev) {
            return Err(StoreError::VersionConflict(id.to_string()));
        }

        docs.remove(id);
        debug!(id = %id, "Deleted document");
        Ok(())
    }

    async fn find(&self, selector: &Selector) -> StoreResult<Vec<Document>> {
        let docs = self.docs.read().await;
        Ok(docs
            .values()
            .filter(|doc| selector.matches(doc))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Channel, DocKind};

    fn channel(name: &str) -> Document {
        Document::from(Channel::new(name.into(), "desc".into(), "alice".into()))
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_revision() {
        let store = MemoryStore::new();

        let meta = store.insert(channel("general")).await.unwrap();
        assert!(!meta.id.is_empty());
        assert!(meta.rev.starts_with("1-"));

        let stored = store.get(&meta.id).await.unwrap();
        assert_eq!(stored.id(), meta.id);
        assert_eq!(stored.rev(), Some(meta.rev.as_str()));
    }

    #[tokio::test]
    async fn test_insert_existing_id_conflicts() {
        let store = MemoryStore::new();
        let mut doc = channel("general");
        doc.set_meta("fixed".into(), String::new());

        store.insert(doc.clone()).await.unwrap();
        let err = store.insert(doc).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict(id) if id == "fixed"));
    }

    #[tokio::test]
    async fn test_stale_update_conflicts() {
        let store = MemoryStore::new();
        let meta = store.insert(channel("general")).await.unwrap();

        let first = store.get(&meta.id).await.unwrap();
        let second = first.clone();

        let updated = store.update(first).await.unwrap();
        assert!(updated.rev.starts_with("2-"));

        // The second copy still carries the old revision
        let err = store.update(second).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict(_)));
    }

    #[tokio::test]
    async fn test_delete_requires_current_revision() {
        let store = MemoryStore::new();
        let meta = store.insert(channel("general")).await.unwrap();

        let err = store.delete(&meta.id, "1-stale").await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict(_)));

        store.delete(&meta.id, &meta.rev).await.unwrap();
        assert!(matches!(
            store.get(&meta.id).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_find_by_kind() {
        let store = MemoryStore::new();
        store.insert(channel("a")).await.unwrap();
        store.insert(channel("b")).await.unwrap();

        let channels = store.find(&Selector::kind(DocKind::Channel)).await.unwrap();
        assert_eq!(channels.len(), 2);

        let posts = store.find(&Selector::kind(DocKind::Post)).await.unwrap();
        assert!(posts.is_empty());
    }
}
