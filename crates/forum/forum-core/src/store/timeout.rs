use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{DocMeta, RecordStore, Selector, StoreError, StoreHandle, StoreResult};
use crate::models::Document;

/// Wraps a store so that every call fails with `Unavailable` once `limit` elapses
pub struct TimeoutStore {
    inner: StoreHandle,
    limit: Duration,
}

impl TimeoutStore {
    pub fn new(inner: StoreHandle, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn guard<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = StoreResult<T>> + Send,
    ) -> StoreResult<T> {
        match tokio::time::timeout(self.limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, limit_ms = self.limit.as_millis() as u64, "Store call timed out");
                Err(StoreError::Unavailable(format!(
                    "{operation} timed out after {}ms",
                    self.limit.as_millis()
                )))
            }
        }
    }
}

#[async_trait]
impl RecordStore for TimeoutStore {
    async fn insert(&self, doc: Document) -> StoreResult<DocMeta> {
        self.guard("insert", self.inner.insert(doc)).await
    }

    async fn update(&self, doc: Document) -> StoreResult<DocMeta> {
        self.guard("update", self.inner.update(doc)).await
    }

    async fn get(&self, id: &str) -> StoreResult<Document> {
        self.guard("get", self.inner.get(id)).await
    }

    async fn delete(&self, id: &str, rev: &str) -> StoreResult<()> {
        self.guard("delete", self.inner.delete(id, rev)).await
    }

    async fn find(&self, selector: &Selector) -> StoreResult<Vec<Document>> {
        self.guard("find", self.inner.find(selector)).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.guard("ping", self.inner.ping()).await
    }
}
