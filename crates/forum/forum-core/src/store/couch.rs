//! CouchDB backend.
//!
//! Talks to the CouchDB HTTP API: documents live under `/{db}/{id}`, writes carry the
//! `_rev` of the last read and answer `409 Conflict` when it is stale, and queries go
//! through the Mango `_find` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use backoff::backoff::Constant;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use super::{DocMeta, RecordStore, Selector, StoreError, StoreResult};
use crate::models::Document;

/// Databases a single-node CouchDB expects to exist
const SYSTEM_DATABASES: [&str; 3] = ["_users", "_replicator", "_global_changes"];

/// Connection settings for [`CouchStore`]
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server root, e.g. `http://localhost:5984`
    pub url: String,
    /// Application database name
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Connection attempts at startup
    pub connect_retries: u32,
    /// Pause between connection attempts
    pub connect_delay: Duration,
    /// Upper bound on documents returned by one `_find`
    pub find_limit: u32,
}

impl Default for CouchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5984".to_string(),
            database: "postsdb".to_string(),
            username: None,
            password: None,
            timeout: Duration::from_secs(5),
            connect_retries: 5,
            connect_delay: Duration::from_secs(3),
            find_limit: 100_000,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    id: String,
    rev: String,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    docs: Vec<Value>,
    #[serde(default)]
    warning: Option<String>,
}

/// Record store backed by a CouchDB database
pub struct CouchStore {
    client: Client,
    root: Url,
    database: String,
    username: Option<String>,
    password: Option<String>,
    find_limit: u32,
}

impl CouchStore {
    /// Connect to CouchDB, creating the system and application databases when missing.
    ///
    /// Retries `connect_retries` times with `connect_delay` between attempts, since the
    /// database container often comes up after the forum.
    pub async fn connect(config: CouchConfig) -> StoreResult<Self> {
        let root = Url::parse(&config.url)
            .map_err(|e| StoreError::Backend(format!("Invalid CouchDB URL {}: {e}", config.url)))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Backend(format!("Failed to build HTTP client: {e}")))?;

        let store = Self {
            client,
            root,
            database: config.database.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            find_limit: config.find_limit,
        };

        let attempts = config.connect_retries.max(1);
        let mut attempt = 0;
        let pending = &store;

        backoff::future::retry_notify(
            Constant::new(config.connect_delay),
            move || {
                attempt += 1;
                let current = attempt;

                async move {
                    pending.ensure_databases().await.map_err(|e| {
                        if current < attempts {
                            backoff::Error::transient(e)
                        } else {
                            backoff::Error::permanent(e)
                        }
                    })
                }
            },
            |e: StoreError, wait: Duration| {
                warn!(error = %e, retry_in = ?wait, "CouchDB not ready, retrying");
            },
        )
        .await?;

        info!(database = %store.database, "Connected to CouchDB");
        Ok(store)
    }

    async fn ensure_databases(&self) -> StoreResult<()> {
        for name in SYSTEM_DATABASES {
            self.ensure_database(name).await?;
        }
        self.ensure_database(&self.database).await
    }

    async fn ensure_database(&self, name: &str) -> StoreResult<()> {
        let url = self.url(&[name])?;
        let response = self.send(self.client.head(url.clone())).await?;

        if response.status() == StatusCode::NOT_FOUND {
            let response = self.send(self.client.put(url)).await?;
            // 412 means another node created it first
            if !response.status().is_success() && response.status() != StatusCode::PRECONDITION_FAILED {
                return Err(Self::unexpected(name, response).await);
            }
            info!(database = name, "Created CouchDB database");
        } else if !response.status().is_success() {
            return Err(Self::unexpected(name, response).await);
        }

        Ok(())
    }

    fn url(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut url = self.root.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Backend(format!("CouchDB URL cannot be a base: {}", self.root)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn doc_url(&self, id: &str) -> StoreResult<Url> {
        self.url(&[self.database.as_str(), id])
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let request = match &self.username {
            Some(user) => request.basic_auth(user, self.password.as_ref()),
            None => request,
        };

        request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                StoreError::Unavailable(e.to_string())
            } else {
                StoreError::Backend(e.to_string())
            }
        })
    }

    async fn unexpected(context: &str, response: Response) -> StoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_server_error() {
            StoreError::Unavailable(format!("{context}: {status} {body}"))
        } else {
            StoreError::Backend(format!("{context}: {status} {body}"))
        }
    }

    async fn write(&self, id: &str, request: RequestBuilder) -> StoreResult<DocMeta> {
        let response = self.send(request).await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED => {
                let written: WriteResponse = response
                    .json()
                    .await
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(DocMeta {
                    id: written.id,
                    rev: written.rev,
                })
            }
            StatusCode::CONFLICT => Err(StoreError::VersionConflict(id.to_string())),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(id.to_string())),
            _ => Err(Self::unexpected(id, response).await),
        }
    }

    fn encode(doc: &Document) -> StoreResult<Value> {
        let mut value = serde_json::to_value(doc).map_err(|e| StoreError::Serialization(e.to_string()))?;

        // Let CouchDB assign ids for new documents
        if let Some(object) = value.as_object_mut() {
            if doc.id().is_empty() {
                object.remove("_id");
            }
        }

        Ok(value)
    }

    fn decode(value: Value) -> StoreResult<Document> {
        serde_json::from_value(value).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

/// Translate a selector into a Mango query selector
pub fn mango_selector(selector: &Selector) -> Value {
    let mut mango = serde_json::Map::new();

    match selector.kinds.as_slice() {
        [] => {}
        [kind] => {
            mango.insert("type".to_string(), json!(kind.as_str()));
        }
        kinds => {
            let names: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
            mango.insert("type".to_string(), json!({ "$in": names }));
        }
    }

    if let Some(author) = &selector.author {
        mango.insert("author".to_string(), json!(author));
    }

    Value::Object(mango)
}

#[async_trait]
impl RecordStore for CouchStore {
    async fn insert(&self, doc: Document) -> StoreResult<DocMeta> {
        let body = Self::encode(&doc)?;

        let request = if doc.id().is_empty() {
            self.client.post(self.url(&[self.database.as_str()])?).json(&body)
        } else {
            self.client.put(self.doc_url(doc.id())?).json(&body)
        };

        let meta = self.write(doc.id(), request).await?;
        debug!(id = %meta.id, kind = doc.kind().as_str(), "Inserted document");
        Ok(meta)
    }

    async fn update(&self, doc: Document) -> StoreResult<DocMeta> {
        if doc.rev().is_none() {
            return Err(StoreError::VersionConflict(doc.id().to_string()));
        }

        let body = Self::encode(&doc)?;
        let request = self.client.put(self.doc_url(doc.id())?).json(&body);
        self.write(doc.id(), request).await
    }

    async fn get(&self, id: &str) -> StoreResult<Document> {
        let response = self.send(self.client.get(self.doc_url(id)?)).await?;

        match response.status() {
            StatusCode::OK => {
                let value: Value = response
                    .json()
                    .await
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Self::decode(value)
            }
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(id.to_string())),
            _ => Err(Self::unexpected(id, response).await),
        }
    }

    async fn delete(&self, id: &str, rev: &str) -> StoreResult<()> {
        let request = self.client.delete(self.doc_url(id)?).query(&[("rev", rev)]);
        self.write(id, request).await.map(|_| ())
    }

    async fn find(&self, selector: &Selector) -> StoreResult<Vec<Document>> {
        let query = json!({
            "selector": mango_selector(selector),
            "limit": self.find_limit,
        });

        let url = self.url(&[self.database.as_str(), "_find"])?;
        let response = self.send(self.client.post(url).json(&query)).await?;
        if !response.status().is_success() {
            return Err(Self::unexpected("_find", response).await);
        }

        let found: FindResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(warning) = found.warning {
            debug!(%warning, "CouchDB _find warning");
        }

        found.docs.into_iter().map(Self::decode).collect()
    }

    async fn ping(&self) -> StoreResult<()> {
        let response = self.send(self.client.get(self.url(&[self.database.as_str()])?)).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::unexpected(&self.database, response).await)
        }
    }
}
