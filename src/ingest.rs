//! Ingestion orchestrator
//!
//! One `sync` is one unit of work: fetch → normalize → atomic replace of the
//! version's subtree. Resyncs of the same version string are serialized;
//! different versions proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::Result;
use crate::fetch::DocumentFetcher;
use crate::normalize::{NormalizedBatch, normalize};
use crate::storage::SqliteStore;

/// Outcome of a successful sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub version: String,
    pub title: String,
    pub endpoint_count: usize,
    pub schema_count: usize,
}

impl std::fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} v{}: {} endpoints, {} schemas",
            self.title, self.version, self.endpoint_count, self.schema_count
        )
    }
}

/// Per-version async locks.
///
/// Holding the guard for a version excludes other writers of that version only.
/// Idle entries are dropped on the next `acquire`, so the map only holds
/// versions that are locked or awaited.
#[derive(Default)]
pub struct VersionLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl VersionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `version`
    pub async fn acquire(&self, version: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            // The map's own reference is the only one left once nobody holds or awaits it
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(version.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

/// Coordinates fetching, normalization and storage
pub struct Ingestor {
    store: Arc<SqliteStore>,
    fetcher: Arc<dyn DocumentFetcher>,
    locks: VersionLocks,
}

impl Ingestor {
    pub fn new(store: Arc<SqliteStore>, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self {
            store,
            fetcher,
            locks: VersionLocks::new(),
        }
    }

    pub fn store(&self) -> &Arc<SqliteStore> {
        &self.store
    }

    /// Fetch the document at `url` and fully replace its version.
    ///
    /// Fails as a whole: fetch, normalize or storage errors leave the
    /// previously stored data of that version untouched.
    pub async fn sync(&self, url: &str, version_override: Option<&str>) -> Result<SyncSummary> {
        tracing::info!("Syncing OpenAPI document from {}", url);

        let document = self.fetcher.fetch(url).await.inspect_err(|e| {
            tracing::error!("{}", e);
        })?;
        self.ingest_document(&document, version_override).await
    }

    /// Normalize and store an already-loaded document
    pub async fn ingest_document(
        &self,
        document: &Value,
        version_override: Option<&str>,
    ) -> Result<SyncSummary> {
        let batch = normalize(document, version_override)?;
        self.store_batch(&batch).await
    }

    async fn store_batch(&self, batch: &NormalizedBatch) -> Result<SyncSummary> {
        let version = &batch.version.version;

        let _guard = self.locks.acquire(version).await;
        tracing::debug!("Acquired resync lock for version {}", version);

        self.store.replace_version(batch)?;

        let summary = SyncSummary {
            version: version.clone(),
            title: batch.version.title.clone(),
            endpoint_count: batch.endpoint_count(),
            schema_count: batch.schema_count(),
        };
        tracing::info!("Synced {}", summary);
        Ok(summary)
    }
}
