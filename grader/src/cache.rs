//! # Grade Cache Module
//!
//! Content-addressed, durable store of prior grading results. The full map is
//! loaded into memory at startup; `put` updates memory immediately and schedules a
//! best-effort asynchronous write of the whole map through the [`CacheStore`] seam.
//! Persistence failures are logged and swallowed: a crash between the in-memory
//! update and the durable flush loses at most that entry, and the next call simply
//! recomputes it. A read failure at load time is treated as an empty cache.
//!
//! Entries are immutable once written; there is no update path.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::GraderError;
use crate::types::GradeResult;

/// Durable backing store for the grade cache.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Load every persisted entry. A missing store is an empty map, not an error.
    async fn load_all(&self) -> Result<HashMap<String, GradeResult>, GraderError>;

    /// Persist a snapshot of the whole map.
    async fn persist(&self, entries: &HashMap<String, GradeResult>) -> Result<(), GraderError>;
}

/// [`CacheStore`] writing the map as pretty-printed JSON to a single file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the configured grade cache path.
    pub fn from_config() -> Self {
        Self::new(util::config::grade_cache_path())
    }
}

#[async_trait]
impl CacheStore for JsonFileStore {
    async fn load_all(&self) -> Result<HashMap<String, GradeResult>, GraderError> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("Grade cache not found, will be created on first use.");
                return Ok(HashMap::new());
            }
            Err(e) => {
                return Err(GraderError::CacheStore(format!(
                    "Failed to read grade cache {:?}: {e}",
                    self.path
                )));
            }
        };
        serde_json::from_str(&data).map_err(|e| {
            GraderError::CacheStore(format!("Invalid grade cache JSON in {:?}: {e}", self.path))
        })
    }

    async fn persist(&self, entries: &HashMap<String, GradeResult>) -> Result<(), GraderError> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| GraderError::CacheStore(format!("Failed to encode grade cache: {e}")))?;
        tokio::fs::write(&self.path, json).await.map_err(|e| {
            GraderError::CacheStore(format!(
                "Failed to write grade cache {:?}: {e}",
                self.path
            ))
        })
    }
}

/// In-memory grade cache backed by a durable [`CacheStore`].
pub struct GradeCache {
    entries: RwLock<HashMap<String, GradeResult>>,
    store: Arc<dyn CacheStore>,
}

impl GradeCache {
    /// Load the cache from its store. A load failure is logged and produces an
    /// empty cache, never an error: grading must proceed without it.
    pub async fn load(store: Arc<dyn CacheStore>) -> Self {
        let entries = match store.load_all().await {
            Ok(map) => {
                tracing::info!("Grade cache loaded ({} entries).", map.len());
                map
            }
            Err(e) => {
                tracing::error!("Error loading grade cache: {e}");
                HashMap::new()
            }
        };
        Self {
            entries: RwLock::new(entries),
            store,
        }
    }

    /// Look up a prior result by content hash.
    pub async fn get(&self, content_hash: &str) -> Option<GradeResult> {
        self.entries.read().await.get(content_hash).cloned()
    }

    /// Insert a result and schedule an asynchronous durable write.
    ///
    /// Fire-and-forget: persistence errors are logged, never returned. A hash that
    /// is already present keeps its original entry.
    pub async fn put(&self, content_hash: String, result: GradeResult) {
        let snapshot = {
            let mut entries = self.entries.write().await;
            entries.entry(content_hash).or_insert(result);
            entries.clone()
        };
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.persist(&snapshot).await {
                tracing::error!("Error saving grade cache: {e}");
            }
        });
    }

    /// Number of cached results.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
