use crate::error::Result;
use crate::session::{unix_timestamp, SessionData};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

/// Abstract session store backend
///
/// Implementations must be safe under concurrent invocation; two requests
/// racing on the same id resolve as last-write-wins without corrupting the
/// backend. A missing or expired id is `Ok(None)`, never an error — errors
/// are reserved for backend failures, which the session middleware
/// surfaces as a 5xx rather than a silent anonymous session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Get a copy of the stored data if present and unexpired
    async fn read(&self, id: &str) -> Result<Option<SessionData>>;

    /// Upsert the record, resetting its expiry to `now + ttl`
    ///
    /// Stores a defensive copy, never an alias, of `data`.
    async fn write(&self, id: &str, data: &SessionData, ttl: Duration) -> Result<()>;

    /// Idempotent removal; destroying an absent id is not an error
    async fn destroy(&self, id: &str) -> Result<()>;

    /// Check if a session exists and is not expired
    async fn exists(&self, id: &str) -> Result<bool>;

    /// Remove expired entries, returning how many were removed
    async fn cleanup_expired(&self) -> Result<usize>;

    /// Backend name for logging/debugging
    fn backend_name(&self) -> &'static str;

    /// Backend statistics if supported
    async fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats::default())
    }
}

/// Store backend statistics
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub total_sessions: usize,
    pub active_sessions: usize,
    pub expired_sessions: usize,
    pub backend_metrics: HashMap<String, String>,
}

/// Durable record: payload plus absolute expiry
#[derive(Debug, Clone)]
struct StoreEntry {
    data: SessionData,
    expires_at: u64,
}

impl StoreEntry {
    fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

/// In-memory session store backed by DashMap
///
/// Lock-free concurrent access with absolute TTL expiry. Expired entries
/// are treated as absent on read and deleted lazily; a background task can
/// additionally sweep them on an interval. Suited to single-server
/// deployments and tests.
#[derive(Clone)]
pub struct MemorySessionStore {
    entries: Arc<DashMap<String, StoreEntry>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Create a store with a periodic cleanup sweep
    ///
    /// Must be called within a tokio runtime.
    pub fn with_cleanup(cleanup_interval: Duration) -> Self {
        let store = Self::new();
        store.start_cleanup_task(cleanup_interval);
        store
    }

    fn start_cleanup_task(&self, cleanup_interval: Duration) {
        let entries = Arc::clone(&self.entries);

        tokio::spawn(async move {
            let mut interval = interval(cleanup_interval);

            loop {
                interval.tick().await;

                let now = unix_timestamp();
                let expired_ids: Vec<String> = entries
                    .iter()
                    .filter(|entry| entry.value().is_expired(now))
                    .map(|entry| entry.key().clone())
                    .collect();

                let mut cleaned_up = 0;
                for id in expired_ids {
                    if entries.remove(&id).is_some() {
                        cleaned_up += 1;
                    }
                }

                if cleaned_up > 0 {
                    log::info!("Memory store cleaned up {} expired sessions", cleaned_up);
                }
            }
        });
    }

    /// Current number of entries, expired included (for testing)
    #[cfg(test)]
    pub(crate) fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn read(&self, id: &str) -> Result<Option<SessionData>> {
        let now = unix_timestamp();

        if let Some(entry) = self.entries.get(id) {
            if entry.value().is_expired(now) {
                drop(entry);
                // Lazy delete: an expired record is absent
                self.entries.remove(id);
                log::debug!("MemoryStore: session {} expired and removed", id);
                return Ok(None);
            }
            return Ok(Some(entry.value().data.clone()));
        }

        log::debug!("MemoryStore: session {} not found", id);
        Ok(None)
    }

    async fn write(&self, id: &str, data: &SessionData, ttl: Duration) -> Result<()> {
        let entry = StoreEntry {
            data: data.clone(),
            expires_at: unix_timestamp() + ttl.as_secs(),
        };
        self.entries.insert(id.to_string(), entry);
        Ok(())
    }

    async fn destroy(&self, id: &str) -> Result<()> {
        self.entries.remove(id);
        Ok(())
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        match self.entries.get(id) {
            Some(entry) => Ok(!entry.value().is_expired(unix_timestamp())),
            None => Ok(false),
        }
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        let now = unix_timestamp();
        let expired_ids: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();

        let mut cleaned_up = 0;
        for id in expired_ids {
            if self.entries.remove(&id).is_some() {
                cleaned_up += 1;
            }
        }

        Ok(cleaned_up)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn stats(&self) -> Result<StoreStats> {
        let now = unix_timestamp();
        let mut active_sessions = 0;
        let mut expired_sessions = 0;

        for entry in self.entries.iter() {
            if entry.value().is_expired(now) {
                expired_sessions += 1;
            } else {
                active_sessions += 1;
            }
        }

        Ok(StoreStats {
            total_sessions: self.entries.len(),
            active_sessions,
            expired_sessions,
            backend_metrics: HashMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_basic_operations() {
        let store = MemorySessionStore::new();

        assert!(store.read("missing").await.unwrap().is_none());
        assert!(!store.exists("missing").await.unwrap());

        let mut data = SessionData::new();
        if let serde_json::Value::Object(ref mut map) = data.data {
            map.insert("user_id".to_string(), json!(42));
        }

        store
            .write("sid", &data, Duration::from_secs(3600))
            .await
            .unwrap();
        assert!(store.exists("sid").await.unwrap());

        let read = store.read("sid").await.unwrap().unwrap();
        assert_eq!(read.data["user_id"], json!(42));

        store.destroy("sid").await.unwrap();
        assert!(store.read("sid").await.unwrap().is_none());
        // Destroying an absent id is not an error
        store.destroy("sid").await.unwrap();
    }

    #[tokio::test]
    async fn test_write_stores_defensive_copy() {
        let store = MemorySessionStore::new();
        let mut data = SessionData::new();
        store
            .write("sid", &data, Duration::from_secs(60))
            .await
            .unwrap();

        // Mutating the caller's copy must not leak into the store
        if let serde_json::Value::Object(ref mut map) = data.data {
            map.insert("later".to_string(), json!(true));
        }

        let read = store.read("sid").await.unwrap().unwrap();
        assert!(read.data.get("later").is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent_and_lazily_deleted() {
        let store = MemorySessionStore::new();
        store
            .write("sid", &SessionData::new(), Duration::from_secs(0))
            .await
            .unwrap();

        assert!(store.read("sid").await.unwrap().is_none());
        assert_eq!(store.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_write_resets_expiry() {
        let store = MemorySessionStore::new();
        store
            .write("sid", &SessionData::new(), Duration::from_secs(1))
            .await
            .unwrap();
        // Re-write with a longer TTL before expiry
        store
            .write("sid", &SessionData::new(), Duration::from_secs(3600))
            .await
            .unwrap();

        sleep(Duration::from_millis(1100)).await;
        assert!(store.exists("sid").await.unwrap());
    }

    #[tokio::test]
    async fn test_manual_cleanup() {
        let store = MemorySessionStore::new();
        for i in 0..3 {
            store
                .write(&format!("sid_{}", i), &SessionData::new(), Duration::from_secs(0))
                .await
                .unwrap();
        }
        store
            .write("live", &SessionData::new(), Duration::from_secs(3600))
            .await
            .unwrap();

        let cleaned = store.cleanup_expired().await.unwrap();
        assert_eq!(cleaned, 3);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_sessions, 1);
        assert_eq!(stats.active_sessions, 1);
    }

    #[tokio::test]
    async fn test_concurrent_writes_do_not_corrupt() {
        let store = Arc::new(MemorySessionStore::new());
        let mut handles = Vec::new();

        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let mut data = SessionData::new();
                if let serde_json::Value::Object(ref mut map) = data.data {
                    map.insert("writer".to_string(), json!(i));
                }
                store
                    .write("shared", &data, Duration::from_secs(60))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Last write wins; the record stays readable
        let read = store.read("shared").await.unwrap().unwrap();
        assert!(read.data.get("writer").is_some());
    }
}
