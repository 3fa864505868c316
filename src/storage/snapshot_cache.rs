use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::domain::{CachedSnapshot, ContentItem};
use crate::errors::FeedResult;
use crate::storage::traits::{KeyValueStore, SnapshotStore};

pub const CACHED_CONTENT_KEY: &str = "cached_content";
pub const CACHE_EXPIRY_KEY: &str = "cache_expiry";

/// Feed snapshot kept in a key-value store as two entries: the JSON item
/// array and its expiry in epoch milliseconds.
pub struct LocalSnapshotCache<K: KeyValueStore> {
    store: K,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl<K: KeyValueStore> LocalSnapshotCache<K> {
    pub fn new(store: K, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    async fn write(&self, items: &[ContentItem]) -> FeedResult<i64> {
        let expires_at_ms = self.clock.now_ms() + self.ttl.as_millis() as i64;
        let json = serde_json::to_string(items)?;

        self.store.set(CACHED_CONTENT_KEY, &json).await?;
        self.store
            .set(CACHE_EXPIRY_KEY, &expires_at_ms.to_string())
            .await?;

        Ok(expires_at_ms)
    }

    async fn read(&self) -> FeedResult<Option<CachedSnapshot>> {
        let Some(expiry) = self.store.get(CACHE_EXPIRY_KEY).await? else {
            return Ok(None);
        };
        let Some(json) = self.store.get(CACHED_CONTENT_KEY).await? else {
            return Ok(None);
        };

        let expires_at_ms: i64 = match expiry.trim().parse() {
            Ok(ms) => ms,
            Err(_) => {
                warn!(value = %expiry, "Unparseable snapshot expiry, ignoring snapshot");
                return Ok(None);
            }
        };
        let items: Vec<ContentItem> = serde_json::from_str(&json)?;

        Ok(Some(CachedSnapshot::new(items, expires_at_ms)))
    }

    async fn remove(&self) -> FeedResult<()> {
        self.store.remove(CACHED_CONTENT_KEY).await?;
        self.store.remove(CACHE_EXPIRY_KEY).await
    }
}

#[async_trait]
impl<K: KeyValueStore> SnapshotStore for LocalSnapshotCache<K> {
    async fn save(&self, items: &[ContentItem]) {
        match self.write(items).await {
            Ok(expires_at_ms) => debug!(count = items.len(), expires_at_ms, "Snapshot saved"),
            Err(e) => warn!(error = %e, "Failed to save feed snapshot"),
        }
    }

    async fn load(&self) -> Option<Vec<ContentItem>> {
        match self.read().await {
            Ok(Some(snapshot)) => {
                let now = self.clock.now_ms();
                if snapshot.is_fresh(now) {
                    debug!(count = snapshot.items.len(), "Snapshot hit");
                    Some(snapshot.items)
                } else {
                    debug!(expires_at_ms = snapshot.expires_at_ms, now, "Snapshot expired");
                    None
                }
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read feed snapshot, treating as miss");
                None
            }
        }
    }

    async fn clear(&self) {
        if let Err(e) = self.remove().await {
            warn!(error = %e, "Failed to clear feed snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::errors::FeedError;
    use crate::storage::memory::MemoryKeyValueStore;
    use crate::storage::traits::MockKeyValueStore;

    const TTL: Duration = Duration::from_secs(300);

    fn items(ids: &[&str]) -> Vec<ContentItem> {
        ids.iter()
            .map(|id| ContentItem::new(*id, format!("Fact {}", id)))
            .collect()
    }

    fn setup() -> (
        Arc<ManualClock>,
        MemoryKeyValueStore,
        LocalSnapshotCache<MemoryKeyValueStore>,
    ) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let store = MemoryKeyValueStore::new();
        let cache = LocalSnapshotCache::new(store.clone(), clock.clone(), TTL);
        (clock, store, cache)
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let (_, _, cache) = setup();
        cache.save(&items(&["i1", "i2", "i3"])).await;

        let loaded = cache.load().await.unwrap();
        let ids: Vec<&str> = loaded.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["i1", "i2", "i3"]);
    }

    #[tokio::test]
    async fn test_load_after_expiry_is_absent() {
        let (clock, _, cache) = setup();
        cache.save(&items(&["i1"])).await;

        clock.advance(TTL - Duration::from_millis(1));
        assert!(cache.load().await.is_some());

        clock.advance(Duration::from_millis(1));
        assert!(cache.load().await.is_none());
    }

    #[tokio::test]
    async fn test_writes_expected_keys() {
        let (_, store, cache) = setup();
        cache.save(&items(&["i1"])).await;

        let expiry = store.get(CACHE_EXPIRY_KEY).await.unwrap().unwrap();
        assert_eq!(expiry, (1_000_000 + 300_000).to_string());
        assert!(store.get(CACHED_CONTENT_KEY).await.unwrap().unwrap().starts_with('['));
    }

    #[tokio::test]
    async fn test_corrupt_content_is_miss() {
        let (_, store, cache) = setup();
        store.set(CACHED_CONTENT_KEY, "{not json").await.unwrap();
        store.set(CACHE_EXPIRY_KEY, "9999999999999").await.unwrap();

        assert!(cache.load().await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_expiry_is_miss() {
        let (_, store, cache) = setup();
        store.set(CACHED_CONTENT_KEY, "[]").await.unwrap();
        store.set(CACHE_EXPIRY_KEY, "tomorrow").await.unwrap();

        assert!(cache.load().await.is_none());
    }

    #[tokio::test]
    async fn test_missing_content_key_is_miss() {
        let (_, store, cache) = setup();
        store.set(CACHE_EXPIRY_KEY, "9999999999999").await.unwrap();

        assert!(cache.load().await.is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_snapshot() {
        let (_, store, cache) = setup();
        cache.save(&items(&["i1"])).await;
        cache.clear().await;

        assert!(cache.load().await.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_store_errors_degrade_to_miss() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .returning(|_| Err(FeedError::Storage("disk unavailable".to_string())));
        store
            .expect_set()
            .returning(|_, _| Err(FeedError::Storage("disk unavailable".to_string())));
        store
            .expect_remove()
            .returning(|_| Err(FeedError::Storage("disk unavailable".to_string())));

        let cache = LocalSnapshotCache::new(store, Arc::new(ManualClock::new(0)), TTL);

        cache.save(&items(&["i1"])).await;
        assert!(cache.load().await.is_none());
        cache.clear().await;
    }
}
