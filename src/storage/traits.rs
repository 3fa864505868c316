use async_trait::async_trait;

use crate::domain::ContentItem;
use crate::errors::FeedResult;

/// Durable string key-value storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> FeedResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> FeedResult<()>;
    async fn remove(&self, key: &str) -> FeedResult<()>;
}

/// Best-effort persisted feed snapshot. Never fails: every storage problem
/// degrades to a cache miss.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save(&self, items: &[ContentItem]);
    async fn load(&self) -> Option<Vec<ContentItem>>;
    async fn clear(&self);
}
