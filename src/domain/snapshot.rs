use serde::{Deserialize, Serialize};

use super::ContentItem;

/// Persisted prefix of a feed with an absolute expiry (epoch ms)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSnapshot {
    pub items: Vec<ContentItem>,
    pub expires_at_ms: i64,
}

impl CachedSnapshot {
    pub fn new(items: Vec<ContentItem>, expires_at_ms: i64) -> Self {
        Self {
            items,
            expires_at_ms,
        }
    }

    pub fn is_fresh(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at_ms
    }
}
