use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::errors::{FeedError, FeedResult};
use crate::sources::SavedContentSource;

pub const DEFAULT_REFRESH_COOLDOWN: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct SavedState {
    /// content id -> saved record id
    saved: HashMap<String, String>,
    last_refresh_ms: Option<i64>,
    loading: bool,
}

/// Client-side view of which content the user has saved.
pub struct SavedContentCache<S: SavedContentSource> {
    source: Arc<S>,
    clock: Arc<dyn Clock>,
    cooldown: Duration,
    state: Mutex<SavedState>,
}

impl<S: SavedContentSource> SavedContentCache<S> {
    pub fn new(source: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            cooldown: DEFAULT_REFRESH_COOLDOWN,
            state: Mutex::new(SavedState::default()),
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    fn state(&self) -> MutexGuard<'_, SavedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Rebuild the map from the server. Skipped inside the cooldown or while
    /// another refresh runs; failures keep the previous map.
    pub async fn refresh(&self) {
        let now = self.clock.now_ms();
        {
            let mut state = self.state();
            if state.loading {
                return;
            }
            if let Some(last) = state.last_refresh_ms {
                if now - last < self.cooldown.as_millis() as i64 {
                    debug!("Skipping saved content refresh: too soon since last refresh");
                    return;
                }
            }
            state.loading = true;
            state.last_refresh_ms = Some(now);
        }

        let result = self.source.list_saved().await;

        let mut state = self.state();
        state.loading = false;
        match result {
            Ok(records) => {
                let mut saved = HashMap::with_capacity(records.len());
                for record in &records {
                    match (record.content_id(), record.saved_id()) {
                        (Some(content_id), Some(saved_id)) => {
                            saved.insert(content_id.to_string(), saved_id.to_string());
                        }
                        _ => debug!(?record, "Saved record without content or saved id"),
                    }
                }
                info!(count = saved.len(), "Saved content cache refreshed");
                state.saved = saved;
            }
            Err(e) => warn!(error = %e, "Error fetching saved content"),
        }
    }

    pub fn is_saved(&self, content_id: &str) -> bool {
        self.state().saved.contains_key(content_id)
    }

    pub fn saved_id(&self, content_id: &str) -> Option<String> {
        self.state().saved.get(content_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state().saved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Saved content ids, sorted
    pub fn content_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.state().saved.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn mark_saved(&self, content_id: &str, saved_id: &str) {
        self.state()
            .saved
            .insert(content_id.to_string(), saved_id.to_string());
    }

    pub fn mark_removed(&self, content_id: &str) {
        self.state().saved.remove(content_id);
    }

    /// Forget everything, e.g. on sign-out
    pub fn clear(&self) {
        let mut state = self.state();
        state.saved.clear();
        state.last_refresh_ms = None;
    }

    /// Save on the server and remember the saved id
    pub async fn save(&self, content_id: &str) -> FeedResult<String> {
        if let Some(saved_id) = self.saved_id(content_id) {
            return Ok(saved_id);
        }

        let saved_id = self.source.save_content(content_id).await?;
        self.mark_saved(content_id, &saved_id);
        info!(content_id, saved_id = %saved_id, "Content saved");
        Ok(saved_id)
    }

    /// Remove from the server and forget it
    pub async fn remove(&self, content_id: &str) -> FeedResult<()> {
        let saved_id = self
            .saved_id(content_id)
            .ok_or_else(|| FeedError::InvalidInput(format!("Content {} is not saved", content_id)))?;

        self.source.remove_saved_content(&saved_id).await?;
        self.mark_removed(content_id);
        info!(content_id, "Saved content removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::domain::{ContentRef, SavedContentRecord};
    use crate::sources::traits::MockSavedContentSource;

    fn records() -> Vec<SavedContentRecord> {
        vec![
            SavedContentRecord::new("s1", "c1"),
            SavedContentRecord {
                id: Some("s2".to_string()),
                content: Some(ContentRef {
                    id: "c2".to_string(),
                }),
                content_id: None,
                contents: None,
            },
            SavedContentRecord {
                id: None,
                content: None,
                content_id: Some("orphan".to_string()),
                contents: None,
            },
        ]
    }

    fn cache(source: MockSavedContentSource) -> (SavedContentCache<MockSavedContentSource>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(10_000));
        (SavedContentCache::new(Arc::new(source), clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_refresh_builds_map() {
        let mut source = MockSavedContentSource::new();
        source.expect_list_saved().times(1).returning(|| Ok(records()));
        let (cache, _) = cache(source);

        cache.refresh().await;

        assert!(cache.is_saved("c1"));
        assert_eq!(cache.saved_id("c2"), Some("s2".to_string()));
        assert!(!cache.is_saved("orphan"));
        assert_eq!(cache.content_ids(), vec!["c1", "c2"]);
    }

    #[tokio::test]
    async fn test_refresh_respects_cooldown() {
        let mut source = MockSavedContentSource::new();
        source.expect_list_saved().times(2).returning(|| Ok(records()));
        let (cache, clock) = cache(source);

        cache.refresh().await;
        clock.advance(Duration::from_secs(4));
        cache.refresh().await;
        clock.advance(Duration::from_secs(1));
        cache.refresh().await;
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_previous_map() {
        let mut source = MockSavedContentSource::new();
        let mut calls = 0;
        source.expect_list_saved().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                Ok(records())
            } else {
                Err(FeedError::Storage("offline".to_string()))
            }
        });
        let (cache, clock) = cache(source);

        cache.refresh().await;
        clock.advance(Duration::from_secs(10));
        cache.refresh().await;

        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_save_records_id_and_skips_known() {
        let mut source = MockSavedContentSource::new();
        source
            .expect_save_content()
            .withf(|id| id == "c9")
            .times(1)
            .returning(|_| Ok("s9".to_string()));
        let (cache, _) = cache(source);

        assert_eq!(cache.save("c9").await.unwrap(), "s9");
        assert_eq!(cache.save("c9").await.unwrap(), "s9");
        assert!(cache.is_saved("c9"));
    }

    #[tokio::test]
    async fn test_remove_uses_saved_id() {
        let mut source = MockSavedContentSource::new();
        source
            .expect_remove_saved_content()
            .withf(|id| id == "s1")
            .times(1)
            .returning(|_| Ok(()));
        let (cache, _) = cache(source);
        cache.mark_saved("c1", "s1");

        cache.remove("c1").await.unwrap();
        assert!(!cache.is_saved("c1"));
    }

    #[tokio::test]
    async fn test_remove_unknown_content_is_invalid_input() {
        let (cache, _) = cache(MockSavedContentSource::new());
        let result = cache.remove("nope").await;
        assert!(matches!(result, Err(FeedError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_clear_forgets_everything() {
        let (cache, _) = cache(MockSavedContentSource::new());
        cache.mark_saved("c1", "s1");
        cache.clear();
        assert!(cache.is_empty());
    }
}
