use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::FeedConfig;
use crate::domain::{ContentItem, Interaction, InteractionKind, PageQuery};
use crate::errors::{FeedError, FeedResult};
use crate::services::interaction_reporter::InteractionReporter;
use crate::services::seen_set::SeenSet;
use crate::sources::ContentSource;
use crate::storage::SnapshotStore;

/// Coarse lifecycle of a feed session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Empty,
    Loading,
    Populated,
    Exhausted,
    Failed,
}

#[derive(Debug)]
struct FeedState {
    items: Vec<ContentItem>,
    seen: SeenSet,
    offset: usize,
    loading: bool,
    has_more: bool,
    error: Option<String>,
    initialized: bool,
    cache_checked: bool,
    last_request_ms: Option<i64>,
    /// Bumped on every reset; responses from an older generation are dropped.
    generation: u64,
    session: CancellationToken,
}

impl FeedState {
    fn new(generation: u64) -> Self {
        Self {
            items: Vec::new(),
            seen: SeenSet::new(),
            offset: 0,
            loading: false,
            has_more: true,
            error: None,
            initialized: false,
            cache_checked: false,
            last_request_ms: None,
            generation,
            session: CancellationToken::new(),
        }
    }
}

enum WalkOutcome {
    Appended { items: Vec<ContentItem>, offset: usize },
    Exhausted { offset: usize },
    CeilingReached { offset: usize },
}

/// Pages through a remote content stream, deduplicated and snapshot-accelerated.
///
/// All operations take `&self`. At most one `load_more` is in flight: a call
/// made while loading, after exhaustion, or inside the minimum request
/// interval returns without doing anything.
pub struct FeedController<S: ContentSource, P: SnapshotStore> {
    source: Arc<S>,
    snapshots: P,
    reporter: InteractionReporter<S>,
    clock: Arc<dyn Clock>,
    config: FeedConfig,
    topic_id: Option<String>,
    state: Mutex<FeedState>,
}

impl<S: ContentSource, P: SnapshotStore> FeedController<S, P> {
    pub fn new(source: Arc<S>, snapshots: P, clock: Arc<dyn Clock>, config: FeedConfig) -> Self {
        Self {
            reporter: InteractionReporter::new(Arc::clone(&source)),
            source,
            snapshots,
            clock,
            config,
            topic_id: None,
            state: Mutex::new(FeedState::new(0)),
        }
    }

    /// Restrict every page request to one topic. Topic sessions neither read
    /// nor write the snapshot.
    pub fn with_topic(mut self, topic_id: Option<String>) -> Self {
        self.topic_id = topic_id;
        self
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Request the next page
    pub async fn load_more(&self) {
        let now = self.clock.now_ms();

        let (generation, session, try_snapshot) = {
            let mut state = self.state();

            if state.loading {
                debug!("Skipping load: request already in flight");
                return;
            }
            if !state.has_more {
                debug!("Skipping load: feed exhausted");
                return;
            }
            if let Some(last) = state.last_request_ms {
                let elapsed_ms = now - last;
                if elapsed_ms < self.config.min_request_interval.as_millis() as i64 {
                    debug!(elapsed_ms, "Skipping load: too soon since last request");
                    return;
                }
            }

            state.loading = true;
            // The snapshot holds the unfiltered feed only.
            let try_snapshot = self.topic_id.is_none()
                && !state.cache_checked
                && state.offset == 0
                && state.items.is_empty();
            (state.generation, state.session.clone(), try_snapshot)
        };

        if try_snapshot && self.serve_from_snapshot(generation).await {
            return;
        }

        let start_offset = {
            let mut state = self.state();
            if state.generation != generation {
                return;
            }
            state.error = None;
            state.last_request_ms = Some(now);
            state.offset
        };

        info!(
            offset = start_offset,
            limit = self.config.page_size,
            topic = self.topic_id.as_deref().unwrap_or(""),
            "Loading more content"
        );

        let walk = tokio::time::timeout(self.config.watchdog, self.walk_pages(start_offset));
        let result = tokio::select! {
            _ = session.cancelled() => {
                debug!(offset = start_offset, "Fetch abandoned: feed was reset");
                return;
            }
            result = walk => result.unwrap_or_else(|_| {
                Err(FeedError::Timeout(self.config.watchdog.as_millis() as u64))
            }),
        };

        if let Some(prefix) = self.finish_load(generation, result) {
            self.snapshots.save(&prefix).await;
        }
    }

    /// Adopt a fresh snapshot as the whole feed. Returns true when the load
    /// is finished (snapshot adopted, or the session was reset meanwhile).
    async fn serve_from_snapshot(&self, generation: u64) -> bool {
        let cached = self.snapshots.load().await;

        let mut state = self.state();
        if state.generation != generation {
            return true;
        }
        state.cache_checked = true;

        let items = match cached {
            Some(items) if !items.is_empty() => items,
            _ => {
                debug!("No usable snapshot, going to the network");
                return false;
            }
        };

        let items: Vec<ContentItem> = state
            .seen
            .filter_new(items)
            .into_iter()
            .map(ContentItem::resolve_kind)
            .collect();

        state.seen = SeenSet::from_items(&items);
        state.offset = items.len();
        state.items = items;
        state.initialized = true;
        state.loading = false;

        info!(count = state.items.len(), "Served content from snapshot");
        true
    }

    /// Fetch pages from `start_offset` until one yields unseen items, the
    /// source runs dry, or the skip-ahead hits the safety ceiling.
    async fn walk_pages(&self, start_offset: usize) -> FeedResult<WalkOutcome> {
        let limit = self.config.page_size;
        let ceiling = self.config.safety_ceiling();
        let mut offset = start_offset;

        loop {
            let query = PageQuery::new(limit, offset).with_topic(self.topic_id.clone());
            let page = self.source.fetch_page(&query).await?;

            if page.is_empty() {
                return Ok(WalkOutcome::Exhausted { offset });
            }

            let received = page.items.len();
            let fresh = self.state().seen.filter_new(page.items);
            offset += limit;

            if !fresh.is_empty() {
                debug!(received, fresh = fresh.len(), "Page received");
                let items = fresh.into_iter().map(ContentItem::resolve_kind).collect();
                return Ok(WalkOutcome::Appended { items, offset });
            }

            debug!(received, next_offset = offset, "All items were duplicates, trying next page");
            if offset >= ceiling {
                return Ok(WalkOutcome::CeilingReached { offset });
            }
        }
    }

    /// Apply a finished walk. Returns the snapshot prefix to persist when the
    /// feed just went from empty to non-empty.
    fn finish_load(
        &self,
        generation: u64,
        result: FeedResult<WalkOutcome>,
    ) -> Option<Vec<ContentItem>> {
        let mut state = self.state();
        if state.generation != generation {
            debug!("Discarding response from a superseded session");
            return None;
        }
        state.loading = false;

        match result {
            Ok(WalkOutcome::Appended { items, offset }) => {
                let was_empty = state.items.is_empty();
                for item in &items {
                    state.seen.insert(&item.id);
                }
                let before = state.items.len();
                state.items.extend(items);
                state.offset = offset;
                state.initialized = true;

                info!(before, after = state.items.len(), offset, "Content updated");

                if was_empty && !state.items.is_empty() && self.topic_id.is_none() {
                    let end = state.items.len().min(self.config.snapshot_limit);
                    return Some(state.items[..end].to_vec());
                }
                None
            }
            Ok(WalkOutcome::Exhausted { offset }) => {
                info!(offset, total = state.items.len(), "No more content available");
                state.offset = offset;
                state.has_more = false;
                None
            }
            Ok(WalkOutcome::CeilingReached { offset }) => {
                warn!(offset, "Stopped skipping duplicate pages at safety ceiling");
                state.offset = offset;
                state.has_more = false;
                None
            }
            Err(e) => {
                warn!(offset = state.offset, error = %e, "Error loading content");
                state.error = Some(e.to_string());
                None
            }
        }
    }

    /// Drop the whole session: feed, seen ids, paging, flags and the
    /// persisted snapshot. Any in-flight fetch is cancelled and its result
    /// discarded.
    pub async fn reset_content(&self) {
        {
            let mut state = self.state();
            state.session.cancel();
            let generation = state.generation + 1;
            *state = FeedState::new(generation);
        }
        info!("Resetting content system");
        self.snapshots.clear().await;
    }

    /// Reset (which also clears the snapshot) and load the first page from
    /// the network.
    pub async fn refresh_content(&self) {
        self.reset_content().await;
        {
            // The snapshot was just cleared, skip the lookup.
            self.state().cache_checked = true;
        }
        self.load_more().await;
    }

    pub async fn track_interaction(&self, content_id: &str, kind: InteractionKind, value: i64) {
        self.reporter
            .report(Interaction::new(content_id, kind).with_value(value))
            .await;
    }

    pub fn items(&self) -> Vec<ContentItem> {
        self.state().items.clone()
    }

    pub fn len(&self) -> usize {
        self.state().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn has_more(&self) -> bool {
        self.state().has_more
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.state().initialized
    }

    pub fn seen_count(&self) -> usize {
        self.state().seen.len()
    }

    pub fn offset(&self) -> usize {
        self.state().offset
    }

    pub fn status(&self) -> FeedStatus {
        let state = self.state();
        if state.loading {
            FeedStatus::Loading
        } else if state.error.is_some() {
            FeedStatus::Failed
        } else if !state.has_more {
            FeedStatus::Exhausted
        } else if state.items.is_empty() {
            FeedStatus::Empty
        } else {
            FeedStatus::Populated
        }
    }
}
