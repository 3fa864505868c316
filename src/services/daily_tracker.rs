use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::sources::StreakSource;
use crate::storage::KeyValueStore;

pub const DEFAULT_DAILY_THRESHOLD: usize = 4;

/// Persisted form of one user's day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct DailyRecord {
    date: String,
    content_ids: Vec<String>,
    streak_earned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackOutcome {
    pub threshold_reached: bool,
    /// The streak was credited by this very call
    pub streak_earned: bool,
    /// This call moved the count onto the threshold
    pub is_new_threshold: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyProgress {
    pub current: usize,
    pub threshold: usize,
    pub can_earn_streak: bool,
}

#[derive(Debug, Default)]
struct DailyState {
    date: Option<String>,
    content_ids: BTreeSet<String>,
    streak_earned: bool,
    checking_streak: bool,
}

impl DailyState {
    fn fresh(date: String) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    fn record(&self) -> Option<DailyRecord> {
        self.date.as_ref().map(|date| DailyRecord {
            date: date.clone(),
            content_ids: self.content_ids.iter().cloned().collect(),
            streak_earned: self.streak_earned,
        })
    }
}

/// Counts unique content a user consumes per UTC day and asks the server
/// for the daily streak once the threshold is met.
pub struct DailyContentTracker<K: KeyValueStore, S: StreakSource> {
    user_id: String,
    store: K,
    streaks: Arc<S>,
    clock: Arc<dyn Clock>,
    threshold: usize,
    state: Mutex<DailyState>,
}

impl<K: KeyValueStore, S: StreakSource> DailyContentTracker<K, S> {
    pub fn new(user_id: impl Into<String>, store: K, streaks: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            user_id: user_id.into(),
            store,
            streaks,
            clock,
            threshold: DEFAULT_DAILY_THRESHOLD,
            state: Mutex::new(DailyState::default()),
        }
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold.max(1);
        self
    }

    pub fn storage_key(&self) -> String {
        format!("daily_content_tracking_{}", self.user_id)
    }

    fn state(&self) -> MutexGuard<'_, DailyState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn today(&self) -> String {
        Utc.timestamp_millis_opt(self.clock.now_ms())
            .single()
            .map(|dt| dt.date_naive().to_string())
            .unwrap_or_default()
    }

    async fn persist(&self, record: Option<DailyRecord>) {
        let Some(record) = record else {
            return;
        };
        let result = match serde_json::to_string(&record) {
            Ok(json) => self.store.set(&self.storage_key(), &json).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            warn!(user_id = %self.user_id, error = %e, "Failed to persist daily tracking");
        }
    }

    async fn load_record(&self) -> Option<DailyRecord> {
        let raw = match self.store.get(&self.storage_key()).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(user_id = %self.user_id, error = %e, "Failed to read daily tracking");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(user_id = %self.user_id, error = %e, "Corrupt daily tracking record");
                None
            }
        }
    }

    /// Restore today's progress, or start a fresh day
    pub async fn initialize(&self) {
        let today = self.today();
        let stored = self.load_record().await;

        let restored = match stored {
            Some(record) if record.date == today => {
                debug!(
                    user_id = %self.user_id,
                    consumed = record.content_ids.len(),
                    streak_earned = record.streak_earned,
                    "Restoring today's tracking"
                );
                Some(DailyState {
                    date: Some(record.date),
                    content_ids: record.content_ids.into_iter().collect(),
                    streak_earned: record.streak_earned,
                    checking_streak: false,
                })
            }
            _ => None,
        };

        match restored {
            Some(state) => *self.state() = state,
            None => {
                info!(user_id = %self.user_id, date = %today, "Starting fresh daily tracking");
                let record = {
                    let mut state = self.state();
                    *state = DailyState::fresh(today);
                    state.record()
                };
                self.persist(record).await;
            }
        }
    }

    /// Record one consumed content item
    pub async fn track(&self, content_id: &str) -> TrackOutcome {
        let today = self.today();
        let needs_init = self.state().date.as_deref() != Some(today.as_str());
        if needs_init {
            self.initialize().await;
        }

        let (outcome, should_request, record) = {
            let mut state = self.state();

            if state.streak_earned {
                debug!(content_id, "Streak already earned today");
                return TrackOutcome {
                    threshold_reached: true,
                    streak_earned: false,
                    is_new_threshold: false,
                };
            }

            let before = state.content_ids.len();
            let inserted = state.content_ids.insert(content_id.to_string());
            let current = state.content_ids.len();

            let threshold_reached = current >= self.threshold;
            let is_new_threshold = threshold_reached && before < self.threshold && inserted;
            let should_request = threshold_reached && !state.checking_streak;
            if should_request {
                state.checking_streak = true;
            }

            debug!(content_id, current, threshold = self.threshold, inserted, "Daily content consumed");

            let outcome = TrackOutcome {
                threshold_reached,
                streak_earned: false,
                is_new_threshold,
            };
            (outcome, should_request, state.record())
        };

        self.persist(record).await;

        if !should_request {
            return outcome;
        }

        let streak_earned = self.request_streak().await;
        TrackOutcome {
            streak_earned,
            ..outcome
        }
    }

    async fn request_streak(&self) -> bool {
        let result = self.streaks.update_daily_streak().await;

        let (earned, record) = {
            let mut state = self.state();
            state.checking_streak = false;
            match result {
                Ok(update) if update.success => {
                    info!(
                        user_id = %self.user_id,
                        streak_days = update.streak_days,
                        coins_earned = update.coins_earned,
                        "Daily streak earned"
                    );
                    state.streak_earned = true;
                    (true, state.record())
                }
                Ok(update) => {
                    info!(user_id = %self.user_id, message = %update.message, "Streak not credited");
                    (false, None)
                }
                Err(e) => {
                    warn!(user_id = %self.user_id, error = %e, "Error updating streak");
                    (false, None)
                }
            }
        };

        self.persist(record).await;
        earned
    }

    pub fn progress(&self) -> DailyProgress {
        let state = self.state();
        let current = state.content_ids.len();
        DailyProgress {
            current,
            threshold: self.threshold,
            can_earn_streak: current >= self.threshold && !state.streak_earned,
        }
    }

    pub fn streak_earned(&self) -> bool {
        self.state().streak_earned
    }

    /// Forget today's progress and the stored record
    pub async fn reset(&self) {
        *self.state() = DailyState::default();
        if let Err(e) = self.store.remove(&self.storage_key()).await {
            warn!(user_id = %self.user_id, error = %e, "Failed to remove daily tracking");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::clock::ManualClock;
    use crate::domain::StreakUpdate;
    use crate::errors::FeedError;
    use crate::sources::traits::MockStreakSource;
    use crate::storage::MemoryKeyValueStore;

    // 2024-03-10T12:00:00Z
    const NOON: i64 = 1_710_072_000_000;

    fn credited() -> StreakUpdate {
        StreakUpdate {
            success: true,
            message: "Streak updated".to_string(),
            streak_days: 3,
            previous_streak: 2,
            coins_earned: 10,
            milestone_reached: false,
        }
    }

    fn tracker(
        streaks: MockStreakSource,
    ) -> (
        DailyContentTracker<MemoryKeyValueStore, MockStreakSource>,
        MemoryKeyValueStore,
        Arc<ManualClock>,
    ) {
        let clock = Arc::new(ManualClock::new(NOON));
        let store = MemoryKeyValueStore::new();
        let tracker = DailyContentTracker::new("u1", store.clone(), Arc::new(streaks), clock.clone());
        (tracker, store, clock)
    }

    async fn stored(store: &MemoryKeyValueStore) -> DailyRecord {
        let raw = store.get("daily_content_tracking_u1").await.unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_persists_fresh_day() {
        let (tracker, store, _) = tracker(MockStreakSource::new());
        tracker.initialize().await;

        let record = stored(&store).await;
        assert_eq!(record.date, "2024-03-10");
        assert!(record.content_ids.is_empty());
        assert!(!record.streak_earned);
    }

    #[tokio::test]
    async fn test_threshold_earns_streak_once() {
        let mut streaks = MockStreakSource::new();
        streaks
            .expect_update_daily_streak()
            .times(1)
            .returning(|| Ok(credited()));
        let (tracker, store, _) = tracker(streaks);

        for id in ["a", "b", "c"] {
            let outcome = tracker.track(id).await;
            assert!(!outcome.threshold_reached);
        }

        let outcome = tracker.track("d").await;
        assert_eq!(
            outcome,
            TrackOutcome {
                threshold_reached: true,
                streak_earned: true,
                is_new_threshold: true,
            }
        );
        assert!(stored(&store).await.streak_earned);

        let after = tracker.track("e").await;
        assert_eq!(
            after,
            TrackOutcome {
                threshold_reached: true,
                streak_earned: false,
                is_new_threshold: false,
            }
        );
        assert_eq!(tracker.progress().current, 4);
        assert!(!tracker.progress().can_earn_streak);
    }

    #[tokio::test]
    async fn test_duplicates_do_not_count() {
        let (tracker, _, _) = tracker(MockStreakSource::new());
        tracker.track("a").await;
        tracker.track("a").await;
        tracker.track("b").await;

        assert_eq!(tracker.progress().current, 2);
    }

    #[tokio::test]
    async fn test_restores_todays_record() {
        let (tracker, store, _) = tracker(MockStreakSource::new());
        store
            .set(
                "daily_content_tracking_u1",
                r#"{"date":"2024-03-10","content_ids":["x","y"],"streak_earned":false}"#,
            )
            .await
            .unwrap();

        tracker.initialize().await;
        assert_eq!(tracker.progress().current, 2);
    }

    #[tokio::test]
    async fn test_stale_or_corrupt_record_starts_fresh() {
        let (tracker, store, _) = tracker(MockStreakSource::new());
        store
            .set(
                "daily_content_tracking_u1",
                r#"{"date":"2024-03-09","content_ids":["x"],"streak_earned":true}"#,
            )
            .await
            .unwrap();
        tracker.initialize().await;
        assert_eq!(tracker.progress().current, 0);
        assert!(!tracker.streak_earned());

        store.set("daily_content_tracking_u1", "{oops").await.unwrap();
        tracker.initialize().await;
        assert_eq!(stored(&store).await.date, "2024-03-10");
    }

    #[tokio::test]
    async fn test_day_rollover_resets_progress() {
        let (tracker, _, clock) = tracker(MockStreakSource::new());
        tracker.track("a").await;
        tracker.track("b").await;

        clock.advance(Duration::from_secs(24 * 60 * 60));
        tracker.track("c").await;

        assert_eq!(tracker.progress().current, 1);
    }

    #[tokio::test]
    async fn test_streak_failure_is_retried_on_next_item() {
        let mut streaks = MockStreakSource::new();
        let mut calls = 0;
        streaks.expect_update_daily_streak().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                Err(FeedError::Storage("offline".to_string()))
            } else {
                Ok(credited())
            }
        });
        let (tracker, _, _) = tracker(streaks);
        let tracker = tracker.with_threshold(1);

        let first = tracker.track("a").await;
        assert!(first.threshold_reached);
        assert!(!first.streak_earned);
        assert!(tracker.progress().can_earn_streak);

        let second = tracker.track("b").await;
        assert!(second.streak_earned);
        assert!(!second.is_new_threshold);
    }

    #[tokio::test]
    async fn test_reset_removes_record() {
        let (tracker, store, _) = tracker(MockStreakSource::new());
        tracker.track("a").await;
        tracker.reset().await;

        assert_eq!(tracker.progress().current, 0);
        assert!(store.is_empty());
    }
}
