pub mod daily_tracker;
pub mod feed_controller;
pub mod interaction_reporter;
pub mod saved_content;
pub mod seen_set;

pub use daily_tracker::{DailyContentTracker, DailyProgress, TrackOutcome};
pub use feed_controller::{FeedController, FeedStatus};
pub use interaction_reporter::InteractionReporter;
pub use saved_content::SavedContentCache;
pub use seen_set::SeenSet;
