use async_trait::async_trait;

use crate::domain::{ContentPage, Interaction, PageQuery, SavedContentRecord, StreakUpdate};
use crate::errors::FeedResult;

/// Remote, paginated stream of content items.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch up to `query.limit` items starting at `query.offset`
    async fn fetch_page(&self, query: &PageQuery) -> FeedResult<ContentPage>;

    /// Report a user interaction with a content item
    async fn record_interaction(&self, interaction: &Interaction) -> FeedResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SavedContentSource: Send + Sync {
    async fn list_saved(&self) -> FeedResult<Vec<SavedContentRecord>>;

    /// Save a content item, returning the saved record id
    async fn save_content(&self, content_id: &str) -> FeedResult<String>;

    async fn remove_saved_content(&self, saved_id: &str) -> FeedResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreakSource: Send + Sync {
    async fn update_daily_streak(&self) -> FeedResult<StreakUpdate>;
}
