use async_trait::async_trait;
use facts_api::ApiClient;
use tracing::debug;

use crate::config::Config;
use crate::domain::{
    ContentItem, ContentPage, Interaction, PageQuery, SavedContentRecord, StreakUpdate,
};
use crate::errors::FeedResult;
use crate::sources::traits::{ContentSource, SavedContentSource, StreakSource};

/// Content source backed by the daily-facts HTTP API
pub struct ApiContentSource {
    client: ApiClient,
}

impl ApiContentSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &Config) -> FeedResult<Self> {
        let client = ApiClient::new(&config.api_url, config.api_token.as_deref())?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl ContentSource for ApiContentSource {
    async fn fetch_page(&self, query: &PageQuery) -> FeedResult<ContentPage> {
        debug!(
            limit = query.limit,
            offset = query.offset,
            topic = query.topic_id.as_deref().unwrap_or(""),
            "GET contents"
        );

        let page = self
            .client
            .get_contents::<ContentItem>(query.limit, query.offset, query.topic_id.as_deref())
            .await?;

        Ok(ContentPage {
            count: page.count,
            items: page.data,
        })
    }

    async fn record_interaction(&self, interaction: &Interaction) -> FeedResult<()> {
        self.client
            .record_interaction(
                &interaction.content_id,
                interaction.kind.as_str(),
                interaction.value,
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SavedContentSource for ApiContentSource {
    async fn list_saved(&self) -> FeedResult<Vec<SavedContentRecord>> {
        Ok(self.client.get_saved_content::<SavedContentRecord>().await?)
    }

    async fn save_content(&self, content_id: &str) -> FeedResult<String> {
        let record = self.client.save_content(content_id).await?;
        Ok(record.id)
    }

    async fn remove_saved_content(&self, saved_id: &str) -> FeedResult<()> {
        self.client.remove_saved_content(saved_id).await?;
        Ok(())
    }
}

#[async_trait]
impl StreakSource for ApiContentSource {
    async fn update_daily_streak(&self) -> FeedResult<StreakUpdate> {
        Ok(self.client.update_daily_streak::<StreakUpdate>().await?)
    }
}
