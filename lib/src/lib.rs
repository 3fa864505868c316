//! Daily-facts content API bindings for Rust
//! Provides functions to page through contents, record interactions, manage
//! saved content and update the daily streak

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Invalid header value")]
    InvalidHeader,
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("API Error: {status} {message}")]
    Status { status: u16, message: String },
}

/// One page of the contents listing
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Deserialize)]
struct DataWrapper<T> {
    data: T,
}

/// Record created by a save request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedRecord {
    pub id: String,
    #[serde(default)]
    pub content_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct InteractionPayload<'a> {
    content_id: &'a str,
    interaction_type: &'a str,
    interaction_value: i64,
}

#[derive(Debug, Serialize)]
struct SavePayload<'a> {
    content_id: &'a str,
}

pub struct ApiClient {
    url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(url: &str, token: Option<&str>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|_| ApiError::InvalidHeader)?,
            );
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.url
    }

    /// Build the contents listing URL for a page
    pub fn contents_url(&self, limit: usize, offset: usize, topic_id: Option<&str>) -> String {
        let mut url = format!("{}/api/contents?limit={}&offset={}", self.url, limit, offset);
        if let Some(topic) = topic_id {
            url.push_str("&topic_id=");
            url.push_str(&encode_query_value(topic));
        }
        url
    }

    /// Fetch one page of contents, optionally filtered by topic
    pub async fn get_contents<T: DeserializeOwned>(
        &self,
        limit: usize,
        offset: usize,
        topic_id: Option<&str>,
    ) -> Result<Page<T>, ApiError> {
        let url = self.contents_url(limit, offset, topic_id);
        let response = check_status(self.client.get(&url).send().await?).await?;
        Ok(response.json().await?)
    }

    /// Record a user interaction with a content item
    pub async fn record_interaction(
        &self,
        content_id: &str,
        interaction_type: &str,
        interaction_value: i64,
    ) -> Result<(), ApiError> {
        let payload = InteractionPayload {
            content_id,
            interaction_type,
            interaction_value,
        };

        check_status(
            self.client
                .post(format!("{}/api/interactions", self.url))
                .json(&payload)
                .send()
                .await?,
        )
        .await?;

        Ok(())
    }

    /// List the user's saved content records
    pub async fn get_saved_content<T: DeserializeOwned>(&self) -> Result<Vec<T>, ApiError> {
        let response = check_status(
            self.client
                .get(format!("{}/api/saved", self.url))
                .send()
                .await?,
        )
        .await?;

        let wrapper: DataWrapper<Vec<T>> = response.json().await?;
        Ok(wrapper.data)
    }

    /// Save a content item for the user
    pub async fn save_content(&self, content_id: &str) -> Result<SavedRecord, ApiError> {
        let response = check_status(
            self.client
                .post(format!("{}/api/saved", self.url))
                .json(&SavePayload { content_id })
                .send()
                .await?,
        )
        .await?;

        let wrapper: DataWrapper<SavedRecord> = response.json().await?;
        Ok(wrapper.data)
    }

    /// Remove a saved content record by its saved id
    pub async fn remove_saved_content(&self, saved_id: &str) -> Result<(), ApiError> {
        check_status(
            self.client
                .delete(format!("{}/api/saved/{}", self.url, saved_id))
                .send()
                .await?,
        )
        .await?;

        Ok(())
    }

    /// Ask the server to credit today's streak
    pub async fn update_daily_streak<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let response = check_status(
            self.client
                .post(format!("{}/api/user/streak/update", self.url))
                .send()
                .await?,
        )
        .await?;

        Ok(response.json().await?)
    }
}

/// Map non-success statuses to `ApiError`, keeping the response body as the message
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(status_error(status, message))
}

fn status_error(status: StatusCode, message: String) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::CONFLICT => ApiError::Conflict(message),
        other => ApiError::Status {
            status: other.as_u16(),
            message,
        },
    }
}

/// Percent-encode a single query value (RFC 3986 unreserved characters pass through)
fn encode_query_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

/// Create a new API client
pub fn create_client(url: &str, token: Option<&str>) -> Result<ApiClient, ApiError> {
    ApiClient::new(url, token)
}
