use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::errors::{FeedError, FeedResult};

/// Tuning constants for the feed controller and its collaborators
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Items requested per page
    pub page_size: usize,
    /// Minimum time between two network-backed `load_more` attempts
    pub min_request_interval: Duration,
    /// Soft timeout that releases the loading lock
    pub watchdog: Duration,
    /// How many leading items are written to the snapshot
    pub snapshot_limit: usize,
    pub snapshot_ttl: Duration,
    /// Skip-ahead over all-duplicate pages stops at `max_pages * page_size`
    pub max_pages: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 5,
            min_request_interval: Duration::from_millis(500),
            watchdog: Duration::from_secs(15),
            snapshot_limit: 10,
            snapshot_ttl: Duration::from_secs(5 * 60),
            max_pages: 100,
        }
    }
}

impl FeedConfig {
    pub fn safety_ceiling(&self) -> usize {
        self.max_pages.saturating_mul(self.page_size)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_token: Option<String>,
    pub db_path: String,
    pub log_level: String,
    pub daily_threshold: usize,
    pub feed: FeedConfig,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<std::path::PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> FeedResult<Self> {
        let exe_dir = Self::exe_dir();

        // Try to load .env from executable's directory first
        if let Some(ref dir) = exe_dir {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        let api_url = std::env::var("FACTFEED_API_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());
        Url::parse(&api_url).map_err(|e| FeedError::InvalidUrl(format!("{}: {}", api_url, e)))?;

        let api_token = std::env::var("FACTFEED_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        // Default db_path is relative to executable directory
        let db_path = std::env::var("FACTFEED_DB_PATH").unwrap_or_else(|_| {
            exe_dir
                .map(|d| d.join("factfeed.db").to_string_lossy().into_owned())
                .unwrap_or_else(|| "./factfeed.db".to_string())
        });

        let log_level = std::env::var("FACTFEED_LOG").unwrap_or_else(|_| "info".to_string());

        let defaults = FeedConfig::default();
        let feed = FeedConfig {
            page_size: env_number("FACTFEED_PAGE_SIZE")?.unwrap_or(defaults.page_size),
            min_request_interval: env_number("FACTFEED_MIN_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.min_request_interval),
            watchdog: env_number("FACTFEED_WATCHDOG_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.watchdog),
            snapshot_limit: env_number("FACTFEED_SNAPSHOT_LIMIT")?
                .unwrap_or(defaults.snapshot_limit),
            snapshot_ttl: env_number("FACTFEED_CACHE_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.snapshot_ttl),
            max_pages: defaults.max_pages,
        };

        if feed.page_size == 0 {
            return Err(FeedError::Config(
                "FACTFEED_PAGE_SIZE must be greater than zero".to_string(),
            ));
        }

        let daily_threshold = env_number("FACTFEED_DAILY_THRESHOLD")?.unwrap_or(4);

        Ok(Self {
            api_url,
            api_token,
            db_path,
            log_level,
            daily_threshold,
            feed,
        })
    }
}

fn env_number<T: FromStr>(name: &str) -> FeedResult<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => parse_number(name, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_number<T: FromStr>(name: &str, raw: &str) -> FeedResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| FeedError::Config(format!("{} must be a number, got '{}'", name, raw)))
}
