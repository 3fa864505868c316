use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use factfeed::cli::{Cli, Commands};
use factfeed::clock::{Clock, SystemClock};
use factfeed::config::Config;
use factfeed::domain::{ContentItem, Interaction, InteractionKind};
use factfeed::errors::FeedResult;
use factfeed::logging::init_logging;
use factfeed::services::{
    DailyContentTracker, FeedController, FeedStatus, InteractionReporter, SavedContentCache,
};
use factfeed::sources::ApiContentSource;
use factfeed::storage::{LocalSnapshotCache, SnapshotStore, SqliteKeyValueStore, SqliteStorage};

type Snapshots = LocalSnapshotCache<SqliteKeyValueStore>;
type Controller = FeedController<ApiContentSource, Snapshots>;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env().context("Invalid configuration")?;
    init_logging(&config.log_level);

    // Initialize storage
    let storage = SqliteStorage::new(&config.db_path)
        .with_context(|| format!("Failed to open database at {}", config.db_path))?;
    let kv_store = SqliteKeyValueStore::new(storage);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let snapshots = LocalSnapshotCache::new(
        kv_store.clone(),
        Arc::clone(&clock),
        config.feed.snapshot_ttl,
    );

    let source = Arc::new(
        ApiContentSource::from_config(&config).context("Failed to create API client")?,
    );
    let controller = |snapshots: Snapshots| -> Controller {
        FeedController::new(
            Arc::clone(&source),
            snapshots,
            Arc::clone(&clock),
            config.feed.clone(),
        )
    };

    let saved_cache = || SavedContentCache::new(Arc::clone(&source), Arc::clone(&clock));

    match cli.command {
        Commands::Browse { pages, topic } => {
            cmd_browse(controller(snapshots).with_topic(topic), pages, &config).await
        }
        Commands::Refresh => cmd_refresh(controller(snapshots)).await,
        Commands::ClearCache => cmd_clear_cache(snapshots).await,
        Commands::Track {
            content_id,
            kind,
            value,
        } => cmd_track(Arc::clone(&source), &content_id, kind, value).await,
        Commands::Saved => cmd_saved(saved_cache()).await,
        Commands::Save { content_id } => cmd_save(saved_cache(), &content_id).await,
        Commands::Unsave { content_id } => cmd_unsave(saved_cache(), &content_id).await,
        Commands::Progress { user, consume } => {
            let tracker =
                DailyContentTracker::new(user, kv_store, Arc::clone(&source), Arc::clone(&clock))
                    .with_threshold(config.daily_threshold);
            cmd_progress(tracker, consume.as_deref()).await
        }
    }?;

    Ok(())
}

fn print_items(items: &[ContentItem]) {
    for (i, item) in items.iter().enumerate() {
        println!("  {}. [{}] {}", i + 1, item.kind(), item.title);
        if !item.summary.is_empty() {
            println!("     {}", item.summary);
        }
        if let Some(media) = item.primary_media() {
            println!("     Media: {}", media);
        }
    }
}

fn print_summary(controller: &Controller) {
    let status = match controller.status() {
        FeedStatus::Empty => "empty",
        FeedStatus::Loading => "loading",
        FeedStatus::Populated => "more available",
        FeedStatus::Exhausted => "end of feed",
        FeedStatus::Failed => "failed",
    };
    println!();
    println!("{} items loaded ({})", controller.len(), status);

    if let Some(error) = controller.error() {
        println!("Last error: {}", error);
    }
}

async fn cmd_browse(controller: Controller, pages: usize, config: &Config) -> FeedResult<()> {
    println!("Loading feed...\n");

    for page in 0..pages.max(1) {
        if page > 0 {
            if !controller.has_more() || controller.error().is_some() {
                break;
            }
            // Stay outside the request interval, otherwise the call is a no-op.
            tokio::time::sleep(config.feed.min_request_interval).await;
        }
        controller.load_more().await;
    }

    let items = controller.items();
    if items.is_empty() {
        println!("No content available.");
    } else {
        print_items(&items);
    }
    print_summary(&controller);

    Ok(())
}

async fn cmd_refresh(controller: Controller) -> FeedResult<()> {
    println!("Refreshing feed...\n");

    controller.refresh_content().await;

    let items = controller.items();
    if items.is_empty() {
        println!("No content available.");
    } else {
        print_items(&items);
    }
    print_summary(&controller);

    Ok(())
}

async fn cmd_clear_cache(snapshots: Snapshots) -> FeedResult<()> {
    snapshots.clear().await;
    println!("Feed snapshot cleared.");
    Ok(())
}

async fn cmd_track(
    source: Arc<ApiContentSource>,
    content_id: &str,
    kind: InteractionKind,
    value: i64,
) -> FeedResult<()> {
    let reporter = InteractionReporter::new(source);
    let interaction = Interaction::new(content_id, kind).with_value(value);

    if reporter.report(interaction).await {
        println!("Tracked {} for {}", kind, content_id);
    } else {
        println!("Failed to track {} for {} (see log)", kind, content_id);
    }

    Ok(())
}

async fn cmd_saved(cache: SavedContentCache<ApiContentSource>) -> FeedResult<()> {
    cache.refresh().await;

    if cache.is_empty() {
        println!("No saved content.");
        return Ok(());
    }

    println!("Saved content:\n");
    for content_id in cache.content_ids() {
        let saved_id = cache.saved_id(&content_id).unwrap_or_default();
        println!("  {} (saved as {})", content_id, saved_id);
    }

    Ok(())
}

async fn cmd_save(cache: SavedContentCache<ApiContentSource>, content_id: &str) -> FeedResult<()> {
    cache.refresh().await;

    if cache.is_saved(content_id) {
        println!("Already saved: {}", content_id);
        return Ok(());
    }

    let saved_id = cache.save(content_id).await?;
    println!("Saved {} (saved as {})", content_id, saved_id);

    Ok(())
}

async fn cmd_unsave(
    cache: SavedContentCache<ApiContentSource>,
    content_id: &str,
) -> FeedResult<()> {
    cache.refresh().await;

    if !cache.is_saved(content_id) {
        println!("Not saved: {}", content_id);
        return Ok(());
    }

    cache.remove(content_id).await?;
    println!("Removed {} from saved content", content_id);

    Ok(())
}

async fn cmd_progress(
    tracker: DailyContentTracker<SqliteKeyValueStore, ApiContentSource>,
    consume: Option<&str>,
) -> FeedResult<()> {
    tracker.initialize().await;

    if let Some(content_id) = consume {
        let outcome = tracker.track(content_id).await;
        if outcome.streak_earned {
            println!("Daily streak earned!");
        } else if outcome.is_new_threshold {
            println!("Daily goal reached.");
        }
    }

    let progress = tracker.progress();
    println!("Today: {}/{} facts", progress.current, progress.threshold);

    if tracker.streak_earned() {
        println!("Streak already earned today.");
    } else if progress.can_earn_streak {
        println!("Streak available, consume another fact to retry.");
    }

    Ok(())
}
