use clap::{Parser, Subcommand};

use crate::domain::InteractionKind;

#[derive(Parser)]
#[command(name = "factfeed")]
#[command(about = "Infinite daily-facts feed with saved content and streak tracking")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Page through the feed, using the local snapshot when it is fresh
    Browse {
        /// Number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: usize,

        /// Only show content from this topic
        #[arg(short, long)]
        topic: Option<String>,
    },

    /// Drop the local session and snapshot, then load the first page
    Refresh,

    /// Remove the persisted feed snapshot
    ClearCache,

    /// Report an interaction with a content item
    Track {
        /// Content item id
        content_id: String,

        /// One of: view, like, dislike, save, skip, partial, interested, engaged
        kind: InteractionKind,

        /// Interaction weight
        #[arg(long, default_value_t = 1)]
        value: i64,
    },

    /// List saved content
    Saved,

    /// Save a content item
    Save {
        /// Content item id
        content_id: String,
    },

    /// Remove a content item from the saved list
    Unsave {
        /// Content item id
        content_id: String,
    },

    /// Show today's progress towards the daily streak
    Progress {
        /// User the progress belongs to
        #[arg(long)]
        user: String,

        /// Record one consumed content item first
        #[arg(long)]
        consume: Option<String>,
    },
}
