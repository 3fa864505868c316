pub mod api;
pub mod traits;

pub use api::ApiContentSource;
pub use traits::{ContentSource, SavedContentSource, StreakSource};
