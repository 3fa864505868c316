pub mod content;
pub mod interaction;
pub mod page;
pub mod saved;
pub mod snapshot;
pub mod streak;

pub use content::{CarouselSlide, ContentItem, ContentKind};
pub use interaction::{Interaction, InteractionKind};
pub use page::{ContentPage, PageQuery};
pub use saved::{ContentRef, SavedContentRecord};
pub use snapshot::CachedSnapshot;
pub use streak::StreakUpdate;
