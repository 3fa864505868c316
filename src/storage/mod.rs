pub mod memory;
pub mod snapshot_cache;
pub mod sqlite;
pub mod traits;

pub use memory::MemoryKeyValueStore;
pub use snapshot_cache::{LocalSnapshotCache, CACHED_CONTENT_KEY, CACHE_EXPIRY_KEY};
pub use sqlite::{SqliteKeyValueStore, SqliteStorage};
pub use traits::{KeyValueStore, SnapshotStore};
