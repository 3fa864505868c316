use async_trait::async_trait;
use rusqlite::OptionalExtension;

use crate::errors::FeedResult;
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::KeyValueStore;

#[derive(Clone)]
pub struct SqliteKeyValueStore {
    storage: SqliteStorage,
}

impl SqliteKeyValueStore {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> FeedResult<Option<String>> {
        let storage = self.storage.clone();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || -> FeedResult<Option<String>> {
            let conn = storage.connection()?;
            let value = conn
                .query_row("SELECT value FROM kv_store WHERE key = ?1", [&key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value)
        })
        .await?
    }

    async fn set(&self, key: &str, value: &str) -> FeedResult<()> {
        let storage = self.storage.clone();
        let key = key.to_string();
        let value = value.to_string();

        tokio::task::spawn_blocking(move || -> FeedResult<()> {
            let conn = storage.connection()?;
            conn.execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                (&key, &value),
            )?;
            Ok(())
        })
        .await?
    }

    async fn remove(&self, key: &str) -> FeedResult<()> {
        let storage = self.storage.clone();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || -> FeedResult<()> {
            let conn = storage.connection()?;
            conn.execute("DELETE FROM kv_store WHERE key = ?1", [&key])?;
            Ok(())
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> SqliteKeyValueStore {
        let storage = SqliteStorage::in_memory().unwrap();
        SqliteKeyValueStore::new(storage)
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = setup();
        assert_eq!(store.get("cached_content").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = setup();
        store.set("cache_expiry", "100").await.unwrap();
        store.set("cache_expiry", "200").await.unwrap();
        assert_eq!(
            store.get("cache_expiry").await.unwrap(),
            Some("200".to_string())
        );
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = setup();
        store.set("k", "v").await.unwrap();
        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.db");

        {
            let store = SqliteKeyValueStore::new(SqliteStorage::new(&path).unwrap());
            store.set("cached_content", "[]").await.unwrap();
        }

        let store = SqliteKeyValueStore::new(SqliteStorage::new(&path).unwrap());
        assert_eq!(
            store.get("cached_content").await.unwrap(),
            Some("[]".to_string())
        );
    }
}
