use crate::model::StorageError;
use crate::storage::document::Document;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{error, info, warn};

/// Key the working document is stored under.
pub const STORAGE_KEY: &str = "flat-analyzer-data";

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens the database and creates the document table if needed.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    /// Throwaway in-memory database.
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS documents (
                key TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(Self { conn })
    }

    /// Stores `doc` under `key`, replacing any previous version.
    pub fn save(&self, key: &str, doc: &Document) -> Result<(), StorageError> {
        let body = serde_json::to_string(doc)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO documents (key, body, updated_at) VALUES (?1, ?2, ?3)",
            params![key, body, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn load(&self, key: &str) -> Result<Option<Document>, StorageError> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    /// When `key` was last written.
    pub fn last_saved(&self, key: &str) -> Result<Option<DateTime<Utc>>, StorageError> {
        let stamp: Option<String> = self
            .conn
            .query_row(
                "SELECT updated_at FROM documents WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        let Some(stamp) = stamp else {
            return Ok(None);
        };
        let parsed = DateTime::parse_from_rfc3339(&stamp).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Some(parsed.with_timezone(&Utc)))
    }
}

/// Best-effort local persistence: failures are logged and the session
/// carries on in memory.
pub struct LocalCache {
    storage: Option<SqliteStorage>,
}

impl LocalCache {
    pub fn open(db_path: &str) -> Self {
        match SqliteStorage::new(db_path) {
            Ok(storage) => Self {
                storage: Some(storage),
            },
            Err(e) => {
                error!("Failed to open local storage at {}: {}", db_path, e);
                Self { storage: None }
            }
        }
    }

    pub fn from_storage(storage: SqliteStorage) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    /// Stored document, if one exists and could be read.
    pub fn load(&self) -> Option<Document> {
        let storage = self.storage.as_ref()?;
        match storage.load(STORAGE_KEY) {
            Ok(Some(doc)) => {
                info!("💾 Loaded {} offers from local storage", doc.offers.len());
                Some(doc)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to load from local storage: {}", e);
                None
            }
        }
    }

    /// Saves `doc` without images.
    pub fn save(&self, doc: &Document) {
        let Some(storage) = &self.storage else {
            return;
        };
        if let Err(e) = storage.save(STORAGE_KEY, &doc.stripped_for_persistence()) {
            warn!("Failed to save to local storage: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::ParameterRanges;

    fn doc_with(ids: &[&str]) -> Document {
        let offers = ids
            .iter()
            .map(|id| serde_json::from_value(serde_json::json!({"id": id, "image": "x"})).unwrap())
            .collect();
        Document::new(offers, ParameterRanges::default())
    }

    #[test]
    fn save_then_load() {
        let storage = SqliteStorage::in_memory().unwrap();
        assert!(storage.load(STORAGE_KEY).unwrap().is_none());
        assert!(storage.last_saved(STORAGE_KEY).unwrap().is_none());

        storage.save(STORAGE_KEY, &doc_with(&["a", "b"])).unwrap();
        storage.save(STORAGE_KEY, &doc_with(&["c"])).unwrap();
        let loaded = storage.load(STORAGE_KEY).unwrap().unwrap();
        assert_eq!(loaded.offers.len(), 1);
        assert_eq!(loaded.offers[0].id, "c");
        assert!(storage.last_saved(STORAGE_KEY).unwrap().is_some());
    }

    #[test]
    fn cache_strips_images() {
        let cache = LocalCache::from_storage(SqliteStorage::in_memory().unwrap());
        cache.save(&doc_with(&["a"]));
        let loaded = cache.load().unwrap();
        assert!(loaded.offers[0].image.is_none());
    }

    #[test]
    fn unopenable_cache_is_inert() {
        let cache = LocalCache::open("/nonexistent-dir/flat-compare.db");
        cache.save(&doc_with(&["a"]));
        assert!(cache.load().is_none());
    }
}
