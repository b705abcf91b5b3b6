//! Durable hidden-item state over a string key-value store.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use thiserror::Error;
use tracing::warn;

/// Item id -> hidden flag. Absent ids are visible. Entries are never pruned;
/// ids that fall out of the feeds stay in the map harmlessly.
pub type VisibilityMap = HashMap<i64, bool>;

pub fn is_hidden(map: &VisibilityMap, id: i64) -> bool {
    map.get(&id).copied().unwrap_or(false)
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

pub struct SqliteKvStore {
    conn: Mutex<Connection>,
}

impl SqliteKvStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl KvStore for SqliteKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock().expect("kv lock should not be poisoned");
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("kv lock should not be poisoned");
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryKvStore {
    inner: Mutex<HashMap<String, String>>,
}

impl KvStore for InMemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let inner = self.inner.lock().expect("kv lock should not be poisoned");
        Ok(inner.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("kv lock should not be poisoned");
        inner.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

const VISIBILITY_KEY: &str = "hidden_items";

/// Owns the in-memory map plus the backing store. Every toggle rewrites the
/// whole serialized map, so a persisted snapshot is always self-consistent.
pub struct VisibilityStore {
    kv: Box<dyn KvStore>,
    map: VisibilityMap,
}

impl VisibilityStore {
    /// Loads the persisted map. An absent, unreadable, or unparsable payload
    /// degrades to an empty map; individual non-numeric ids are dropped.
    pub fn load(kv: Box<dyn KvStore>) -> Self {
        let map = match kv.get(VISIBILITY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<HashMap<String, bool>>(&raw) {
                Ok(parsed) => {
                    let mut map = VisibilityMap::new();
                    let mut skipped = 0u64;
                    for (key, hidden) in parsed {
                        match key.parse::<i64>() {
                            Ok(id) => {
                                map.insert(id, hidden);
                            }
                            Err(_) => skipped += 1,
                        }
                    }
                    if skipped > 0 {
                        warn!(
                            component = "visibility",
                            event = "visibility.load.skipped_ids",
                            skipped
                        );
                    }
                    map
                }
                Err(err) => {
                    warn!(
                        component = "visibility",
                        event = "visibility.load.corrupt",
                        error = %err
                    );
                    VisibilityMap::new()
                }
            },
            Ok(None) => VisibilityMap::new(),
            Err(err) => {
                warn!(
                    component = "visibility",
                    event = "visibility.load.corrupt",
                    error = %err
                );
                VisibilityMap::new()
            }
        };

        Self { kv, map }
    }

    pub fn is_hidden(&self, id: i64) -> bool {
        is_hidden(&self.map, id)
    }

    pub fn map(&self) -> &VisibilityMap {
        &self.map
    }

    /// Flips the flag for `id` (absent entries start visible) and persists
    /// the full map. A persist failure is logged, not propagated; the
    /// in-memory flag stays flipped so the session remains coherent.
    pub fn toggle(&mut self, id: i64) -> bool {
        let hidden = !is_hidden(&self.map, id);
        self.map.insert(id, hidden);

        if let Err(err) = self.persist() {
            warn!(
                component = "visibility",
                event = "visibility.persist.error",
                id,
                error = %err
            );
        }
        hidden
    }

    fn persist(&self) -> Result<(), StoreError> {
        let flat: HashMap<String, bool> = self
            .map
            .iter()
            .map(|(id, hidden)| (id.to_string(), *hidden))
            .collect();
        let raw = serde_json::to_string(&flat)?;
        self.kv.set(VISIBILITY_KEY, &raw)
    }
}
