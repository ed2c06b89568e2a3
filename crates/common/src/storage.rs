//! Durable key-value storage for the session cache
//!
//! Writes go straight to the backing store; there is no write buffering, so
//! a restarted client always observes the latest state.

use crate::Result;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Key-value store with atomic multi-key writes
pub trait KeyValueStore: Send + Sync {
    /// Read a single key
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write all entries or none of them
    fn put_all(&self, entries: &[(&str, &str)]) -> Result<()>;

    /// Remove all keys or none of them; missing keys are not an error
    fn remove_all(&self, keys: &[&str]) -> Result<()>;
}

/// SQLite-backed store
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create the store at path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;

        info!("Opened session store at {:?}", path.as_ref());
        Ok(store)
    }

    /// Open in-memory store (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
            );
            "#,
        )?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn put_all(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for (key, value) in entries {
            tx.execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, strftime('%s', 'now'))
                 ON CONFLICT(key) DO UPDATE
                 SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value],
            )?;
        }
        tx.commit()?;
        debug!("Stored {} key(s)", entries.len());
        Ok(())
    }

    fn remove_all(&self, keys: &[&str]) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for key in keys {
            tx.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        }
        tx.commit()?;
        debug!("Removed {} key(s)", keys.len());
        Ok(())
    }
}

/// Process-local store
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put_all(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut map = self.entries.lock();
        for (key, value) in entries {
            map.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove_all(&self, keys: &[&str]) -> Result<()> {
        let mut map = self.entries.lock();
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}
