//! SQLite-backed key/value storage for the monitored target list

use crate::error::StoreError;
use crate::target::PersistedTarget;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const TARGETS_KEY: &str = "monitored_targets";

/// Durable whole-list storage for monitored targets.
pub trait TargetStore: Send {
    fn load(&self) -> Result<Vec<PersistedTarget>, StoreError>;
    fn save(&self, targets: &[PersistedTarget]) -> Result<(), StoreError>;
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn open_default() -> rusqlite::Result<Self> {
        Self::open(&Self::default_path())
    }

    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "memalert")
            .map(|dirs| dirs.data_dir().join("memalert.db"))
            .unwrap_or_else(|| PathBuf::from("memalert.db"))
    }

    pub fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(include_str!("../schema.sql"))
    }

    fn now() -> i64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
    }

    pub fn get(&self, key: &str) -> rusqlite::Result<Option<Vec<u8>>> {
        self.conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| row.get(0))
            .optional()
    }

    pub fn put(&self, key: &str, value: &[u8]) -> rusqlite::Result<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Self::now()],
        )?;
        Ok(())
    }

    pub fn delete(&self, key: &str) -> rusqlite::Result<()> {
        self.conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl TargetStore for Database {
    fn load(&self) -> Result<Vec<PersistedTarget>, StoreError> {
        match self.get(TARGETS_KEY)? {
            Some(blob) => Ok(serde_json::from_slice(&blob)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, targets: &[PersistedTarget]) -> Result<(), StoreError> {
        let blob = serde_json::to_vec(targets)?;
        self.put(TARGETS_KEY, &blob)?;
        Ok(())
    }
}
