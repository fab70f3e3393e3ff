use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::KeyValueStore;
use crate::error::{Error, Result};

/// Key-value store backed by a single SQLite table.
///
/// The database file lives in the user's data directory by default:
/// - Linux: ~/.local/share/geocam/geocam.db
/// - macOS: ~/Library/Application Support/geocam/geocam.db
/// - Windows: %APPDATA%\geocam\geocam.db
pub struct SqliteKv {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteKv {
    /// Open (or create) the database at `db_path` and initialize the schema.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::StorageWrite(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(&db_path).map_err(write_error)?;

        tracing::info!(path = %db_path.display(), "key-value store opened");

        let kv = SqliteKv {
            conn: Mutex::new(conn),
            db_path,
        };
        kv.init_schema()?;

        Ok(kv)
    }

    /// The default database location under the platform data directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir()
            .or_else(dirs::home_dir)
            .map(|dir| dir.join("geocam").join("geocam.db"))
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn init_schema(&self) -> Result<()> {
        self.connection()
            .execute(
                "CREATE TABLE IF NOT EXISTS kv (
                    key     TEXT PRIMARY KEY,
                    value   TEXT NOT NULL
                )",
                [],
            )
            .map_err(write_error)?;
        Ok(())
    }

    fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for SqliteKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.connection()
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .map_err(|e| Error::DeviceUnavailable(format!("key-value read failed: {}", e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.connection()
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                rusqlite::params![key, value],
            )
            .map_err(write_error)?;
        Ok(())
    }
}

impl std::fmt::Debug for SqliteKv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteKv")
            .field("db_path", &self.db_path)
            .finish()
    }
}

fn write_error(err: rusqlite::Error) -> Error {
    Error::StorageWrite(err.to_string())
}
