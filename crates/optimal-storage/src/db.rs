//! Database connection management.
//!
//! Wraps a single rusqlite Connection in a Mutex for thread-safe access.
//! Configures WAL mode and recommended PRAGMAs on initialization.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use optimal_core::error::OptimalError;

use crate::migrations;

/// Thread-safe SQLite database wrapper.
///
/// rusqlite's Connection is Send but not Sync, so every access goes
/// through the mutex.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database at the given path.
    ///
    /// Configures WAL mode, synchronous=NORMAL, foreign keys, and runs
    /// all pending migrations.
    pub fn new(path: &Path) -> Result<Self, OptimalError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| OptimalError::Storage(format!("Failed to open database: {}", e)))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(|e| OptimalError::Storage(format!("Failed to set pragmas: {}", e)))?;

        info!("Database opened at {}", path.display());

        Self::with_migrations(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, OptimalError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| OptimalError::Storage(format!("Failed to open in-memory db: {}", e)))?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| OptimalError::Storage(format!("Failed to set pragmas: {}", e)))?;

        Self::with_migrations(conn)
    }

    fn with_migrations(conn: Connection) -> Result<Self, OptimalError> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Execute a closure with a reference to the underlying connection.
    ///
    /// The mutex is held for the duration of the closure, so a closure
    /// that opens a transaction sees no interleaved statements.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, OptimalError>
    where
        F: FnOnce(&Connection) -> Result<T, OptimalError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| OptimalError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_users(db: &Database) -> i64 {
        db.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM \"user\"", [], |row| row.get(0))
                .map_err(|e| OptimalError::Storage(e.to_string()))
        })
        .unwrap()
    }

    #[test]
    fn test_in_memory_database() {
        let db = Database::in_memory().unwrap();
        assert_eq!(count_users(&db), 0);
    }

    #[test]
    fn test_file_database_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("db.sqlite");
        let db = Database::new(&path).unwrap();

        assert_eq!(count_users(&db), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_reopen_file_database_keeps_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.sqlite");
        drop(Database::new(&path).unwrap());

        let db = Database::new(&path).unwrap();
        assert_eq!(count_users(&db), 0);
    }

    #[test]
    fn test_wal_mode_enabled_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("wal.sqlite")).unwrap();
        let mode: String = db
            .with_conn(|conn| {
                conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
                    .map_err(|e| OptimalError::Storage(e.to_string()))
            })
            .unwrap();
        assert_eq!(mode, "wal");
    }
}
