//! SQLite database layer for the tomstudy backend.
//!
//! Uses rusqlite with WAL mode for concurrent read performance.
//! All database operations are executed via `tokio::task::spawn_blocking`
//! to avoid blocking the async runtime.

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::StudyError;

/// Thread-safe handle to the SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) a SQLite database at the given path.
    pub fn open(db_path: &str) -> Result<Self, StudyError> {
        let path = Path::new(db_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let conn = Connection::open(db_path)
            .map_err(|e| StudyError::Database(format!("Failed to open database: {}", e)))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| StudyError::Database(format!("Failed to set pragmas: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize_tables()?;

        tracing::info!("SQLite database opened at: {}", db_path);
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StudyError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StudyError::Database(format!("Failed to open in-memory db: {}", e)))?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| StudyError::Database(format!("Failed to set pragmas: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize_tables()?;
        Ok(db)
    }

    /// Execute a closure with access to the database connection.
    /// Automatically handles locking and error conversion.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StudyError>
    where
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StudyError::Database(format!("Lock poisoned: {}", e)))?;
        f(&conn).map_err(|e| StudyError::Database(e.to_string()))
    }

    /// Execute a closure with access to the database connection (async-friendly).
    pub async fn with_conn_async<F, T>(&self, f: F) -> Result<T, StudyError>
    where
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || db.with_conn(f))
            .await
            .map_err(|e| StudyError::Database(format!("Task join error: {}", e)))?
    }

    /// Create all tables if they don't exist.
    fn initialize_tables(&self) -> Result<(), StudyError> {
        self.with_conn(|conn| {
            conn.execute_batch(
                "
                CREATE TABLE IF NOT EXISTS users (
                    id              TEXT PRIMARY KEY,
                    username        TEXT NOT NULL UNIQUE,
                    password        TEXT NOT NULL,
                    study_group     TEXT NOT NULL,
                    is_admin        INTEGER NOT NULL DEFAULT 0,
                    created_at      INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS user_steps (
                    user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    key             TEXT NOT NULL,
                    start_time      INTEGER NOT NULL,
                    end_time        INTEGER,
                    completed       INTEGER NOT NULL DEFAULT 0,
                    PRIMARY KEY (user_id, key)
                );

                CREATE TABLE IF NOT EXISTS interaction_messages (
                    id                  TEXT PRIMARY KEY,
                    user_id             TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    task                TEXT NOT NULL,
                    role                TEXT NOT NULL,
                    content             TEXT NOT NULL,
                    ord                 INTEGER NOT NULL,
                    token_count_input   INTEGER,
                    token_count_output  INTEGER,
                    time_ms             INTEGER,
                    created_at          INTEGER NOT NULL,
                    UNIQUE (user_id, task, ord)
                );
                CREATE INDEX IF NOT EXISTS idx_messages_user_task
                    ON interaction_messages(user_id, task);

                CREATE TABLE IF NOT EXISTS survey_projects (
                    key             TEXT PRIMARY KEY,
                    url             TEXT NOT NULL
                );
                ",
            )
        })
    }
}
