// crates/db/src/lib.rs
// SQLite persistence for game sessions, domain summaries and user records.

mod migrations;
mod queries;
mod store;

pub use queries::{Record, MAX_RECENT_SESSIONS, MAX_RECORDS};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{ConnectOptions, SqlitePool};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid JSON column: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to determine cache directory")]
    NoCacheDir,

    #[error("Failed to create database directory: {0}")]
    CreateDir(#[from] std::io::Error),
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Map a unique-constraint violation to [`DbError::Conflict`], passing
    /// every other error through.
    pub(crate) fn unique_as_conflict(err: sqlx::Error, what: impl Into<String>) -> Self {
        let is_unique = err
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if is_unique {
            DbError::Conflict(what.into())
        } else {
            DbError::Sqlx(err)
        }
    }
}

/// Main database handle wrapping a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl Database {
    /// Open (or create) the database at the given path and run migrations.
    pub async fn new(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30))
            .log_slow_statements(
                tracing::log::LevelFilter::Warn,
                std::time::Duration::from_secs(5),
            );

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let db = Self {
            pool,
            db_path: path.to_owned(),
        };
        db.run_migrations().await?;

        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// Create an in-memory database (for testing).
    ///
    /// Uses `shared_cache(true)` so all pool connections see the same
    /// in-memory database.
    pub async fn new_in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .shared_cache(true)
            .busy_timeout(std::time::Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        let db = Self {
            pool,
            db_path: PathBuf::new(),
        };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Open the database at the default location: `~/.cache/cogtrain/cogtrain.db`
    pub async fn open_default() -> DbResult<Self> {
        let path = default_db_path()?;
        Self::new(&path).await
    }

    /// Apply every migration newer than the highest version recorded in
    /// `_migrations`.
    async fn run_migrations(&self) -> DbResult<()> {
        sqlx::query("CREATE TABLE IF NOT EXISTS _migrations (version INTEGER PRIMARY KEY)")
            .execute(&self.pool)
            .await?;

        let row: (i64,) = sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM _migrations")
            .fetch_one(&self.pool)
            .await?;
        let current_version = row.0 as usize;

        for (i, migration) in migrations::MIGRATIONS.iter().enumerate() {
            let version = i + 1; // 1-based
            if version <= current_version {
                continue;
            }
            let mut tx = self.pool.begin().await?;
            sqlx::query(migration).execute(&mut *tx).await?;
            sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
                .bind(version as i64)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            tracing::debug!(version, "Applied migration");
        }

        Ok(())
    }

    /// Run a trivial statement to confirm the pool can reach the database.
    pub async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns an empty path for in-memory databases.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

/// Returns the default database path: `~/.cache/cogtrain/cogtrain.db`
pub fn default_db_path() -> DbResult<PathBuf> {
    dirs::cache_dir()
        .map(|dir| dir.join("cogtrain").join("cogtrain.db"))
        .ok_or(DbError::NoCacheDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn count(db: &Database, table: &str) -> i64 {
        let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .expect("table should exist");
        row.0
    }

    #[tokio::test]
    async fn test_ping_fails_after_close() {
        let db = Database::new_in_memory().await.unwrap();
        db.ping().await.expect("open pool answers");
        db.pool().close().await;
        assert!(db.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_create_database() {
        let db = Database::new_in_memory()
            .await
            .expect("should create in-memory database");

        for table in [
            "game_sessions",
            "domain_performance",
            "user_profiles",
            "user_settings",
        ] {
            assert_eq!(count(&db, table).await, 0);
        }
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let db = Database::new_in_memory()
            .await
            .expect("first open should succeed");

        db.run_migrations()
            .await
            .expect("second migration run should succeed");

        let applied: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(applied.0 as usize, migrations::MIGRATIONS.len());
    }

    #[tokio::test]
    async fn test_file_based_database() {
        let tmp = tempfile::tempdir().expect("should create temp dir");
        let db_path = tmp.path().join("nested").join("test.db");

        let db = Database::new(&db_path)
            .await
            .expect("should create file-based database");

        assert_eq!(count(&db, "game_sessions").await, 0);
        assert!(db_path.exists(), "database file should be created on disk");
        assert_eq!(db.db_path(), db_path.as_path());
    }

    #[tokio::test]
    async fn test_reopen_keeps_data() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("test.db");

        {
            let db = Database::new(&db_path).await.unwrap();
            sqlx::query(
                "INSERT INTO user_profiles (id, user_id, display_name, created_at, updated_at)
                 VALUES ('p1', 'u1', 'Ada', 0, 0)",
            )
            .execute(db.pool())
            .await
            .unwrap();
            db.pool().close().await;
        }

        let db = Database::new(&db_path).await.unwrap();
        assert_eq!(count(&db, "user_profiles").await, 1);
    }

    #[test]
    fn test_default_db_path() {
        let path = default_db_path().expect("should resolve default path");
        assert!(path.to_string_lossy().contains("cogtrain"));
        assert!(path.to_string_lossy().ends_with("cogtrain.db"));
    }
}
