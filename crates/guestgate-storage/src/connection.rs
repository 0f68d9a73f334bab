//! The guest list file.
//!
//! Every event and its guests live in one SQLite file that the organizer
//! commands and the door terminal open independently, often from separate
//! processes. The file is kept in WAL mode so a door keeps answering lookups
//! while an import writes, and a busy timeout makes a check-in wait for a
//! concurrent import's write lock rather than fail.
//!
//! [`Database`] hands out the two views of the file: [`Roster`] for
//! organizers and [`SqliteGuestList`] for the door.

use crate::error::{StorageError, StorageResult};
use crate::roster::Roster;
use crate::store::SqliteGuestList;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Connections per process. One door issues at most a prefix lookup, an
/// exact lookup and a check-in at a time.
const DEFAULT_POOL_SIZE: u32 = 4;

/// How long a write waits for another process to release the file.
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Location and sharing settings of a guest list file.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub pool_size: u32,
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool_size: DEFAULT_POOL_SIZE,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn pool_size(mut self, size: u32) -> Self {
        self.pool_size = size;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }
}

/// An open guest list.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the guest list at `config.path`, creating the file and its
    /// directory on first use, and bring the schema up to date.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Configuration`] for a zero pool size or a directory
    ///   that cannot be created
    /// - [`StorageError::Database`] / [`StorageError::Migration`] if the file
    ///   cannot be opened or migrated
    pub async fn open(config: DatabaseConfig) -> StorageResult<Self> {
        if config.pool_size == 0 {
            return Err(StorageError::Configuration(
                "pool size must be at least 1".to_string(),
            ));
        }

        if let Some(dir) = config.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                StorageError::Configuration(format!("cannot create {}: {e}", dir.display()))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.pool_size)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;

        info!(path = %config.path.display(), "Opened guest list");
        Ok(db)
    }

    /// A private, empty guest list that disappears when closed.
    pub async fn in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        // Every in-memory connection is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> StorageResult<()> {
        debug!("Applying guest list migrations");
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Organizer view: events, guests, imports and counters.
    pub fn roster(&self) -> Roster {
        Roster::new(self.pool.clone())
    }

    /// Door view: the four lookups the terminal makes.
    pub fn guest_list(&self) -> SqliteGuestList {
        SqliteGuestList::new(self.pool.clone())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
