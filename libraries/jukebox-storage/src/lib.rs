//! Jukebox Storage
//!
//! `SQLite` persistence for the song catalog, per-user playlists and the
//! credit economy, plus every transactional operation that reads and
//! mutates them.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: Each feature owns its own queries and logic
//! - **Linked Playlists**: `users.playlist_head` and `playlist_entries.next_id`
//!   form one singly linked list per user
//! - **Write-First Transactions**: every write transaction opens with a
//!   write statement, so `SQLite` grants the write lock (waiting out the busy
//!   timeout) before the transaction reads anything; media resolution always
//!   happens outside of transactions
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use jukebox_core::{EngineConfig, MediaResolver};
//! use jukebox_storage::{create_pool, run_migrations, Jukebox};
//!
//! # async fn example(resolver: Arc<dyn MediaResolver>) -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://jukebox.db").await?;
//! run_migrations(&pool).await?;
//!
//! let jukebox = Jukebox::new(pool, EngineConfig::default(), resolver);
//! let outcome = jukebox
//!     .append(42, &["https://youtu.be/dQw4w9WgXcQ".to_string()])
//!     .await?;
//! println!("inserted {} songs", outcome.inserted);
//! # Ok(())
//! # }
//! ```

mod context;
mod error;

// Vertical slices
pub mod credits;
pub mod duplicates;
pub mod playlists;
pub mod selector;
pub mod songs;
pub mod stats;
pub mod users;

pub use context::Jukebox;
pub use credits::RenewalOutcome;
pub use error::StorageError;

use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// This should be called once when the application starts to ensure
/// the database schema is up to date.
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StorageError> {
    MIGRATOR.run(pool).await?;
    tracing::debug!("Database migrations applied");
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://jukebox.db>`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, StorageError> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(database_url, "Creating SQLite pool");

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(std::time::Duration::from_secs(30)); // Wait up to 30s for locks

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::info!(database_url, "SQLite pool ready");

    Ok(pool)
}

/// Unix seconds stored in `INTEGER` timestamp columns
pub(crate) fn to_timestamp(time: DateTime<Utc>) -> i64 {
    time.timestamp()
}

pub(crate) fn from_timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
