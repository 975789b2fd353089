/// Storage-specific errors
use thiserror::Error;

/// Storage setup error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection error
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<StorageError> for jukebox_core::JukeboxError {
    fn from(err: StorageError) -> Self {
        jukebox_core::JukeboxError::storage(err.to_string())
    }
}
