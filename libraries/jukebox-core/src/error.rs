/// Core error types for the jukebox engine
use thiserror::Error;

use crate::resolver::ResolverError;
use crate::types::SongId;

/// Result type alias using `JukeboxError`
pub type Result<T> = std::result::Result<T, JukeboxError>;

/// Every failure a caller of the engine can observe
#[derive(Error, Debug)]
pub enum JukeboxError {
    /// Referenced song or user is absent
    #[error("{entity} [{id}] cannot be found in the database")]
    NotFound { entity: String, id: String },

    /// The user's playlist has no room left
    #[error("Playlist is full (limit {limit})")]
    CapacityExceeded { limit: i64 },

    /// The user's playlist has no entries
    #[error("Playlist is empty")]
    EmptyPlaylist,

    /// Song was blacklisted by an operator
    #[error("Song [{0}] was blacklisted by an operator")]
    Blacklisted(SongId),

    /// Song was played within the overplay protection interval
    #[error("Song [{0}] has been played recently")]
    Overplayed(SongId),

    /// Song has no play credits left
    #[error("Song [{0}] is out of credits")]
    Exhausted(SongId),

    /// Song is longer than the configured limit
    #[error("Song [{0}]'s length exceeds the limit")]
    TooLong(SongId),

    /// Song could not be resolved to a playable source
    #[error("Song [{song_id}] {title} is unavailable")]
    Unavailable { song_id: SongId, title: String },

    /// Lookup failure reported by the media resolver
    #[error("Resolution failed: {0}")]
    Resolution(#[from] ResolverError),

    /// Unrecognized locator or URL shape
    #[error("Malformed URL or unsupported service: {0}")]
    MalformedInput(String),

    /// Database errors (for storage implementations)
    #[error("Database error: {0}")]
    Database(String),

    /// Engine settings the engine cannot work with
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Storage setup errors (pool, migrations)
    #[error("Storage error: {0}")]
    Storage(String),
}

impl JukeboxError {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Create a song not found error
    pub fn song_not_found(id: SongId) -> Self {
        Self::not_found("Song", id)
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Whether the error is a policy rejection of a specific song
    pub fn is_policy_rejection(&self) -> bool {
        matches!(
            self,
            Self::Blacklisted(_) | Self::Overplayed(_) | Self::Exhausted(_) | Self::TooLong(_)
        )
    }

    /// Song the error refers to, if any
    pub fn song_id(&self) -> Option<SongId> {
        match self {
            Self::Blacklisted(id)
            | Self::Overplayed(id)
            | Self::Exhausted(id)
            | Self::TooLong(id)
            | Self::Unavailable { song_id: id, .. } => Some(*id),
            _ => None,
        }
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for JukeboxError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}
