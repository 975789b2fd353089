/// Media resolution boundary
///
/// The engine never fetches media itself; it asks a `MediaResolver` for a
/// track's title, duration and a playable URL.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::locator::Locator;

/// Result of resolving a single track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMedia {
    pub title: String,
    /// Duration in seconds
    pub duration: i64,
    /// Direct URL the stream server can fetch
    pub url: String,
}

/// Catalog metadata of a track, enough to create a song
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongMetadata {
    pub title: String,
    /// Duration in seconds
    pub duration: i64,
}

impl From<ResolvedMedia> for SongMetadata {
    fn from(media: ResolvedMedia) -> Self {
        Self {
            title: media.title,
            duration: media.duration,
        }
    }
}

/// Resolver failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    /// Network or service failure
    #[error("{0}")]
    Service(String),

    /// Service answered but a required field was missing
    #[error("Failed to extract song {0}")]
    MissingField(&'static str),

    /// Search produced nothing
    #[error("Search returned no results")]
    NoResults,

    /// Input is not something the resolver can handle
    #[error("Unsupported input: {0}")]
    Unsupported(String),
}

/// Media resolver trait
///
/// Implementers turn locators into playable media, expand album/playlist
/// URLs and run keyword searches.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Resolve a track's title, duration and playable URL
    async fn resolve(&self, locator: &Locator) -> Result<ResolvedMedia, ResolverError>;

    /// Title and duration only, used when a song enters the catalog
    ///
    /// Defaults to a full [`resolve`](Self::resolve); implementers that can
    /// skip picking a playable stream should override it.
    async fn describe(&self, locator: &Locator) -> Result<SongMetadata, ResolverError> {
        self.resolve(locator).await.map(SongMetadata::from)
    }

    /// Expand an album/playlist URL into its entries (URLs or locators)
    async fn resolve_playlist(&self, url: &str) -> Result<Vec<String>, ResolverError>;

    /// Best-matching song URL for free-text keywords
    async fn search(&self, query: &str) -> Result<String, ResolverError>;
}
