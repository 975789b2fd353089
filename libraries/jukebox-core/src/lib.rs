//! Jukebox Core
//!
//! Platform-agnostic core types, traits, and error handling for the shared
//! music queue.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Song`, `User`, `PlayRecord`, listing pages
//! - **Resolver Boundary**: the `MediaResolver` trait and `Locator` codec
//! - **Configuration**: `EngineConfig` limits and thresholds
//! - **Error Handling**: Unified `JukeboxError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use jukebox_core::{Locator, PlayRecord};
//!
//! let locator = Locator::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
//! assert_eq!(locator.to_string(), "yt:dQw4w9WgXcQ");
//!
//! // Votes collected while a requested song plays
//! let mut record = PlayRecord::new(Some(1), 42, "Song", 212, "https://cdn.example/42");
//! record.hype(2);
//! record.skip(2);
//! assert_eq!(record.skip_votes(), 1);
//! assert!(!record.hype(1));
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod locator;
pub mod resolver;
pub mod types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{JukeboxError, Result};
pub use locator::{is_playlist_url, Locator};
pub use resolver::{MediaResolver, ResolvedMedia, ResolverError, SongMetadata};

pub use types::{
    EntryId, InsertOutcome, PlayRecord, PlaylistItem, SearchPage, Song, SongId, SongInfo,
    SongSummary, User, UserId,
};
