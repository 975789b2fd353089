//! Playlist types

use super::ids::SongId;
use serde::{Deserialize, Serialize};

/// Song in a user's playlist with denormalized title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub song_id: SongId,
    pub title: String,
}

/// Result of a bulk append/prepend
///
/// Truncation and per-item failures are reported here instead of failing
/// the whole call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOutcome {
    pub inserted: usize,
    pub truncated: bool,
    pub errors: Vec<String>,
}
