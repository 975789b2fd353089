//! Song catalog types

use super::ids::SongId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog song, keyed by its dedup locator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub locator: String,
    pub title: String,
    /// Duration in seconds
    pub duration: i64,
    pub last_played: DateTime<Utc>,
    pub hype_count: i64,
    pub skip_votes: i64,
    pub play_count: i64,
    pub credit_count: i64,
    pub is_blacklisted: bool,
    pub has_failed: bool,
    pub duplicate_of: Option<SongId>,
}

impl Song {
    /// Song that should be played (and policy-checked) in place of this one
    pub fn effective_id(&self) -> SongId {
        self.duplicate_of.unwrap_or(self.id)
    }
}

/// Id and title pair used by listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongSummary {
    pub id: SongId,
    pub title: String,
}

/// One page of a listing plus the total number of matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    pub items: Vec<SongSummary>,
    pub total: i64,
}

/// Song snapshot with duplicate linkage and group-wide counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongInfo {
    pub song: Song,

    /// Song this one is marked as a duplicate of
    pub duplicates: Option<SongSummary>,

    /// Songs marked as duplicates of this one
    pub duplicated_by: Vec<SongSummary>,

    /// Counters summed over the song, its target and its duplicates
    pub total_hype_count: i64,
    pub total_skip_votes: i64,
    pub total_play_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(duplicate_of: Option<SongId>) -> Song {
        Song {
            id: 5,
            locator: "yt:dQw4w9WgXcQ".to_string(),
            title: "Title".to_string(),
            duration: 212,
            last_played: DateTime::<Utc>::UNIX_EPOCH,
            hype_count: 0,
            skip_votes: 0,
            play_count: 0,
            credit_count: 3,
            is_blacklisted: false,
            has_failed: false,
            duplicate_of,
        }
    }

    #[test]
    fn effective_id_follows_duplicate() {
        assert_eq!(song(None).effective_id(), 5);
        assert_eq!(song(Some(2)).effective_id(), 2);
    }
}
