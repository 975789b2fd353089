//! Transient per-play record
//!
//! A `PlayRecord` is produced when a song is dequeued, collects hype and
//! skip votes while the song plays, and is consumed once by the statistics
//! update when playback finishes. It is never persisted.

use super::ids::{SongId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayRecord {
    user_id: Option<UserId>,
    song_id: SongId,
    title: String,
    duration: i64,
    url: String,

    hypes: HashSet<UserId>,
    skips: HashSet<UserId>,
}

impl PlayRecord {
    /// Create a record for a resolved song
    ///
    /// `user_id` is `None` for autoplay picks.
    pub fn new(
        user_id: Option<UserId>,
        song_id: SongId,
        title: impl Into<String>,
        duration: i64,
        url: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            song_id,
            title: title.into(),
            duration,
            url: url.into(),
            hypes: HashSet::new(),
            skips: HashSet::new(),
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn song_id(&self) -> SongId {
        self.song_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Duration in seconds
    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// Playable URL handed out by the resolver
    pub fn url(&self) -> &str {
        &self.url
    }

    fn is_requester(&self, user_id: UserId) -> bool {
        self.user_id == Some(user_id)
    }

    /// Record a hype vote, withdrawing any skip vote by the same user
    ///
    /// Returns `false` (and changes nothing) for the requesting user.
    pub fn hype(&mut self, user_id: UserId) -> bool {
        if self.is_requester(user_id) {
            return false;
        }
        self.skips.remove(&user_id);
        self.hypes.insert(user_id);
        true
    }

    /// Record a skip vote, withdrawing any hype vote by the same user
    ///
    /// Returns `false` (and changes nothing) for the requesting user; a
    /// requester skipping their own song is the player's business.
    pub fn skip(&mut self, user_id: UserId) -> bool {
        if self.is_requester(user_id) {
            return false;
        }
        self.hypes.remove(&user_id);
        self.skips.insert(user_id);
        true
    }

    pub fn hype_count(&self) -> usize {
        self.hypes.len()
    }

    pub fn skip_votes(&self) -> usize {
        self.skips.len()
    }

    pub fn hypes(&self) -> &HashSet<UserId> {
        &self.hypes
    }

    pub fn skips(&self) -> &HashSet<UserId> {
        &self.skips
    }
}
