/// User domain type
use super::ids::{EntryId, UserId};
use serde::{Deserialize, Serialize};

/// A listener, created lazily on first interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// External user identifier
    pub id: UserId,

    /// First entry of the user's playlist
    pub playlist_head: Option<EntryId>,

    /// Requeue consumed entries at the tail instead of discarding them
    pub rotate: bool,

    pub hype_count_got: i64,
    pub hype_count_given: i64,
    pub skip_votes_got: i64,
    pub skip_votes_given: i64,
    pub play_count: i64,
}
