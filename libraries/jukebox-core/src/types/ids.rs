/// ID types for jukebox entities
///
/// Songs and playlist entries use database surrogate keys; users are keyed by
/// the external (chat service) user id.

pub type SongId = i64;

pub type EntryId = i64;

pub type UserId = i64;
