mod ids;
mod play_record;
mod playlist;
mod song;
mod user;

pub use ids::{EntryId, SongId, UserId};
pub use play_record::PlayRecord;
pub use playlist::{InsertOutcome, PlaylistItem};
pub use song::{SearchPage, Song, SongInfo, SongSummary};
pub use user::User;
