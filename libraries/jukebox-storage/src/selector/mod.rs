//! Play selector
//!
//! Supplies the player with the next song, either from a user's playlist or
//! from the autoplay pool. Both paths end in the resolver; a song that fails
//! to resolve is flagged so autoplay and the failed listing pick it up.

use chrono::{DateTime, Utc};
use jukebox_core::{
    EngineConfig, EntryId, JukeboxError, Locator, MediaResolver, PlayRecord, Result, Song, SongId,
    UserId,
};
use rand::Rng;
use sqlx::{Row, SqlitePool};

use crate::context::Jukebox;
use crate::songs::{self, song_from_row, SONG_COLUMNS};
use crate::{to_timestamp, users};

/// Take the first entry off the user's playlist
///
/// Without rotation the entry is deleted; with rotation it moves to the
/// tail (a single-entry playlist stays as it is). Returns the song to play,
/// which is the duplicate target when the entry's song is a duplicate.
pub async fn dequeue(pool: &SqlitePool, user_id: UserId, default_rotate: bool) -> Result<Song> {
    let mut tx = pool.begin().await?;

    users::get_or_create(&mut *tx, user_id, default_rotate).await?;
    let user = users::get(&mut *tx, user_id)
        .await?
        .ok_or_else(|| JukeboxError::not_found("User", user_id))?;

    let Some(head) = user.playlist_head else {
        return Err(JukeboxError::EmptyPlaylist);
    };

    let entry = sqlx::query("SELECT song_id, next_id FROM playlist_entries WHERE id = ?")
        .bind(head)
        .fetch_one(&mut *tx)
        .await?;
    let song_id: SongId = entry.get("song_id");
    let next: Option<EntryId> = entry.get("next_id");

    if !user.rotate {
        sqlx::query("UPDATE users SET playlist_head = ? WHERE id = ?")
            .bind(next)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM playlist_entries WHERE id = ?")
            .bind(head)
            .execute(&mut *tx)
            .await?;
    } else if next.is_some() {
        sqlx::query("UPDATE users SET playlist_head = ? WHERE id = ?")
            .bind(next)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        // Only this user's tail
        sqlx::query(
            "UPDATE playlist_entries SET next_id = ? WHERE user_id = ? AND next_id IS NULL AND id != ?",
        )
        .bind(head)
        .bind(user_id)
        .bind(head)
        .execute(&mut *tx)
        .await?;
        sqlx::query("UPDATE playlist_entries SET next_id = NULL WHERE id = ?")
            .bind(head)
            .execute(&mut *tx)
            .await?;
    }

    let mut song = songs::get_by_id(&mut *tx, song_id)
        .await?
        .ok_or_else(|| JukeboxError::song_not_found(song_id))?;
    if let Some(target_id) = song.duplicate_of {
        song = songs::get_by_id(&mut *tx, target_id)
            .await?
            .ok_or_else(|| JukeboxError::song_not_found(target_id))?;
    }

    tx.commit().await?;

    Ok(song)
}

/// Policy gate, first failing check wins
pub fn check_policy(song: &Song, config: &EngineConfig, now: DateTime<Utc>) -> Result<()> {
    if song.is_blacklisted {
        return Err(JukeboxError::Blacklisted(song.id));
    }
    if now - song.last_played < config.overplay_interval() {
        return Err(JukeboxError::Overplayed(song.id));
    }
    if song.credit_count <= 0 {
        return Err(JukeboxError::Exhausted(song.id));
    }
    if song.duration > config.max_duration_secs {
        return Err(JukeboxError::TooLong(song.id));
    }
    Ok(())
}

/// Resolve a playable URL and build the play record
///
/// A failure flags the song and surfaces as `Unavailable`; a success clears
/// a flag left by an earlier failure.
pub async fn resolve_play(
    pool: &SqlitePool,
    resolver: &dyn MediaResolver,
    user_id: Option<UserId>,
    song: Song,
) -> Result<PlayRecord> {
    let locator = Locator::parse(&song.locator)?;

    match resolver.resolve(&locator).await {
        Ok(media) => {
            if song.has_failed {
                songs::set_failed(pool, song.id, false).await?;
            }
            Ok(PlayRecord::new(
                user_id,
                song.id,
                song.title,
                song.duration,
                media.url,
            ))
        }
        Err(e) => {
            tracing::warn!(song_id = song.id, error = %e, "Song resolution failed");
            songs::set_failed(pool, song.id, true).await?;
            Err(JukeboxError::Unavailable {
                song_id: song.id,
                title: song.title,
            })
        }
    }
}

/// Next song from a user's playlist
pub async fn next_for_user(jukebox: &Jukebox, user_id: UserId) -> Result<PlayRecord> {
    let song = dequeue(jukebox.pool(), user_id, jukebox.config().rotate_by_default).await?;

    check_policy(&song, jukebox.config(), Utc::now())?;

    resolve_play(jukebox.pool(), jukebox.resolver(), Some(user_id), song).await
}

const AUTOPLAY_FILTER: &str = r#"
    WHERE last_played < ?
      AND hype_count >= ?
      AND skip_votes * ? <= hype_count
      AND duration <= ?
      AND credit_count > 0
      AND is_blacklisted = 0
      AND has_failed = 0
      AND duplicate_of IS NULL
"#;

/// Uniformly random song among those eligible for autoplay
pub async fn pick_autoplay(
    pool: &SqlitePool,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<Option<Song>> {
    let cutoff = to_timestamp(now - config.overplay_interval());

    // Count and pick from the same snapshot
    let mut tx = pool.begin().await?;

    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM songs {AUTOPLAY_FILTER}"))
        .bind(cutoff)
        .bind(config.autoplay_hype_threshold)
        .bind(config.autoplay_skip_ratio)
        .bind(config.max_duration_secs)
        .fetch_one(&mut *tx)
        .await?;

    if count == 0 {
        return Ok(None);
    }

    let offset = rand::thread_rng().gen_range(0..count);

    let row = sqlx::query(&format!(
        "SELECT {SONG_COLUMNS} FROM songs {AUTOPLAY_FILTER} ORDER BY id LIMIT 1 OFFSET ?"
    ))
    .bind(cutoff)
    .bind(config.autoplay_hype_threshold)
    .bind(config.autoplay_skip_ratio)
    .bind(config.max_duration_secs)
    .bind(offset)
    .fetch_optional(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(row.as_ref().map(song_from_row))
}

/// Autoplay pick, or `None` when no song is eligible
pub async fn next_autoplay(jukebox: &Jukebox) -> Result<Option<PlayRecord>> {
    let Some(song) = pick_autoplay(jukebox.pool(), jukebox.config(), Utc::now()).await? else {
        return Ok(None);
    };

    tracing::debug!(song_id = song.id, "Autoplay candidate picked");
    resolve_play(jukebox.pool(), jukebox.resolver(), None, song)
        .await
        .map(Some)
}
