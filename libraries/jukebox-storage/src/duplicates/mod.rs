//! Duplicate song relation
//!
//! `songs.duplicate_of` points from a duplicate to the song that replaces it
//! for policy checks and playback. The relation is kept at most one hop deep:
//! a song that is the target of a duplicate is never a duplicate itself.

use jukebox_core::{JukeboxError, Result, SongId};
use sqlx::SqlitePool;

/// Mark `source_id` as a duplicate of `target_id`
///
/// Songs already pointing to the source are redirected along with it. If the
/// target is itself a duplicate, its own target is used instead; if it is a
/// duplicate of the source, that relation is undone first. Merging a song
/// with itself is a [`split`].
pub async fn merge(pool: &SqlitePool, source_id: SongId, target_id: SongId) -> Result<()> {
    if source_id == target_id {
        return split(pool, source_id).await;
    }

    let mut tx = pool.begin().await?;

    // Swapping roles, undo the reverse relation
    let undone = sqlx::query("UPDATE songs SET duplicate_of = NULL WHERE id = ? AND duplicate_of = ?")
        .bind(target_id)
        .bind(source_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let target_duplicate_of: Option<SongId> =
        sqlx::query_scalar("SELECT duplicate_of FROM songs WHERE id = ?")
            .bind(target_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| JukeboxError::song_not_found(target_id))?;

    // Never point at a duplicate
    let effective_target = target_duplicate_of.unwrap_or(target_id);

    let result = sqlx::query("UPDATE songs SET duplicate_of = ? WHERE id = ? OR duplicate_of = ?")
        .bind(effective_target)
        .bind(source_id)
        .bind(source_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(JukeboxError::song_not_found(source_id));
    }

    tx.commit().await?;

    tracing::info!(
        source_id,
        target_id = effective_target,
        redirected = result.rows_affected(),
        undone,
        "Songs merged"
    );
    Ok(())
}

/// Clear the duplicate relation of a single song
///
/// A song that is not a duplicate is left as is.
pub async fn split(pool: &SqlitePool, id: SongId) -> Result<()> {
    let result = sqlx::query("UPDATE songs SET duplicate_of = NULL WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() != 1 {
        return Err(JukeboxError::song_not_found(id));
    }

    tracing::info!(song_id = id, "Song split from its duplicate group");
    Ok(())
}
