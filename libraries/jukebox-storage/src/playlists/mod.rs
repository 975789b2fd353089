//! Per-user playlists
//!
//! Each user owns one singly linked list: `users.playlist_head` points at the
//! first entry and every `playlist_entries.next_id` at the following one.
//! Entries reference catalog songs; shuffling permutes those references and
//! leaves the chain itself alone.
//!
//! Inserting is two-phased. Inputs are resolved to catalog songs first,
//! without any transaction open, then the entries are spliced in under a
//! short write transaction that re-checks the capacity limit.
//!
//! Every write transaction here opens with a write (the user upsert) so
//! `SQLite` takes the write lock before anything is read.

use jukebox_core::{
    is_playlist_url, EntryId, InsertOutcome, JukeboxError, Locator, PlaylistItem, Result, Song,
    SongId, UserId,
};
use rand::seq::SliceRandom;
use sqlx::{Row, Sqlite, SqlitePool};

use crate::context::Jukebox;
use crate::{songs, users};

/// Where a batch of new entries is spliced in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Head,
    Tail,
}

/// Songs resolved from user input, ready for insertion
#[derive(Debug, Default)]
pub struct SongBatch {
    pub songs: Vec<Song>,
    pub errors: Vec<String>,
    /// Input was left over once `limit` songs were collected
    pub truncated: bool,
}

/// Failures reported per item instead of aborting the whole batch
fn is_item_error(err: &JukeboxError) -> bool {
    matches!(
        err,
        JukeboxError::NotFound { .. } | JukeboxError::MalformedInput(_) | JukeboxError::Resolution(_)
    )
}

async fn song_for_url(jukebox: &Jukebox, url: &str) -> Result<Song> {
    let locator = Locator::parse(url)?;
    songs::get_or_create(
        jukebox.pool(),
        jukebox.resolver(),
        jukebox.config().credit_cap,
        &locator,
    )
    .await
}

/// Resolve inputs into catalog songs, stopping after `limit` songs
///
/// An input is an existing song id, an album/playlist URL (expanded through
/// the resolver) or a single song URL/locator.
pub async fn collect_songs(jukebox: &Jukebox, inputs: &[String], limit: usize) -> Result<SongBatch> {
    let mut batch = SongBatch::default();

    for input in inputs {
        let input = input.trim();
        if batch.songs.len() >= limit {
            batch.truncated = true;
            return Ok(batch);
        }

        if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
            let song = match input.parse::<SongId>() {
                Ok(id) => songs::get_by_id(jukebox.pool(), id)
                    .await?
                    .ok_or_else(|| JukeboxError::not_found("Song", input)),
                Err(_) => Err(JukeboxError::not_found("Song", input)),
            };
            match song {
                Ok(song) => batch.songs.push(song),
                Err(e) => batch.errors.push(e.to_string()),
            }
        } else if is_playlist_url(input) {
            let entries = match jukebox.resolver().resolve_playlist(input).await {
                Ok(entries) => entries,
                Err(e) => {
                    batch.errors.push(format!("Processing list `{}` failed: {}", input, e));
                    continue;
                }
            };

            for entry in entries {
                if batch.songs.len() >= limit {
                    batch.truncated = true;
                    return Ok(batch);
                }
                match song_for_url(jukebox, &entry).await {
                    Ok(song) => batch.songs.push(song),
                    Err(JukeboxError::Resolution(e)) => batch
                        .errors
                        .push(format!("Inserting `{}` from playlist failed: {}", entry, e)),
                    Err(e) if is_item_error(&e) => batch.errors.push(e.to_string()),
                    Err(e) => return Err(e),
                }
            }
        } else {
            match song_for_url(jukebox, input).await {
                Ok(song) => batch.songs.push(song),
                Err(JukeboxError::Resolution(e)) => {
                    batch.errors.push(format!("Inserting `{}` failed: {}", input, e));
                }
                Err(e) if is_item_error(&e) => batch.errors.push(e.to_string()),
                Err(e) => return Err(e),
            }
        }
    }

    Ok(batch)
}

/// Splice songs into a user's playlist
///
/// Runs in one transaction. The remaining capacity is recomputed inside it,
/// so a concurrent insert that filled the playlist since the caller's early
/// check is caught here. Songs beyond the capacity are dropped; the number
/// actually inserted is returned.
pub async fn insert(
    pool: &SqlitePool,
    user_id: UserId,
    song_ids: &[SongId],
    position: Position,
    max_songs: i64,
    default_rotate: bool,
) -> Result<usize> {
    let mut tx = pool.begin().await?;

    users::get_or_create(&mut *tx, user_id, default_rotate).await?;

    let room = max_songs - users::playlist_len(&mut *tx, user_id).await?;
    if room <= 0 {
        return Err(JukeboxError::CapacityExceeded { limit: max_songs });
    }
    let take = song_ids.len().min(room as usize);
    if take == 0 {
        return Ok(0);
    }

    let head: Option<EntryId> = sqlx::query_scalar("SELECT playlist_head FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

    // Must be looked up before the new chain adds another NULL `next_id`
    let tail: Option<EntryId> = sqlx::query_scalar(
        "SELECT id FROM playlist_entries WHERE user_id = ? AND next_id IS NULL",
    )
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    // Build the new chain back to front
    let mut next = match position {
        Position::Head => head,
        Position::Tail => None,
    };
    for song_id in song_ids[..take].iter().rev() {
        let result =
            sqlx::query("INSERT INTO playlist_entries (user_id, song_id, next_id) VALUES (?, ?, ?)")
                .bind(user_id)
                .bind(song_id)
                .bind(next)
                .execute(&mut *tx)
                .await?;
        next = Some(result.last_insert_rowid());
    }
    let chain_start = next;

    match (position, tail) {
        (Position::Tail, Some(tail)) => {
            sqlx::query("UPDATE playlist_entries SET next_id = ? WHERE id = ?")
                .bind(chain_start)
                .bind(tail)
                .execute(&mut *tx)
                .await?;
        }
        _ => {
            sqlx::query("UPDATE users SET playlist_head = ? WHERE id = ?")
                .bind(chain_start)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;

    Ok(take)
}

async fn add(
    jukebox: &Jukebox,
    user_id: UserId,
    inputs: &[String],
    position: Position,
) -> Result<InsertOutcome> {
    let max_songs = jukebox.config().max_songs;

    // Advisory check, repeated under the transaction
    let count = users::playlist_len(jukebox.pool(), user_id).await?;
    if count >= max_songs {
        return Err(JukeboxError::CapacityExceeded { limit: max_songs });
    }

    let batch = collect_songs(jukebox, inputs, (max_songs - count) as usize).await?;
    let song_ids: Vec<SongId> = batch.songs.iter().map(|song| song.id).collect();

    let inserted = insert(
        jukebox.pool(),
        user_id,
        &song_ids,
        position,
        max_songs,
        jukebox.config().rotate_by_default,
    )
    .await?;

    let truncated = batch.truncated || song_ids.len() > inserted;
    if truncated {
        tracing::debug!(user_id, inserted, requested = inputs.len(), "Playlist insert truncated");
    }

    Ok(InsertOutcome {
        inserted,
        truncated,
        errors: batch.errors,
    })
}

/// Add songs to the end of a user's playlist
pub async fn append(jukebox: &Jukebox, user_id: UserId, inputs: &[String]) -> Result<InsertOutcome> {
    add(jukebox, user_id, inputs, Position::Tail).await
}

/// Add songs to the front of a user's playlist, keeping their order
pub async fn prepend(jukebox: &Jukebox, user_id: UserId, inputs: &[String]) -> Result<InsertOutcome> {
    add(jukebox, user_id, inputs, Position::Head).await
}

/// Search for a song by keywords and put it at the front of the playlist
pub async fn push(jukebox: &Jukebox, user_id: UserId, keywords: &[String]) -> Result<(SongId, String)> {
    let max_songs = jukebox.config().max_songs;

    if users::playlist_len(jukebox.pool(), user_id).await? >= max_songs {
        return Err(JukeboxError::CapacityExceeded { limit: max_songs });
    }

    let url = jukebox.resolver().search(&keywords.join(" ")).await?;
    let song = song_for_url(jukebox, &url).await?;

    insert(
        jukebox.pool(),
        user_id,
        &[song.id],
        Position::Head,
        max_songs,
        jukebox.config().rotate_by_default,
    )
    .await?;

    Ok((song.id, song.title))
}

/// Remove up to `count` entries from the front of the playlist
///
/// Returns how many entries were removed.
pub async fn pop(pool: &SqlitePool, user_id: UserId, count: i64, default_rotate: bool) -> Result<u64> {
    if count <= 0 {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;

    users::get_or_create(&mut *tx, user_id, default_rotate).await?;

    let mut current =
        sqlx::query_scalar::<_, Option<EntryId>>("SELECT playlist_head FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .flatten();

    let mut removed = Vec::new();
    while let Some(id) = current {
        if removed.len() as i64 >= count {
            break;
        }
        current = sqlx::query_scalar("SELECT next_id FROM playlist_entries WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        removed.push(id);
    }

    if removed.is_empty() {
        return Ok(0);
    }

    sqlx::query("UPDATE users SET playlist_head = ? WHERE id = ?")
        .bind(current)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let placeholders = vec!["?"; removed.len()].join(", ");
    let delete_sql = format!("DELETE FROM playlist_entries WHERE id IN ({placeholders})");
    let mut delete = sqlx::query::<Sqlite>(&delete_sql);
    for id in &removed {
        delete = delete.bind(id);
    }
    let result = delete.execute(&mut *tx).await?;

    tx.commit().await?;

    Ok(result.rows_affected())
}

/// Remove every entry of the playlist
pub async fn clear(pool: &SqlitePool, user_id: UserId) -> Result<u64> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE users SET playlist_head = NULL WHERE id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM playlist_entries WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(result.rows_affected())
}

/// Randomly permute the songs across the existing entries
pub async fn shuffle(pool: &SqlitePool, user_id: UserId, default_rotate: bool) -> Result<()> {
    let mut tx = pool.begin().await?;

    users::get_or_create(&mut *tx, user_id, default_rotate).await?;

    let rows = sqlx::query("SELECT id, song_id FROM playlist_entries WHERE user_id = ? ORDER BY id")
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

    let entry_ids: Vec<EntryId> = rows.iter().map(|row| row.get("id")).collect();
    let mut song_ids: Vec<SongId> = rows.iter().map(|row| row.get("song_id")).collect();
    song_ids.shuffle(&mut rand::thread_rng());

    for (entry_id, song_id) in entry_ids.iter().zip(&song_ids) {
        sqlx::query("UPDATE playlist_entries SET song_id = ? WHERE id = ?")
            .bind(song_id)
            .bind(entry_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(())
}

/// Walk the chain from the head and return `limit` songs after `offset`
pub async fn list(
    pool: &SqlitePool,
    user_id: UserId,
    offset: i64,
    limit: i64,
) -> Result<Vec<PlaylistItem>> {
    let offset = offset.max(0);
    let limit = limit.max(0);
    if limit == 0 {
        return Ok(Vec::new());
    }

    let rows = sqlx::query(
        r#"
        WITH RECURSIVE chain(id, song_id, next_id, position) AS (
            SELECT e.id, e.song_id, e.next_id, 0
            FROM users u
            INNER JOIN playlist_entries e ON e.id = u.playlist_head
            WHERE u.id = ?
            UNION ALL
            SELECT e.id, e.song_id, e.next_id, c.position + 1
            FROM chain c
            INNER JOIN playlist_entries e ON e.id = c.next_id
            WHERE c.position + 1 < ?
        )
        SELECT c.song_id, s.title
        FROM chain c
        INNER JOIN songs s ON s.id = c.song_id
        ORDER BY c.position
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(user_id)
    .bind(offset.saturating_add(limit))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| PlaylistItem {
            song_id: row.get("song_id"),
            title: row.get("title"),
        })
        .collect())
}
