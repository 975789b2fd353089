//! Song catalog slice
//!
//! Songs are created on first successful resolution of a new locator and
//! never deleted. Operators can blacklist, rename and inspect them.

use jukebox_core::{
    JukeboxError, Locator, MediaResolver, Result, SearchPage, Song, SongId, SongInfo, SongSummary,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqliteExecutor, SqlitePool};

use crate::from_timestamp;

pub(crate) const SONG_COLUMNS: &str = "id, locator, title, duration, last_played, hype_count, \
    skip_votes, play_count, credit_count, is_blacklisted, has_failed, duplicate_of";

pub(crate) fn song_from_row(row: &SqliteRow) -> Song {
    Song {
        id: row.get("id"),
        locator: row.get("locator"),
        title: row.get("title"),
        duration: row.get("duration"),
        last_played: from_timestamp(row.get("last_played")),
        hype_count: row.get("hype_count"),
        skip_votes: row.get("skip_votes"),
        play_count: row.get("play_count"),
        credit_count: row.get("credit_count"),
        is_blacklisted: row.get::<i64, _>("is_blacklisted") != 0,
        has_failed: row.get::<i64, _>("has_failed") != 0,
        duplicate_of: row.get("duplicate_of"),
    }
}

fn summary_from_row(row: &SqliteRow) -> SongSummary {
    SongSummary {
        id: row.get("id"),
        title: row.get("title"),
    }
}

/// Get song by ID
pub async fn get_by_id<'e, E>(executor: E, id: SongId) -> Result<Option<Song>>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(&format!("SELECT {SONG_COLUMNS} FROM songs WHERE id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(row.as_ref().map(song_from_row))
}

/// Get song by its canonical locator
pub async fn get_by_locator(pool: &SqlitePool, locator: &Locator) -> Result<Option<Song>> {
    let row = sqlx::query(&format!(
        "SELECT {SONG_COLUMNS} FROM songs WHERE locator = ?"
    ))
    .bind(locator.to_string())
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(song_from_row))
}

/// Look a song up by locator, creating it on first sight
///
/// A new song needs a title and a duration, so the resolver is consulted
/// before anything is written. New songs start with a full credit balance
/// and `last_played` at the epoch.
pub async fn get_or_create(
    pool: &SqlitePool,
    resolver: &dyn MediaResolver,
    credit_cap: i64,
    locator: &Locator,
) -> Result<Song> {
    if let Some(song) = get_by_locator(pool, locator).await? {
        return Ok(song);
    }

    let media = resolver.describe(locator).await?;

    // A concurrent caller may have created the same song meanwhile
    let result = sqlx::query(
        r#"
        INSERT INTO songs (locator, title, duration, credit_count)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(locator) DO NOTHING
        "#,
    )
    .bind(locator.to_string())
    .bind(&media.title)
    .bind(media.duration)
    .bind(credit_cap)
    .execute(pool)
    .await?;

    if result.rows_affected() == 1 {
        tracing::info!(
            song_id = result.last_insert_rowid(),
            locator = %locator,
            title = %media.title,
            "Song added to the catalog"
        );
    }

    get_by_locator(pool, locator)
        .await?
        .ok_or_else(|| JukeboxError::storage(format!("Failed to retrieve song {locator}")))
}

async fn set_blacklisted(pool: &SqlitePool, id: SongId, blacklisted: bool) -> Result<()> {
    let result = sqlx::query("UPDATE songs SET is_blacklisted = ? WHERE id = ?")
        .bind(blacklisted)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() != 1 {
        return Err(JukeboxError::song_not_found(id));
    }
    tracing::info!(song_id = id, blacklisted, "Song blacklist flag changed");
    Ok(())
}

/// Prevent a song from being played
pub async fn blacklist(pool: &SqlitePool, id: SongId) -> Result<()> {
    set_blacklisted(pool, id, true).await
}

/// Lift a blacklist
pub async fn permit(pool: &SqlitePool, id: SongId) -> Result<()> {
    set_blacklisted(pool, id, false).await
}

pub async fn rename(pool: &SqlitePool, id: SongId, title: &str) -> Result<()> {
    let result = sqlx::query("UPDATE songs SET title = ? WHERE id = ?")
        .bind(title)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() != 1 {
        return Err(JukeboxError::song_not_found(id));
    }
    Ok(())
}

fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Search songs whose title or locator contains every keyword
///
/// Matching is case-insensitive (ASCII), results are ordered by id and
/// capped at `limit`; `total` counts every match.
pub async fn search(pool: &SqlitePool, keywords: &[String], limit: i64) -> Result<SearchPage> {
    let patterns: Vec<String> = keywords.iter().map(|k| like_pattern(k)).collect();

    let filter = if patterns.is_empty() {
        String::new()
    } else {
        let clauses = vec!["(title LIKE ? ESCAPE '\\' OR locator LIKE ? ESCAPE '\\')"; patterns.len()];
        format!("WHERE {}", clauses.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM songs {filter}");
    let mut count_query = sqlx::query_scalar::<Sqlite, i64>(&count_sql);
    for pattern in &patterns {
        count_query = count_query.bind(pattern).bind(pattern);
    }
    let total = count_query.fetch_one(pool).await?;

    let page_sql = format!("SELECT id, title FROM songs {filter} ORDER BY id LIMIT ?");
    let mut page_query = sqlx::query::<Sqlite>(&page_sql);
    for pattern in &patterns {
        page_query = page_query.bind(pattern).bind(pattern);
    }
    let rows = page_query.bind(limit).fetch_all(pool).await?;

    Ok(SearchPage {
        items: rows.iter().map(summary_from_row).collect(),
        total,
    })
}

/// Song snapshot with its duplicate group
///
/// Totals add up the song itself, the song it duplicates (if any) and
/// every song marked as a duplicate of it.
pub async fn info(pool: &SqlitePool, id: SongId) -> Result<SongInfo> {
    let song = get_by_id(pool, id)
        .await?
        .ok_or_else(|| JukeboxError::song_not_found(id))?;

    let mut total_hype_count = song.hype_count;
    let mut total_skip_votes = song.skip_votes;
    let mut total_play_count = song.play_count;

    let mut duplicates = None;
    if let Some(target_id) = song.duplicate_of {
        if let Some(target) = get_by_id(pool, target_id).await? {
            total_hype_count += target.hype_count;
            total_skip_votes += target.skip_votes;
            total_play_count += target.play_count;
            duplicates = Some(SongSummary {
                id: target.id,
                title: target.title,
            });
        }
    }

    let rows = sqlx::query(
        "SELECT id, title, hype_count, skip_votes, play_count FROM songs WHERE duplicate_of = ? ORDER BY id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let mut duplicated_by = Vec::with_capacity(rows.len());
    for row in &rows {
        total_hype_count += row.get::<i64, _>("hype_count");
        total_skip_votes += row.get::<i64, _>("skip_votes");
        total_play_count += row.get::<i64, _>("play_count");
        duplicated_by.push(summary_from_row(row));
    }

    Ok(SongInfo {
        song,
        duplicates,
        duplicated_by,
        total_hype_count,
        total_skip_votes,
        total_play_count,
    })
}

/// Non-duplicate songs that failed to resolve
pub async fn list_failed(pool: &SqlitePool, limit: i64) -> Result<SearchPage> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM songs WHERE has_failed = 1 AND duplicate_of IS NULL",
    )
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query(
        r#"
        SELECT id, title FROM songs
        WHERE has_failed = 1 AND duplicate_of IS NULL
        ORDER BY id
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(SearchPage {
        items: rows.iter().map(summary_from_row).collect(),
        total,
    })
}

/// Clear the failed flag of one song, or of every non-duplicate song
///
/// Returns the number of songs touched.
pub async fn clear_failed(pool: &SqlitePool, id: Option<SongId>) -> Result<u64> {
    let result = match id {
        Some(id) => {
            let result = sqlx::query("UPDATE songs SET has_failed = 0 WHERE id = ?")
                .bind(id)
                .execute(pool)
                .await?;
            if result.rows_affected() != 1 {
                return Err(JukeboxError::song_not_found(id));
            }
            result
        }
        None => {
            sqlx::query("UPDATE songs SET has_failed = 0 WHERE has_failed = 1 AND duplicate_of IS NULL")
                .execute(pool)
                .await?
        }
    };

    tracing::info!(song_id = ?id, cleared = result.rows_affected(), "Failed flags cleared");
    Ok(result.rows_affected())
}

/// Set or clear the failed flag after a resolution attempt
///
/// Returns `true` when the flag actually changed.
pub async fn set_failed(pool: &SqlitePool, id: SongId, failed: bool) -> Result<bool> {
    let result = sqlx::query("UPDATE songs SET has_failed = ? WHERE id = ? AND has_failed != ?")
        .bind(failed)
        .bind(id)
        .bind(failed)
        .execute(pool)
        .await?;

    let changed = result.rows_affected() == 1;
    if changed && failed {
        tracing::warn!(song_id = id, "Song marked as failed");
    } else if changed {
        tracing::info!(song_id = id, "Failed flag removed after a successful resolution");
    }
    Ok(changed)
}
