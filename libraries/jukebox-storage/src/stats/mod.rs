//! Post-play statistics

use chrono::{DateTime, Utc};
use jukebox_core::{JukeboxError, PlayRecord, Result, UserId};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::{to_timestamp, users};

async fn bump_given(
    tx: &mut Transaction<'_, Sqlite>,
    column: &str,
    voters: impl Iterator<Item = UserId>,
    default_rotate: bool,
) -> Result<()> {
    let sql = format!("UPDATE users SET {column} = {column} + 1 WHERE id = ?");
    for user_id in voters {
        users::get_or_create(&mut **tx, user_id, default_rotate).await?;
        sqlx::query(&sql).bind(user_id).execute(&mut **tx).await?;
    }
    Ok(())
}

/// Apply the outcome of a finished play
///
/// Updates the song, the requesting user and every voter in one
/// transaction. The credit balance never drops below zero.
pub async fn record_outcome(
    pool: &SqlitePool,
    record: &PlayRecord,
    now: DateTime<Utc>,
    default_rotate: bool,
) -> Result<()> {
    let hypes = record.hype_count() as i64;
    let skips = record.skip_votes() as i64;

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE songs
        SET hype_count = hype_count + ?,
            skip_votes = skip_votes + ?,
            play_count = play_count + 1,
            last_played = ?,
            credit_count = MAX(credit_count - 1, 0)
        WHERE id = ?
        "#,
    )
    .bind(hypes)
    .bind(skips)
    .bind(to_timestamp(now))
    .bind(record.song_id())
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() != 1 {
        return Err(JukeboxError::song_not_found(record.song_id()));
    }

    if let Some(user_id) = record.user_id() {
        users::get_or_create(&mut *tx, user_id, default_rotate).await?;
        sqlx::query(
            r#"
            UPDATE users
            SET hype_count_got = hype_count_got + ?,
                skip_votes_got = skip_votes_got + ?,
                play_count = play_count + 1
            WHERE id = ?
            "#,
        )
        .bind(hypes)
        .bind(skips)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    }

    bump_given(&mut tx, "hype_count_given", record.hypes().iter().copied(), default_rotate).await?;
    bump_given(&mut tx, "skip_votes_given", record.skips().iter().copied(), default_rotate).await?;

    tx.commit().await?;

    tracing::debug!(
        song_id = record.song_id(),
        user_id = ?record.user_id(),
        hypes,
        skips,
        "Play outcome recorded"
    );
    Ok(())
}
