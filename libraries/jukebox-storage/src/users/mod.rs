use jukebox_core::{JukeboxError, Result, User, UserId};
use sqlx::{Row, SqliteExecutor, SqlitePool};

/// Create the user on first interaction
///
/// Existing users are left untouched, including their rotate mode.
pub async fn get_or_create<'e, E>(executor: E, id: UserId, default_rotate: bool) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO users (id, rotate)
        VALUES (?, ?)
        ON CONFLICT(id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(default_rotate)
    .execute(executor)
    .await?;

    Ok(())
}

/// Get user snapshot by ID
pub async fn get<'e, E>(executor: E, id: UserId) -> Result<Option<User>>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(
        r#"
        SELECT id, playlist_head, rotate,
               hype_count_got, hype_count_given,
               skip_votes_got, skip_votes_given, play_count
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|row| User {
        id: row.get("id"),
        playlist_head: row.get("playlist_head"),
        rotate: row.get::<i64, _>("rotate") != 0,
        hype_count_got: row.get("hype_count_got"),
        hype_count_given: row.get("hype_count_given"),
        skip_votes_got: row.get("skip_votes_got"),
        skip_votes_given: row.get("skip_votes_given"),
        play_count: row.get("play_count"),
    }))
}

pub async fn get_rotate(pool: &SqlitePool, id: UserId, default_rotate: bool) -> Result<bool> {
    get_or_create(pool, id, default_rotate).await?;
    let user = get(pool, id)
        .await?
        .ok_or_else(|| JukeboxError::not_found("User", id))?;
    Ok(user.rotate)
}

pub async fn set_rotate(pool: &SqlitePool, id: UserId, rotate: bool) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, rotate)
        VALUES (?, ?)
        ON CONFLICT(id) DO UPDATE SET rotate = excluded.rotate
        "#,
    )
    .bind(id)
    .bind(rotate)
    .execute(pool)
    .await?;

    Ok(())
}

/// Number of entries in the user's playlist
pub async fn playlist_len<'e, E>(executor: E, id: UserId) -> Result<i64>
where
    E: SqliteExecutor<'e>,
{
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM playlist_entries WHERE user_id = ?")
        .bind(id)
        .fetch_one(executor)
        .await?;

    Ok(count)
}
