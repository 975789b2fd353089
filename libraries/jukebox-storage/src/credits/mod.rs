//! Credit economy
//!
//! Every play costs a song one credit. Credits come back with wall-clock
//! time: for each full renewal period elapsed since the persisted checkpoint
//! every song earns one credit, up to the cap. The checkpoint advances by
//! whole periods only, so partial progress carries over and a renewal that
//! was missed while the process was down is caught up in one step.

use chrono::{DateTime, Duration, Utc};
use jukebox_core::Result;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use crate::context::Jukebox;
use crate::{from_timestamp, to_timestamp};

/// Result of a single renewal cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewalOutcome {
    /// Credits added to every song (before clamping at the cap)
    pub credits_added: i64,
    /// Checkpoint after the cycle
    pub checkpoint: DateTime<Utc>,
}

/// Create the checkpoint on first start
///
/// Returns the stored checkpoint, which is `now` only when it was just
/// created.
pub async fn ensure_checkpoint(pool: &SqlitePool, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let result = sqlx::query(
        "INSERT INTO credit_checkpoint (id, last_renewal) VALUES (1, ?) ON CONFLICT(id) DO NOTHING",
    )
    .bind(to_timestamp(now))
    .execute(pool)
    .await?;

    if result.rows_affected() == 1 {
        tracing::info!(checkpoint = %now, "Credit checkpoint created");
    }

    checkpoint(pool).await
}

pub async fn checkpoint(pool: &SqlitePool) -> Result<DateTime<Utc>> {
    let secs: i64 = sqlx::query_scalar("SELECT last_renewal FROM credit_checkpoint WHERE id = 1")
        .fetch_one(pool)
        .await?;

    Ok(from_timestamp(secs))
}

/// Run one renewal cycle as of `now`
///
/// With `n` whole periods elapsed since the checkpoint, adds `n` credits to
/// every song (clamped at `cap`) and moves the checkpoint forward by exactly
/// `n` periods, both in one transaction. Does nothing when `n` is zero.
pub async fn renew(
    pool: &SqlitePool,
    now: DateTime<Utc>,
    period: Duration,
    cap: i64,
) -> Result<RenewalOutcome> {
    let mut tx = pool.begin().await?;

    // Nothing to catch up on before the first checkpoint
    sqlx::query(
        "INSERT INTO credit_checkpoint (id, last_renewal) VALUES (1, ?) ON CONFLICT(id) DO NOTHING",
    )
    .bind(to_timestamp(now))
    .execute(&mut *tx)
    .await?;

    let last: i64 = sqlx::query_scalar("SELECT last_renewal FROM credit_checkpoint WHERE id = 1")
        .fetch_one(&mut *tx)
        .await?;
    let last = from_timestamp(last);

    let period_secs = period.num_seconds().max(1);
    let elapsed_secs = (now - last).num_seconds();
    let periods = if elapsed_secs > 0 {
        elapsed_secs / period_secs
    } else {
        0
    };

    if periods == 0 {
        tx.commit().await?;
        return Ok(RenewalOutcome {
            credits_added: 0,
            checkpoint: last,
        });
    }

    let checkpoint = last + Duration::seconds(periods * period_secs);

    sqlx::query("UPDATE credit_checkpoint SET last_renewal = ? WHERE id = 1")
        .bind(to_timestamp(checkpoint))
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE songs SET credit_count = MIN(credit_count + ?, ?)")
        .bind(periods)
        .bind(cap)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(credits_added = periods, checkpoint = %checkpoint, "Song credits renewed");

    Ok(RenewalOutcome {
        credits_added: periods,
        checkpoint,
    })
}

/// Run the credit renewal loop
///
/// Wakes up every `renewal_check_interval` and runs one cycle. Runs until
/// `cancel` is triggered; a cycle in progress finishes before the loop exits.
pub async fn run_scheduler(jukebox: Jukebox, cancel: CancellationToken) {
    let wake_interval = jukebox.config().renewal_check_interval();

    tracing::info!(
        interval_secs = wake_interval.as_secs(),
        renewal_hours = jukebox.config().credit_renewal_hours,
        "Credit renewal task started"
    );

    let mut interval = tokio::time::interval(wake_interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Credit renewal task stopping");
                break;
            }
            _ = interval.tick() => {
                match jukebox.renew_credits().await {
                    Ok(outcome) => {
                        if outcome.credits_added == 0 {
                            tracing::debug!(checkpoint = %outcome.checkpoint, "Credit renewal: nothing to add yet");
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "Credit renewal failed"),
                }
            }
        }
    }
}
