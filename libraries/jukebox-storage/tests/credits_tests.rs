//! Integration tests for credit renewal
//!
//! Tests:
//! - Whole periods only, partial progress carried over
//! - Clamping at the cap
//! - Checkpoint creation on first start
//! - Scheduler shutdown


use chrono::{DateTime, Duration, TimeZone, Utc};
use jukebox_core::EngineConfig;
use jukebox_storage::{credits, songs};
use sqlx::SqlitePool;
use std::time::Duration as StdDuration;
use test_helpers::*;
use tokio_util::sync::CancellationToken;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

async fn credits_of(pool: &SqlitePool, id: i64) -> i64 {
    songs::get_by_id(pool, id).await.unwrap().unwrap().credit_count
}

#[tokio::test]
async fn test_renew_adds_whole_periods_only() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let song = create_test_song(pool, "yt:a", "A", 100).await;
    set_song_state(pool, song, 0, 0).await;

    credits::ensure_checkpoint(pool, t0()).await.unwrap();

    let outcome = credits::renew(pool, t0() + Duration::minutes(210), Duration::hours(1), 5)
        .await
        .unwrap();

    assert_eq!(outcome.credits_added, 3);
    assert_eq!(outcome.checkpoint, t0() + Duration::hours(3));
    assert_eq!(credits::checkpoint(pool).await.unwrap(), t0() + Duration::hours(3));
    assert_eq!(credits_of(pool, song).await, 3);

    // The leftover half hour counts toward the next period
    let outcome = credits::renew(pool, t0() + Duration::hours(4), Duration::hours(1), 5)
        .await
        .unwrap();
    assert_eq!(outcome.credits_added, 1);
    assert_eq!(credits_of(pool, song).await, 4);
}

#[tokio::test]
async fn test_renew_before_full_period_does_nothing() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let song = create_test_song(pool, "yt:a", "A", 100).await;
    set_song_state(pool, song, 1, 0).await;

    credits::ensure_checkpoint(pool, t0()).await.unwrap();

    let outcome = credits::renew(pool, t0() + Duration::minutes(59), Duration::hours(1), 5)
        .await
        .unwrap();
    assert_eq!(outcome.credits_added, 0);
    assert_eq!(outcome.checkpoint, t0());
    assert_eq!(credits_of(pool, song).await, 1);

    // Clock going backwards is not a renewal either
    let outcome = credits::renew(pool, t0() - Duration::hours(5), Duration::hours(1), 5)
        .await
        .unwrap();
    assert_eq!(outcome.credits_added, 0);
    assert_eq!(credits::checkpoint(pool).await.unwrap(), t0());
}

#[tokio::test]
async fn test_renew_clamps_at_cap() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let low = create_test_song(pool, "yt:low", "Low", 100).await;
    let high = create_test_song(pool, "yt:high", "High", 100).await;
    let above = create_test_song(pool, "yt:above", "Above", 100).await;
    set_song_state(pool, low, 0, 0).await;
    set_song_state(pool, high, 4, 0).await;
    // Left over from a higher cap
    set_song_state(pool, above, 9, 0).await;

    credits::ensure_checkpoint(pool, t0()).await.unwrap();
    credits::renew(pool, t0() + Duration::hours(48), Duration::hours(1), 5)
        .await
        .unwrap();

    assert_eq!(credits_of(pool, low).await, 5);
    assert_eq!(credits_of(pool, high).await, 5);
    assert_eq!(credits_of(pool, above).await, 5);
}

#[tokio::test]
async fn test_ensure_checkpoint_is_idempotent() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();

    assert_eq!(credits::ensure_checkpoint(pool, t0()).await.unwrap(), t0());
    let later = t0() + Duration::hours(5);
    assert_eq!(credits::ensure_checkpoint(pool, later).await.unwrap(), t0());
    assert_eq!(credits::checkpoint(pool).await.unwrap(), t0());
}

#[tokio::test]
async fn test_first_renew_creates_checkpoint() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let song = create_test_song(pool, "yt:a", "A", 100).await;
    set_song_state(pool, song, 0, 0).await;

    let outcome = credits::renew(pool, t0(), Duration::hours(1), 5).await.unwrap();
    assert_eq!(outcome.credits_added, 0);
    assert_eq!(outcome.checkpoint, t0());
    assert_eq!(credits_of(pool, song).await, 0);
}

#[tokio::test]
async fn test_scheduler_stops_on_cancel() {
    let test_db = TestDb::new().await;
    let (jukebox, _resolver) = test_db.jukebox(EngineConfig {
        renewal_check_interval_secs: 1,
        ..EngineConfig::default()
    });

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(credits::run_scheduler(jukebox, cancel.clone()));

    // The first tick fires right away and creates the checkpoint
    tokio::time::sleep(StdDuration::from_millis(200)).await;
    cancel.cancel();

    tokio::time::timeout(StdDuration::from_secs(5), handle)
        .await
        .expect("scheduler did not stop")
        .unwrap();

    assert!(credits::checkpoint(test_db.pool()).await.is_ok());
}
