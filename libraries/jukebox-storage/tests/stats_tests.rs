//! Integration tests for post-play statistics


use chrono::{TimeZone, Utc};
use jukebox_core::{EngineConfig, JukeboxError, PlayRecord};
use jukebox_storage::{songs, stats, users};
use test_helpers::*;

#[tokio::test]
async fn test_record_updates_song_requester_and_voters() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let song_id = create_test_song(pool, "yt:a", "A", 100).await;
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 20, 0, 0).unwrap();

    let mut record = PlayRecord::new(
        Some(1),
        song_id,
        "A".to_string(),
        100,
        "https://cdn.example/a".to_string(),
    );
    assert!(record.hype(2));
    assert!(record.hype(3));
    assert!(!record.hype(2));
    assert!(record.skip(4));
    // The requester cannot vote on their own song
    assert!(!record.hype(1));

    stats::record_outcome(pool, &record, now, false).await.unwrap();

    let song = songs::get_by_id(pool, song_id).await.unwrap().unwrap();
    assert_eq!(song.hype_count, 2);
    assert_eq!(song.skip_votes, 1);
    assert_eq!(song.play_count, 1);
    assert_eq!(song.credit_count, 2);
    assert_eq!(song.last_played, now);

    let requester = users::get(pool, 1).await.unwrap().unwrap();
    assert_eq!(requester.hype_count_got, 2);
    assert_eq!(requester.skip_votes_got, 1);
    assert_eq!(requester.play_count, 1);

    // Voters are created on first sight
    let voter = users::get(pool, 2).await.unwrap().unwrap();
    assert_eq!(voter.hype_count_given, 1);
    assert_eq!(voter.skip_votes_given, 0);
    let skipper = users::get(pool, 4).await.unwrap().unwrap();
    assert_eq!(skipper.skip_votes_given, 1);
    assert_eq!(skipper.play_count, 0);
}

#[tokio::test]
async fn test_credit_never_goes_negative() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let song_id = create_test_song(pool, "yt:a", "A", 100).await;
    set_song_state(pool, song_id, 0, 0).await;

    let record = PlayRecord::new(
        None,
        song_id,
        "A".to_string(),
        100,
        "https://cdn.example/a".to_string(),
    );
    stats::record_outcome(pool, &record, Utc::now(), false).await.unwrap();

    let song = songs::get_by_id(pool, song_id).await.unwrap().unwrap();
    assert_eq!(song.credit_count, 0);
    assert_eq!(song.play_count, 1);
}

#[tokio::test]
async fn test_autoplay_record_has_no_requester() {
    let test_db = TestDb::new().await;
    let (jukebox, resolver) = test_db.jukebox(EngineConfig::default());
    resolver.add_song("yt:good", "Good", 200);
    let song_id = create_test_song(test_db.pool(), "yt:good", "Good", 200).await;
    set_song_votes(test_db.pool(), song_id, 3, 0).await;

    let mut record = jukebox.next_autoplay().await.unwrap().unwrap();
    assert_eq!(record.user_id(), None);
    assert!(record.hype(5));
    jukebox.record_outcome(&record).await.unwrap();

    let song = songs::get_by_id(test_db.pool(), song_id).await.unwrap().unwrap();
    assert_eq!(song.hype_count, 4);
    assert_eq!(song.play_count, 1);

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(test_db.pool())
        .await
        .unwrap();
    assert_eq!(users, 1);
}

#[tokio::test]
async fn test_unknown_song_is_not_found() {
    let test_db = TestDb::new().await;
    let record = PlayRecord::new(Some(1), 404, "Gone".to_string(), 1, String::new());

    let err = stats::record_outcome(test_db.pool(), &record, Utc::now(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, JukeboxError::NotFound { .. }));

    // Nothing was written for the requester
    assert!(users::get(test_db.pool(), 1).await.unwrap().is_none());
}
