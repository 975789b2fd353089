//! Integration tests for the duplicate relation
//!
//! Tests:
//! - Merge, cascade redirect and redirect to the root
//! - Reverse merge undoing the previous relation
//! - Split and self-merge
//! - Relation depth after arbitrary operation sequences


use jukebox_core::{JukeboxError, SongId};
use jukebox_storage::{duplicates, songs};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sqlx::SqlitePool;
use test_helpers::*;

async fn duplicate_of(pool: &SqlitePool, id: SongId) -> Option<SongId> {
    songs::get_by_id(pool, id).await.unwrap().unwrap().duplicate_of
}

async fn three_songs(pool: &SqlitePool) -> (SongId, SongId, SongId) {
    (
        create_test_song(pool, "yt:a", "A", 100).await,
        create_test_song(pool, "yt:b", "B", 100).await,
        create_test_song(pool, "yt:c", "C", 100).await,
    )
}

#[tokio::test]
async fn test_merge_marks_duplicate() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let (a, b, _) = three_songs(pool).await;

    duplicates::merge(pool, a, b).await.unwrap();

    assert_eq!(duplicate_of(pool, a).await, Some(b));
    assert_eq!(duplicate_of(pool, b).await, None);
}

#[tokio::test]
async fn test_merge_redirects_existing_duplicates() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let (a, b, c) = three_songs(pool).await;

    duplicates::merge(pool, a, b).await.unwrap();
    duplicates::merge(pool, b, c).await.unwrap();

    assert_eq!(duplicate_of(pool, a).await, Some(c));
    assert_eq!(duplicate_of(pool, b).await, Some(c));
    assert_eq!(duplicate_of(pool, c).await, None);
}

#[tokio::test]
async fn test_merge_into_duplicate_uses_its_target() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let (a, b, c) = three_songs(pool).await;

    duplicates::merge(pool, b, c).await.unwrap();
    duplicates::merge(pool, a, b).await.unwrap();

    assert_eq!(duplicate_of(pool, a).await, Some(c));
    assert_eq!(duplicate_of(pool, b).await, Some(c));
}

#[tokio::test]
async fn test_reverse_merge_swaps_roles() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let (a, b, c) = three_songs(pool).await;

    duplicates::merge(pool, a, b).await.unwrap();
    duplicates::merge(pool, c, b).await.unwrap();
    duplicates::merge(pool, b, a).await.unwrap();

    assert_eq!(duplicate_of(pool, a).await, None);
    assert_eq!(duplicate_of(pool, b).await, Some(a));
    assert_eq!(duplicate_of(pool, c).await, Some(a));
}

#[tokio::test]
async fn test_split_clears_relation() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let (a, b, _) = three_songs(pool).await;

    duplicates::merge(pool, a, b).await.unwrap();
    duplicates::split(pool, a).await.unwrap();
    assert_eq!(duplicate_of(pool, a).await, None);

    // Splitting again is fine
    duplicates::split(pool, a).await.unwrap();
    assert_eq!(duplicate_of(pool, a).await, None);
}

#[tokio::test]
async fn test_self_merge_splits() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let (a, b, _) = three_songs(pool).await;

    duplicates::merge(pool, a, a).await.unwrap();
    assert_eq!(duplicate_of(pool, a).await, None);

    duplicates::merge(pool, a, b).await.unwrap();
    duplicates::merge(pool, a, a).await.unwrap();
    assert_eq!(duplicate_of(pool, a).await, None);
}

#[tokio::test]
async fn test_missing_songs_are_not_found() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();
    let (a, _, _) = three_songs(pool).await;

    let err = duplicates::merge(pool, a, 999).await.unwrap_err();
    assert!(matches!(err, JukeboxError::NotFound { .. }));
    let err = duplicates::merge(pool, 999, a).await.unwrap_err();
    assert!(matches!(err, JukeboxError::NotFound { .. }));
    let err = duplicates::split(pool, 999).await.unwrap_err();
    assert!(matches!(err, JukeboxError::NotFound { .. }));

    // Failed merges leave nothing behind
    assert_eq!(duplicate_of(pool, a).await, None);
}

#[tokio::test]
async fn test_relation_stays_one_hop_deep() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();

    let mut ids = Vec::new();
    for n in 0..6 {
        ids.push(create_test_song(pool, &format!("yt:dup{n}"), &format!("Dup {n}"), 100).await);
    }

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let source = ids[rng.gen_range(0..ids.len())];
        if rng.gen_bool(0.15) {
            duplicates::split(pool, source).await.unwrap();
        } else {
            let target = ids[rng.gen_range(0..ids.len())];
            duplicates::merge(pool, source, target).await.unwrap();
        }

        for &id in &ids {
            if let Some(target) = duplicate_of(pool, id).await {
                assert_ne!(target, id);
                assert_eq!(
                    duplicate_of(pool, target).await,
                    None,
                    "song {id} points at duplicate {target}"
                );
            }
        }
    }
}
