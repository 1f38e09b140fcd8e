//! End-to-end tests for collection, guessing and marker refresh on a
//! file-backed catalog.

use lyricwalk_core::model::{Category, LatLng, NewMarker};
use lyricwalk_core::schema::{Database, SCHEMA_VERSION};
use lyricwalk_game::{
    refresh_markers, CatalogStore, CollectionEngine, CollectionOutcome, GameError, GuessEngine,
    GuessResult, OPTION_COUNT,
};
use tempfile::TempDir;

const QUAD: LatLng = LatLng::new(51.6187, -3.8790);

async fn open_store(dir: &TempDir) -> CatalogStore {
    CatalogStore::open(dir.path().join("catalog.db"))
        .await
        .expect("Failed to open catalog store")
}

/// Leave exactly one uncollected Current song and no uncollected Classic songs.
async fn leave_one_current_song(store: &CatalogStore) -> i64 {
    let current = store
        .list_uncollected_songs(Category::Current)
        .await
        .unwrap();
    for song in &current[1..] {
        store.set_collected(song.id, Category::Current).await.unwrap();
    }
    for song in store
        .list_uncollected_songs(Category::Classic)
        .await
        .unwrap()
    {
        store.set_collected(song.id, Category::Classic).await.unwrap();
    }
    current[0].id
}

#[tokio::test]
async fn test_store_creates_and_seeds_file() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    assert_eq!(store.schema_version().await.unwrap(), SCHEMA_VERSION);
    let stats = store.stats().await.unwrap();
    assert_eq!(stats.current.total, 20);
    assert_eq!(stats.classic.total, 19);
    assert_eq!(stats.current.markers + stats.classic.markers, 39);
}

#[tokio::test]
async fn test_collect_last_current_song() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let song_id = leave_one_current_song(&store).await;

    let marker = store
        .insert_marker(NewMarker::new(QUAD, Category::Current))
        .await
        .unwrap();
    let engine = CollectionEngine::new(store.clone());

    let user = QUAD.offset_by_meters(5.0, -5.0);
    let outcome = engine.attempt_collect(&marker, user).await.unwrap();

    match outcome {
        CollectionOutcome::Collected(song) => {
            assert_eq!(song.id, song_id);
            assert!(song.is_collected);
        }
        other => panic!("expected Collected, got {other:?}"),
    }
    assert!(store
        .list_uncollected_songs(Category::Current)
        .await
        .unwrap()
        .is_empty());
    assert!(store.get_marker(marker.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_too_far_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let marker = store
        .insert_marker(NewMarker::new(QUAD, Category::Classic))
        .await
        .unwrap();
    let before = store.stats().await.unwrap();

    let engine = CollectionEngine::new(store.clone());
    let outcome = engine
        .attempt_collect(&marker, QUAD.offset_by_meters(51.0, 0.0))
        .await
        .unwrap();

    assert!(matches!(outcome, CollectionOutcome::TooFar { distance_m } if distance_m > 50.0));
    assert_eq!(store.stats().await.unwrap(), before);
    assert_eq!(store.get_marker(marker.id).await.unwrap(), marker);
}

#[tokio::test]
async fn test_custom_radius() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let marker = store
        .insert_marker(NewMarker::new(QUAD, Category::Classic))
        .await
        .unwrap();

    let engine = CollectionEngine::new(store.clone()).with_radius(100.0);
    let outcome = engine
        .attempt_collect(&marker, QUAD.offset_by_meters(75.0, 0.0))
        .await
        .unwrap();
    assert!(outcome.is_collected());
}

#[tokio::test]
async fn test_repeat_collect_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let marker = store.list_markers().await.unwrap().remove(0);
    let engine = CollectionEngine::new(store.clone());

    let first = engine.attempt_collect(&marker, marker.position).await.unwrap();
    assert!(first.is_collected());
    let counts = store.uncollected_counts().await.unwrap();

    let err = engine
        .attempt_collect(&marker, marker.position)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(store.uncollected_counts().await.unwrap(), counts);
}

#[tokio::test]
async fn test_collect_nearest() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let engine = CollectionEngine::new(store.clone());

    let target = store.list_markers().await.unwrap().remove(3);
    let (nearby, outcome) = engine
        .collect_nearest(target.position)
        .await
        .unwrap()
        .expect("campus has markers");

    assert_eq!(nearby.marker.id, target.id);
    assert!(nearby.distance_m < 1e-6);
    assert!(outcome.is_collected());
}

#[tokio::test]
async fn test_guess_flow() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    store.set_collected(2, Category::Classic).await.unwrap();

    let guess = GuessEngine::new(store.clone());
    let (song, challenge) = guess.challenge_for(2, Category::Classic, 11).await.unwrap();

    assert_eq!(challenge.options.len(), OPTION_COUNT);
    assert_eq!(challenge.correct_label(), song.label());
    assert_eq!(
        challenge
            .options
            .iter()
            .filter(|o| **o == song.label())
            .count(),
        1
    );

    let wrong = (challenge.correct_index + 1) % OPTION_COUNT;
    let result = guess
        .submit_answer(&song, wrong, challenge.correct_index)
        .await
        .unwrap();
    assert_eq!(result, GuessResult::Incorrect);
    assert!(!store.get_song(2, Category::Classic).await.unwrap().is_guessed);

    let result = guess
        .submit_answer(&song, challenge.correct_index, challenge.correct_index)
        .await
        .unwrap();
    assert_eq!(result, GuessResult::Correct);
    assert!(store.get_song(2, Category::Classic).await.unwrap().is_guessed);
}

#[tokio::test]
async fn test_submit_out_of_range_answer() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let song = store.get_song(1, Category::Current).await.unwrap();

    let err = GuessEngine::new(store.clone())
        .submit_answer(&song, OPTION_COUNT, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::InvalidAnswer { .. }));
    assert!(!store.get_song(1, Category::Current).await.unwrap().is_guessed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_refresh_and_collect_are_serialized() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let engine = CollectionEngine::new(store.clone());

    for _ in 0..5 {
        let marker = store.list_markers().await.unwrap().remove(0);

        let refresh = {
            let store = store.clone();
            tokio::spawn(async move { refresh_markers(&store, 0).await })
        };
        let collect = {
            let engine = engine.clone();
            let marker = marker.clone();
            tokio::spawn(async move { engine.attempt_collect(&marker, marker.position).await })
        };

        let report = refresh.await.unwrap().unwrap();
        let collected = collect.await.unwrap();

        // Either the collect ran first (song taken, marker gone before the
        // refresh rebuilt the table) or the refresh ran first (marker id gone).
        match collected {
            Ok(outcome) => assert!(outcome.is_collected()),
            Err(e) => assert!(e.is_not_found()),
        }

        let counts = store.uncollected_counts().await.unwrap();
        let markers = store.list_markers().await.unwrap();
        assert_eq!(markers.len(), counts.total());
        assert!(markers.iter().all(|m| m.id != marker.id));
        assert!(report.exhausted.is_empty());
    }
}

#[tokio::test]
async fn test_version_mismatch_reseeds_through_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.db");

    {
        let db = Database::open(&path).unwrap();
        db.set_favourite(1, Category::Current, true).unwrap();
        db.conn()
            .execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION + 7))
            .unwrap();
    }

    let store = CatalogStore::open(&path).await.unwrap();
    assert_eq!(store.schema_version().await.unwrap(), SCHEMA_VERSION);
    assert!(store.list_favourite_songs().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_closed_store_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let engine = CollectionEngine::new(store.clone());
    let marker = store.list_markers().await.unwrap().remove(0);

    store.close().await;

    let err = engine
        .attempt_collect(&marker, marker.position)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GameError::Store(lyricwalk_core::Error::StoreUnavailable(_))
    ));
}
