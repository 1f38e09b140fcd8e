//! Async, single-writer access to the catalog.
//!
//! The synchronous [`Database`] lives behind one `tokio::sync::Mutex` and
//! every call runs on the blocking pool while holding that lock, so
//! collection, guessing and marker refresh never interleave.

use lyricwalk_core::geofence::{MarkerCounts, DEFAULT_MAX_ATTEMPTS_PER_MARKER};
use lyricwalk_core::model::{Category, Marker, NewMarker, NewSong, Song};
use lyricwalk_core::schema::{CatalogStats, Database, RepopulateReport};
use lyricwalk_core::Error;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{GameError, GameResult};

enum StoreState {
    Uninitialized,
    Creating,
    Ready(Database),
}

impl StoreState {
    const fn status(&self) -> StoreStatus {
        match self {
            Self::Uninitialized => StoreStatus::Uninitialized,
            Self::Creating => StoreStatus::Creating,
            Self::Ready(_) => StoreStatus::Ready,
        }
    }
}

/// Lifecycle of a [`CatalogStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StoreStatus {
    Uninitialized,
    Creating,
    Ready,
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Creating => "creating",
            Self::Ready => "ready",
        };
        f.write_str(s)
    }
}

/// Shared handle to the catalog. Cloning is cheap; clones share one lock.
#[derive(Clone)]
pub struct CatalogStore {
    state: Arc<Mutex<StoreState>>,
}

impl fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self
            .state
            .try_lock()
            .map(|state| state.status().to_string())
            .unwrap_or_else(|_| "busy".to_string());
        f.debug_struct("CatalogStore")
            .field("status", &status)
            .finish()
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    /// A store that has not been opened. Every operation fails with
    /// `StoreUnavailable` until [`initialize`](Self::initialize) succeeds.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::Uninitialized)),
        }
    }

    /// Open (creating and seeding if needed) the catalog at `path`.
    pub async fn open(path: impl Into<PathBuf>) -> GameResult<Self> {
        Self::open_with(path, DEFAULT_MAX_ATTEMPTS_PER_MARKER).await
    }

    /// Open the catalog with a custom marker sampling cap.
    pub async fn open_with(
        path: impl Into<PathBuf>,
        max_attempts_per_marker: usize,
    ) -> GameResult<Self> {
        let path = path.into();
        let store = Self::new();
        store
            .initialize(move || Database::open_with(&path, max_attempts_per_marker))
            .await?;
        Ok(store)
    }

    /// Open a seeded in-memory catalog.
    pub async fn open_in_memory() -> GameResult<Self> {
        let store = Self::new();
        store.initialize(Database::open_in_memory).await?;
        Ok(store)
    }

    /// Move the store from `Uninitialized` through `Creating` to `Ready`.
    ///
    /// The lock is released while `open` runs, so concurrent callers see
    /// `Creating` and fail fast instead of queueing behind schema creation.
    /// A failed open returns the store to `Uninitialized`.
    ///
    /// The open and the final state change run on their own task, so a
    /// caller that is cancelled midway never leaves the store in `Creating`.
    pub async fn initialize<F>(&self, open: F) -> GameResult<()>
    where
        F: FnOnce() -> lyricwalk_core::Result<Database> + Send + 'static,
    {
        {
            let mut state = self.state.lock().await;
            match *state {
                StoreState::Ready(_) => return Ok(()),
                StoreState::Creating => {
                    return Err(Error::StoreUnavailable(
                        "catalog is already being created".to_string(),
                    )
                    .into())
                }
                StoreState::Uninitialized => *state = StoreState::Creating,
            }
        }

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let opened = tokio::task::spawn_blocking(open).await;

            let mut state = state.lock().await;
            match opened {
                Ok(Ok(db)) => {
                    *state = StoreState::Ready(db);
                    log::info!("Catalog store ready");
                    Ok(())
                }
                Ok(Err(e)) => {
                    *state = StoreState::Uninitialized;
                    log::warn!("Catalog store failed to open: {}", e);
                    Err(GameError::from(e))
                }
                Err(e) => {
                    *state = StoreState::Uninitialized;
                    Err(GameError::from(e))
                }
            }
        })
        .await?
    }

    /// Drop the open database. Later operations fail with `StoreUnavailable`.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        *state = StoreState::Uninitialized;
        log::debug!("Catalog store closed");
    }

    pub async fn status(&self) -> StoreStatus {
        self.state.lock().await.status()
    }

    /// Run `f` against the open database on the blocking pool, holding the
    /// store lock for the whole call.
    pub async fn with_db<F, T, E>(&self, f: F) -> GameResult<T>
    where
        F: FnOnce(&mut Database) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<Error> + Send + 'static,
        GameError: From<E>,
    {
        let mut guard = Arc::clone(&self.state).lock_owned().await;
        let output = tokio::task::spawn_blocking(move || match &mut *guard {
            StoreState::Ready(db) => f(db),
            StoreState::Creating => Err(E::from(Error::StoreUnavailable(
                "catalog is being created".to_string(),
            ))),
            StoreState::Uninitialized => Err(E::from(Error::StoreUnavailable(
                "catalog is not open".to_string(),
            ))),
        })
        .await??;
        Ok(output)
    }

    pub async fn schema_version(&self) -> GameResult<u32> {
        self.with_db(|db| db.schema_version()).await
    }

    pub async fn list_markers(&self) -> GameResult<Vec<Marker>> {
        self.with_db(|db| db.list_markers()).await
    }

    pub async fn get_marker(&self, marker_id: i64) -> GameResult<Marker> {
        self.with_db(move |db| db.get_marker(marker_id)).await
    }

    pub async fn insert_marker(&self, marker: NewMarker) -> GameResult<Marker> {
        self.with_db(move |db| db.insert_marker(&marker)).await
    }

    pub async fn delete_marker(&self, marker_id: i64) -> GameResult<usize> {
        self.with_db(move |db| db.delete_marker(marker_id)).await
    }

    pub async fn insert_song(&self, song: NewSong) -> GameResult<Song> {
        self.with_db(move |db| db.insert_song(&song)).await
    }

    pub async fn get_song(&self, song_id: i64, category: Category) -> GameResult<Song> {
        self.with_db(move |db| db.get_song(song_id, category)).await
    }

    pub async fn list_uncollected_songs(&self, category: Category) -> GameResult<Vec<Song>> {
        self.with_db(move |db| db.list_uncollected_songs(category))
            .await
    }

    pub async fn list_collected_songs(
        &self,
        category: Category,
        collected: Option<bool>,
    ) -> GameResult<Vec<Song>> {
        self.with_db(move |db| db.list_collected_songs(category, collected))
            .await
    }

    pub async fn list_favourite_songs(&self) -> GameResult<Vec<Song>> {
        self.with_db(|db| db.list_favourite_songs()).await
    }

    pub async fn random_songs(&self, category: Category, count: usize) -> GameResult<Vec<Song>> {
        self.with_db(move |db| db.random_songs(category, count))
            .await
    }

    pub async fn set_collected(&self, song_id: i64, category: Category) -> GameResult<usize> {
        self.with_db(move |db| db.set_collected(song_id, category))
            .await
    }

    pub async fn set_guessed(&self, song_id: i64, category: Category) -> GameResult<usize> {
        self.with_db(move |db| db.set_guessed(song_id, category))
            .await
    }

    pub async fn set_favourite(
        &self,
        song_id: i64,
        category: Category,
        favourite: bool,
    ) -> GameResult<usize> {
        self.with_db(move |db| db.set_favourite(song_id, category, favourite))
            .await
    }

    pub async fn uncollected_counts(&self) -> GameResult<MarkerCounts> {
        self.with_db(|db| db.uncollected_counts()).await
    }

    /// Regenerate every marker from the current uncollected counts.
    pub async fn repopulate_markers(&self) -> GameResult<RepopulateReport> {
        self.with_db(|db| db.repopulate_markers(&mut rand::rng()))
            .await
    }

    pub async fn collect_song_for_marker(&self, marker_id: i64) -> GameResult<Option<Song>> {
        self.with_db(move |db| db.collect_song_for_marker(marker_id))
            .await
    }

    pub async fn stats(&self) -> GameResult<CatalogStats> {
        self.with_db(|db| db.stats()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn is_unavailable(err: &GameError) -> bool {
        matches!(err, GameError::Store(Error::StoreUnavailable(_)))
    }

    #[tokio::test]
    async fn test_new_store_is_unavailable() {
        let store = CatalogStore::new();
        assert_eq!(store.status().await, StoreStatus::Uninitialized);

        let err = store.list_markers().await.unwrap_err();
        assert!(is_unavailable(&err));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_open_in_memory_is_ready() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        assert_eq!(store.status().await, StoreStatus::Ready);
        assert_eq!(store.list_markers().await.unwrap().len(), 39);
    }

    #[tokio::test]
    async fn test_close_makes_store_unavailable() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        let clone = store.clone();
        store.close().await;

        assert!(is_unavailable(&clone.stats().await.unwrap_err()));
    }

    #[tokio::test]
    async fn test_failed_open_returns_to_uninitialized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("catalog.db");

        let store = CatalogStore::new();
        let result = store
            .initialize(move || Database::open(&path))
            .await;
        assert!(result.is_err());
        assert_eq!(store.status().await, StoreStatus::Uninitialized);

        // A later, successful initialize recovers the store.
        store.initialize(Database::open_in_memory).await.unwrap();
        assert_eq!(store.status().await, StoreStatus::Ready);
    }

    #[tokio::test]
    async fn test_operations_during_creation_are_unavailable() {
        let store = CatalogStore::new();
        let (started_tx, started_rx) = std::sync::mpsc::channel::<()>();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        let opener = store.clone();
        let init = tokio::spawn(async move {
            opener
                .initialize(move || {
                    started_tx.send(()).ok();
                    release_rx.recv().ok();
                    Database::open_in_memory()
                })
                .await
        });

        tokio::task::spawn_blocking(move || started_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(store.status().await, StoreStatus::Creating);
        assert!(is_unavailable(&store.list_markers().await.unwrap_err()));
        assert!(is_unavailable(
            &store
                .initialize(Database::open_in_memory)
                .await
                .unwrap_err()
        ));

        release_tx.send(()).unwrap();
        init.await.unwrap().unwrap();
        assert_eq!(store.status().await, StoreStatus::Ready);
    }

    #[tokio::test]
    async fn test_cancelled_initialize_still_finishes() {
        let store = CatalogStore::new();
        let (started_tx, started_rx) = std::sync::mpsc::channel::<()>();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        let opener = store.clone();
        let init = tokio::spawn(async move {
            opener
                .initialize(move || {
                    started_tx.send(()).ok();
                    release_rx.recv().ok();
                    Database::open_in_memory()
                })
                .await
        });

        tokio::task::spawn_blocking(move || started_rx.recv())
            .await
            .unwrap()
            .unwrap();
        init.abort();
        assert!(init.await.unwrap_err().is_cancelled());
        release_tx.send(()).unwrap();

        let mut status = store.status().await;
        for _ in 0..100 {
            if status == StoreStatus::Ready {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            status = store.status().await;
        }
        assert_eq!(status, StoreStatus::Ready);
        assert_eq!(store.list_markers().await.unwrap().len(), 39);
        store.initialize(Database::open_in_memory).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_ids_are_noops() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        assert_eq!(store.set_guessed(9999, Category::Classic).await.unwrap(), 0);
        assert_eq!(store.delete_marker(9999).await.unwrap(), 0);
        assert!(store
            .get_song(9999, Category::Classic)
            .await
            .unwrap_err()
            .is_not_found());
    }
}
