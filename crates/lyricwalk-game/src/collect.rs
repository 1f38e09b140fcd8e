//! Proximity collection: turning a nearby marker into a collected song.

use lyricwalk_core::model::{LatLng, Marker, Song};
use lyricwalk_core::schema::Database;
use serde::Serialize;

use crate::error::GameResult;
use crate::store::CatalogStore;

/// Default collection radius in metres.
pub const DEFAULT_COLLECT_RADIUS_M: f64 = 50.0;

/// What happened when the user tried to collect a marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CollectionOutcome {
    /// The user is not close enough. Nothing changed.
    TooFar { distance_m: f64 },
    /// The marker's category has no uncollected songs. Nothing changed.
    NoSongsAvailable,
    /// The song is now collected and the marker is gone.
    Collected(Song),
}

impl CollectionOutcome {
    pub const fn is_collected(&self) -> bool {
        matches!(self, Self::Collected(_))
    }
}

/// A marker together with its distance from the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyMarker {
    pub marker: Marker,
    pub distance_m: f64,
}

/// The marker closest to `user`, if any.
pub fn nearest_marker(markers: &[Marker], user: LatLng) -> Option<NearbyMarker> {
    markers
        .iter()
        .map(|marker| NearbyMarker {
            distance_m: marker.position.distance_to(user),
            marker: marker.clone(),
        })
        .min_by(|a, b| a.distance_m.total_cmp(&b.distance_m))
}

/// Collect `marker_id` for a user standing at `user`.
///
/// The stored marker is authoritative: its position decides the distance
/// and its category decides which song is taken.
///
/// # Errors
/// Returns `NotFound` if the marker no longer exists.
pub fn collect_marker(
    db: &mut Database,
    marker_id: i64,
    user: LatLng,
    radius_m: f64,
) -> lyricwalk_core::Result<CollectionOutcome> {
    let marker = db.get_marker(marker_id)?;
    let distance_m = marker.position.distance_to(user);
    if distance_m >= radius_m {
        log::debug!(
            "Marker {} is {:.1} m away (radius {:.1} m)",
            marker_id,
            distance_m,
            radius_m
        );
        return Ok(CollectionOutcome::TooFar { distance_m });
    }

    Ok(match db.collect_song_for_marker(marker_id)? {
        Some(song) => {
            log::info!(
                "Collected {} song {} from marker {}",
                song.category,
                song.id,
                marker_id
            );
            CollectionOutcome::Collected(song)
        }
        None => CollectionOutcome::NoSongsAvailable,
    })
}

/// Collection flows over a shared [`CatalogStore`].
#[derive(Debug, Clone)]
pub struct CollectionEngine {
    store: CatalogStore,
    radius_m: f64,
}

impl CollectionEngine {
    pub fn new(store: CatalogStore) -> Self {
        Self {
            store,
            radius_m: DEFAULT_COLLECT_RADIUS_M,
        }
    }

    #[must_use]
    pub fn with_radius(mut self, radius_m: f64) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub const fn radius_m(&self) -> f64 {
        self.radius_m
    }

    /// Try to collect `marker` for a user at `user`.
    ///
    /// The distance check and the collection run under one store lock, so
    /// a concurrent marker refresh cannot slip in between them.
    pub async fn attempt_collect(
        &self,
        marker: &Marker,
        user: LatLng,
    ) -> GameResult<CollectionOutcome> {
        let (marker_id, radius_m) = (marker.id, self.radius_m);
        self.store
            .with_db(move |db| collect_marker(db, marker_id, user, radius_m))
            .await
    }

    pub async fn nearest_marker(&self, user: LatLng) -> GameResult<Option<NearbyMarker>> {
        let markers = self.store.list_markers().await?;
        Ok(nearest_marker(&markers, user))
    }

    /// Find the nearest marker and try to collect it, in one step.
    ///
    /// Returns `None` when there are no markers at all.
    pub async fn collect_nearest(
        &self,
        user: LatLng,
    ) -> GameResult<Option<(NearbyMarker, CollectionOutcome)>> {
        let radius_m = self.radius_m;
        self.store
            .with_db(move |db| -> lyricwalk_core::Result<_> {
                let markers = db.list_markers()?;
                let Some(nearby) = nearest_marker(&markers, user) else {
                    return Ok(None);
                };
                let outcome = collect_marker(db, nearby.marker.id, user, radius_m)?;
                Ok(Some((nearby, outcome)))
            })
            .await
    }
}
