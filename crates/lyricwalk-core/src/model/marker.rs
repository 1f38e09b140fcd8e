use serde::{Deserialize, Serialize};

use crate::model::{Category, LatLng};

/// A persisted point on the campus where a lyric of `category` waits to be
/// collected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: i64,
    pub position: LatLng,
    pub category: Category,
}

/// A generated marker that has not been stored yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewMarker {
    pub position: LatLng,
    pub category: Category,
}

impl NewMarker {
    #[must_use]
    pub const fn new(position: LatLng, category: Category) -> Self {
        Self { position, category }
    }
}
