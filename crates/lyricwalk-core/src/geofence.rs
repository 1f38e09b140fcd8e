//! Campus geofence and random marker generation.
//!
//! Markers are placed by rejection sampling: a point is drawn uniformly from
//! the polygon's bounding box and kept only if it lies inside the polygon.
//! Each category has an attempt cap so a degenerate polygon cannot stall
//! the caller forever.

use rand::Rng;
use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::model::{Category, LatLng, NewMarker};

/// Default number of sampling attempts allowed per requested marker.
pub const DEFAULT_MAX_ATTEMPTS_PER_MARKER: usize = 1000;

/// Tolerance for treating a point as lying on a polygon edge.
const BOUNDARY_EPSILON: f64 = 1e-12;

const CAMPUS_VERTICES: [LatLng; 8] = [
    LatLng::new(51.620451, -3.875558),
    LatLng::new(51.618414, -3.874742),
    LatLng::new(51.617506, -3.877067),
    LatLng::new(51.617257, -3.879934),
    LatLng::new(51.617657, -3.883254),
    LatLng::new(51.617823, -3.885250),
    LatLng::new(51.619322, -3.885270),
    LatLng::new(51.620451, -3.875558),
];

/// The campus boundary every marker is generated inside.
pub static CAMPUS: Polygon = Polygon {
    vertices: Cow::Borrowed(&CAMPUS_VERTICES),
};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Bounds {
    /// Draw a point uniformly from the box.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> LatLng {
        let lat_span = self.north_east.latitude - self.south_west.latitude;
        let lng_span = self.north_east.longitude - self.south_west.longitude;
        LatLng::new(
            self.south_west.latitude + rng.random::<f64>() * lat_span,
            self.south_west.longitude + rng.random::<f64>() * lng_span,
        )
    }
}

/// A closed polygon (first vertex == last vertex).
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Cow<'static, [LatLng]>,
}

impl Polygon {
    /// Build a polygon from its vertices, closing the ring if needed.
    ///
    /// # Errors
    /// Returns `InvalidData` if fewer than three vertices are given.
    pub fn new(mut vertices: Vec<LatLng>) -> Result<Self> {
        if vertices.first() != vertices.last() {
            if let Some(&first) = vertices.first() {
                vertices.push(first);
            }
        }
        // A closed triangle has four entries.
        if vertices.len() < 4 {
            return Err(Error::InvalidData(format!(
                "a polygon needs at least three vertices, got {}",
                vertices.len().saturating_sub(1)
            )));
        }
        Ok(Self {
            vertices: Cow::Owned(vertices),
        })
    }

    #[must_use]
    pub fn vertices(&self) -> &[LatLng] {
        &self.vertices
    }

    /// The smallest box containing every vertex.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        let mut south_west = LatLng::new(f64::INFINITY, f64::INFINITY);
        let mut north_east = LatLng::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for v in self.vertices.iter() {
            south_west.latitude = south_west.latitude.min(v.latitude);
            south_west.longitude = south_west.longitude.min(v.longitude);
            north_east.latitude = north_east.latitude.max(v.latitude);
            north_east.longitude = north_east.longitude.max(v.longitude);
        }
        Bounds {
            south_west,
            north_east,
        }
    }

    /// Even-odd point-in-polygon test. Points on an edge count as inside.
    #[must_use]
    pub fn contains(&self, point: LatLng) -> bool {
        let (x, y) = (point.longitude, point.latitude);
        let mut inside = false;

        for edge in self.vertices.windows(2) {
            let (a, b) = (edge[0], edge[1]);
            if on_segment(a, b, point) {
                return true;
            }

            let (xa, ya) = (a.longitude, a.latitude);
            let (xb, yb) = (b.longitude, b.latitude);
            if (ya > y) != (yb > y) {
                let x_cross = xa + (y - ya) * (xb - xa) / (yb - ya);
                if x < x_cross {
                    inside = !inside;
                }
            }
        }

        inside
    }
}

fn on_segment(a: LatLng, b: LatLng, p: LatLng) -> bool {
    let cross = (b.longitude - a.longitude) * (p.latitude - a.latitude)
        - (b.latitude - a.latitude) * (p.longitude - a.longitude);
    if cross.abs() > BOUNDARY_EPSILON {
        return false;
    }
    let within = |v: f64, lo: f64, hi: f64| {
        v >= lo.min(hi) - BOUNDARY_EPSILON && v <= lo.max(hi) + BOUNDARY_EPSILON
    };
    within(p.longitude, a.longitude, b.longitude) && within(p.latitude, a.latitude, b.latitude)
}

/// How many markers to generate for each category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkerCounts {
    pub current: usize,
    pub classic: usize,
}

impl MarkerCounts {
    #[must_use]
    pub const fn new(current: usize, classic: usize) -> Self {
        Self { current, classic }
    }

    #[must_use]
    pub const fn for_category(self, category: Category) -> usize {
        match category {
            Category::Current => self.current,
            Category::Classic => self.classic,
        }
    }

    #[must_use]
    pub const fn total(self) -> usize {
        self.current + self.classic
    }
}

/// Output of [`generate_markers`].
///
/// A category whose sampling ran out of attempts contributes no markers and
/// its error is kept in `exhausted`; the other category is unaffected.
#[derive(Debug, Default)]
pub struct MarkerBatch {
    pub markers: Vec<NewMarker>,
    pub exhausted: Vec<Error>,
}

impl MarkerBatch {
    #[must_use]
    pub fn count(&self, category: Category) -> usize {
        self.markers
            .iter()
            .filter(|m| m.category == category)
            .count()
    }

    #[must_use]
    pub fn exhausted_categories(&self) -> Vec<Category> {
        self.exhausted
            .iter()
            .filter_map(|e| match e {
                Error::GeofenceSamplingExhausted { category, .. } => Some(*category),
                _ => None,
            })
            .collect()
    }
}

/// Generate markers for both categories, Current first.
pub fn generate_markers<R: Rng>(
    polygon: &Polygon,
    counts: MarkerCounts,
    rng: &mut R,
    max_attempts_per_marker: usize,
) -> MarkerBatch {
    let mut batch = MarkerBatch::default();

    for category in Category::ALL {
        let requested = counts.for_category(category);
        match sample_category(polygon, category, requested, rng, max_attempts_per_marker) {
            Ok(mut markers) => batch.markers.append(&mut markers),
            Err(e) => {
                log::warn!("Skipping {} markers: {}", category, e);
                batch.exhausted.push(e);
            }
        }
    }

    log::debug!(
        "Generated {} markers ({} categories exhausted)",
        batch.markers.len(),
        batch.exhausted.len()
    );
    batch
}

/// Generate `requested` markers of one category inside `polygon`.
///
/// # Errors
/// Returns `GeofenceSamplingExhausted` once
/// `requested * max_attempts_per_marker` draws have been spent.
pub fn sample_category<R: Rng>(
    polygon: &Polygon,
    category: Category,
    requested: usize,
    rng: &mut R,
    max_attempts_per_marker: usize,
) -> Result<Vec<NewMarker>> {
    let bounds = polygon.bounds();
    let cap = requested.saturating_mul(max_attempts_per_marker.max(1));
    let mut markers = Vec::with_capacity(requested);
    let mut attempts = 0;

    while markers.len() < requested {
        if attempts >= cap {
            return Err(Error::GeofenceSamplingExhausted { category, attempts });
        }
        attempts += 1;

        let point = bounds.sample(rng);
        if polygon.contains(point) {
            markers.push(NewMarker::new(point, category));
        }
    }

    Ok(markers)
}
