use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean earth radius in metres, as used by the spherical distance helpers
/// of common map SDKs.
pub const EARTH_RADIUS_M: f64 = 6_371_009.0;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in metres (haversine).
    #[must_use]
    pub fn distance_to(&self, other: Self) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lng = (other.longitude - self.longitude).to_radians();

        let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
    }

    /// The point `north_m` metres north and `east_m` metres east of this one.
    ///
    /// Uses a local flat-earth approximation, accurate to well under a
    /// millimetre over the few hundred metres of a campus.
    #[must_use]
    pub fn offset_by_meters(&self, north_m: f64, east_m: f64) -> Self {
        let d_lat = (north_m / EARTH_RADIUS_M).to_degrees();
        let d_lng = (east_m / (EARTH_RADIUS_M * self.latitude.to_radians().cos())).to_degrees();
        Self::new(self.latitude + d_lat, self.longitude + d_lng)
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_self_is_zero() {
        let p = LatLng::new(51.6185, -3.879);
        assert!(p.distance_to(p).abs() < 1e-9);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = LatLng::new(51.620451, -3.875558);
        let b = LatLng::new(51.617257, -3.879934);
        assert!((a.distance_to(b) - b.distance_to(a)).abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let a = LatLng::new(0.0, 0.0);
        let b = LatLng::new(1.0, 0.0);
        let expected = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        assert!((a.distance_to(b) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_offset_by_meters_matches_distance() {
        let origin = LatLng::new(51.6185, -3.879);
        let north = origin.offset_by_meters(51.0, 0.0);
        assert!((origin.distance_to(north) - 51.0).abs() < 0.01);

        let east = origin.offset_by_meters(0.0, 30.0);
        assert!((origin.distance_to(east) - 30.0).abs() < 0.01);
    }
}
