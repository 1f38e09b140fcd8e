pub mod category;
pub mod geo;
pub mod marker;
pub mod song;

pub use category::Category;
pub use geo::LatLng;
pub use marker::{Marker, NewMarker};
pub use song::{NewSong, Song};
