//! Game engines for lyricwalk.
//!
//! Wraps the synchronous catalog in an async, single-writer store and
//! builds the collection, guess and daily refresh flows on top of it.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod collect;
pub mod config;
pub mod error;
pub mod guess;
pub mod refresh;
pub mod store;

pub use collect::{CollectionEngine, CollectionOutcome, NearbyMarker, DEFAULT_COLLECT_RADIUS_M};
pub use config::Config;
pub use error::{GameError, GameResult};
pub use guess::{new_seed, Challenge, GuessEngine, GuessResult, OPTION_COUNT};
pub use refresh::{refresh_markers, spawn_daily_refresh, RefreshSchedule};
pub use store::{CatalogStore, StoreStatus};
