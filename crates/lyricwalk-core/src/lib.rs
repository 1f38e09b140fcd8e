//! Core domain model for lyricwalk.
//!
//! This crate defines the song and marker model, the campus geofence and
//! its random marker generator, and the SQLite catalog store that owns
//! every persisted song and marker.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod geofence;
pub mod model;
pub mod schema;

pub use error::{Error, Result};
