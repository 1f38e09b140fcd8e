//! Catalog table definitions.
//!
//! The catalog is a local cache rebuilt from bundled seed data, so there are
//! no incremental migrations: any stored version other than
//! [`SCHEMA_VERSION`] drops every table and reseeds.

/// Current schema version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: u32 = 1;

pub(crate) const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS currentSongs (
    id INTEGER PRIMARY KEY,
    artist TEXT NOT NULL,
    title TEXT NOT NULL,
    lyric TEXT NOT NULL,
    albumCover BLOB NOT NULL DEFAULT x'',
    category TEXT NOT NULL CHECK (category = 'Current'),
    isFavourite INTEGER NOT NULL DEFAULT 0,
    isGuessed INTEGER NOT NULL DEFAULT 0,
    isCollected INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_currentSongs_isCollected ON currentSongs(isCollected);

CREATE TABLE IF NOT EXISTS classicSongs (
    id INTEGER PRIMARY KEY,
    artist TEXT NOT NULL,
    title TEXT NOT NULL,
    lyric TEXT NOT NULL,
    albumCover BLOB NOT NULL DEFAULT x'',
    category TEXT NOT NULL CHECK (category = 'Classic'),
    isFavourite INTEGER NOT NULL DEFAULT 0,
    isGuessed INTEGER NOT NULL DEFAULT 0,
    isCollected INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_classicSongs_isCollected ON classicSongs(isCollected);

-- AUTOINCREMENT: a refreshed marker never reuses the id of a removed one.
CREATE TABLE IF NOT EXISTS markers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    category TEXT NOT NULL CHECK (category IN ('Current', 'Classic'))
);

CREATE INDEX IF NOT EXISTS idx_markers_category ON markers(category);
"#;

pub(crate) const DROP_TABLES: &str = r#"
DROP TABLE IF EXISTS currentSongs;
DROP TABLE IF EXISTS classicSongs;
DROP TABLE IF EXISTS markers;
"#;
