use rand::Rng;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::geofence::{self, MarkerCounts, CAMPUS, DEFAULT_MAX_ATTEMPTS_PER_MARKER};
use crate::model::{Category, LatLng, Marker, NewMarker, NewSong, Song};

use super::migrations::{CREATE_TABLES, DROP_TABLES, SCHEMA_VERSION};
use super::seed;

const SONG_COLUMNS: &str =
    "id, artist, title, lyric, albumCover, category, isFavourite, isGuessed, isCollected";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of regenerating the marker table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepopulateReport {
    /// Current markers inserted.
    pub current: usize,
    /// Classic markers inserted.
    pub classic: usize,
    /// Categories whose sampling ran out of attempts.
    pub exhausted: Vec<Category>,
}

impl RepopulateReport {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.current + self.classic
    }
}

/// Per-category catalog counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub total: usize,
    pub collected: usize,
    pub guessed: usize,
    pub favourites: usize,
    pub markers: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub current: CategoryStats,
    pub classic: CategoryStats,
}

impl CatalogStats {
    #[must_use]
    pub const fn for_category(&self, category: Category) -> &CategoryStats {
        match category {
            Category::Current => &self.current,
            Category::Classic => &self.classic,
        }
    }
}

/// The song and marker catalog, backed by one SQLite file.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
    max_attempts_per_marker: usize,
}

impl Database {
    /// Open (or create) a catalog at the given path.
    ///
    /// A new file is created and seeded. A file written by another schema
    /// version is dropped and reseeded.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, DEFAULT_MAX_ATTEMPTS_PER_MARKER)
    }

    /// Open a catalog with a custom marker sampling cap.
    pub fn open_with(path: impl AsRef<Path>, max_attempts_per_marker: usize) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn, max_attempts_per_marker)
    }

    /// Open a seeded in-memory catalog (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, DEFAULT_MAX_ATTEMPTS_PER_MARKER)
    }

    fn init(conn: Connection, max_attempts_per_marker: usize) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let journal_mode: String =
            conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        log::debug!("Catalog journal mode: {}", journal_mode);

        let mut db = Self {
            conn,
            max_attempts_per_marker,
        };
        db.ensure_schema(&mut rand::rng())?;
        Ok(db)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn set_max_attempts_per_marker(&mut self, max_attempts_per_marker: usize) {
        self.max_attempts_per_marker = max_attempts_per_marker;
    }

    /// The schema version stamped in the file (0 for a fresh file).
    pub fn schema_version(&self) -> Result<u32> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    /// Create, keep or rebuild the schema depending on the stored version.
    pub fn ensure_schema<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        match self.schema_version()? {
            SCHEMA_VERSION => {
                log::debug!("Catalog schema v{} is current", SCHEMA_VERSION);
                Ok(())
            }
            0 => self.create_schema(rng),
            old => self.upgrade_schema(old, SCHEMA_VERSION, rng),
        }
    }

    /// Create the song and marker tables, seed the bundled songs and place
    /// one marker per uncollected song.
    pub fn create_schema<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        log::info!("Creating catalog schema v{}", SCHEMA_VERSION);
        let songs = seed::bundled_songs()?;
        let max_attempts = self.max_attempts_per_marker;

        let tx = self.conn.transaction()?;
        build_schema(&tx, &songs, rng, max_attempts, SCHEMA_VERSION)?;
        tx.commit()?;
        Ok(())
    }

    /// Drop every table and rebuild from seed data. Used for upgrades and
    /// downgrades alike.
    pub fn upgrade_schema<R: Rng>(
        &mut self,
        old_version: u32,
        new_version: u32,
        rng: &mut R,
    ) -> Result<()> {
        log::info!(
            "Catalog schema v{} does not match v{}, dropping and reseeding",
            old_version,
            new_version
        );
        let songs = seed::bundled_songs()?;
        let max_attempts = self.max_attempts_per_marker;

        let tx = self.conn.transaction()?;
        tx.execute_batch(DROP_TABLES)?;
        build_schema(&tx, &songs, rng, max_attempts, new_version)?;
        tx.commit()?;
        Ok(())
    }
}

fn build_schema<R: Rng>(
    conn: &Connection,
    songs: &[NewSong],
    rng: &mut R,
    max_attempts_per_marker: usize,
    version: u32,
) -> Result<()> {
    conn.execute_batch(CREATE_TABLES)?;

    let existing = count_songs(conn)?;
    if existing == 0 {
        for song in songs {
            insert_song_row(conn, song)?;
        }
    } else {
        log::warn!("Song tables already hold {} rows, skipping seed", existing);
    }

    let counts = uncollected_counts(conn)?;
    let batch = geofence::generate_markers(&CAMPUS, counts, rng, max_attempts_per_marker);
    replace_markers(conn, &batch.markers)?;

    conn.execute_batch(&format!("PRAGMA user_version = {version}"))?;

    log::info!(
        "Seeded catalog with {} songs and {} markers",
        count_songs(conn)?,
        batch.markers.len()
    );
    Ok(())
}

// Marker queries
impl Database {
    /// List every marker, oldest first.
    pub fn list_markers(&self) -> Result<Vec<Marker>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, latitude, longitude, category FROM markers ORDER BY id")?;
        let markers = stmt
            .query_map([], row_to_marker)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(markers)
    }

    /// Get a marker by id.
    pub fn get_marker(&self, marker_id: i64) -> Result<Marker> {
        fetch_marker(&self.conn, marker_id)?.ok_or_else(|| Error::NotFound {
            entity: "marker",
            id: marker_id.to_string(),
        })
    }

    /// Insert a single marker.
    pub fn insert_marker(&self, marker: &NewMarker) -> Result<Marker> {
        insert_marker_row(&self.conn, marker)?;
        self.get_marker(self.conn.last_insert_rowid())
    }

    /// Delete a marker. A missing id affects no rows.
    pub fn delete_marker(&self, marker_id: i64) -> Result<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM markers WHERE id = ?1", [marker_id])?;
        if deleted == 0 {
            log::debug!("delete_marker: no marker with id {}", marker_id);
        }
        Ok(deleted)
    }

    /// Replace every marker with a freshly generated set, one per
    /// uncollected song.
    ///
    /// Counting, truncation and insertion share one transaction, so readers
    /// never observe an empty marker table.
    pub fn repopulate_markers<R: Rng>(&mut self, rng: &mut R) -> Result<RepopulateReport> {
        let max_attempts = self.max_attempts_per_marker;

        let tx = self.conn.transaction()?;
        let counts = uncollected_counts(&tx)?;
        let batch = geofence::generate_markers(&CAMPUS, counts, rng, max_attempts);
        replace_markers(&tx, &batch.markers)?;
        tx.commit()?;

        let report = RepopulateReport {
            current: batch.count(Category::Current),
            classic: batch.count(Category::Classic),
            exhausted: batch.exhausted_categories(),
        };
        log::info!(
            "Repopulated markers: {} current, {} classic",
            report.current,
            report.classic
        );
        Ok(report)
    }

    /// Atomically turn a marker into a collected song.
    ///
    /// Picks the lowest-id uncollected song of the marker's category, flags
    /// it collected and deletes the marker. Returns `None` with no changes
    /// when the category has nothing left to collect.
    ///
    /// # Errors
    /// Returns `NotFound` if the marker no longer exists.
    pub fn collect_song_for_marker(&mut self, marker_id: i64) -> Result<Option<Song>> {
        let tx = self.conn.transaction()?;

        let marker = fetch_marker(&tx, marker_id)?.ok_or_else(|| Error::NotFound {
            entity: "marker",
            id: marker_id.to_string(),
        })?;

        let sql = format!(
            "SELECT {SONG_COLUMNS} FROM {} WHERE isCollected = 0 ORDER BY id LIMIT 1",
            marker.category.table()
        );
        let Some(mut song) = tx.query_row(&sql, [], row_to_song).optional()? else {
            log::debug!("No uncollected {} songs for marker {}", marker.category, marker_id);
            return Ok(None);
        };

        set_flag(&tx, marker.category, "isCollected", song.id, true)?;
        tx.execute("DELETE FROM markers WHERE id = ?1", [marker.id])?;
        tx.commit()?;

        song.is_collected = true;
        log::debug!("Marker {} collected as song {}", marker_id, song.id);
        Ok(Some(song))
    }
}

// Song queries
impl Database {
    /// Insert a song into its category table.
    pub fn insert_song(&self, song: &NewSong) -> Result<Song> {
        insert_song_row(&self.conn, song)?;
        self.get_song(self.conn.last_insert_rowid(), song.category)
    }

    /// Get a song by id.
    pub fn get_song(&self, song_id: i64, category: Category) -> Result<Song> {
        let sql = format!(
            "SELECT {SONG_COLUMNS} FROM {} WHERE id = ?1",
            category.table()
        );
        self.conn
            .query_row(&sql, [song_id], row_to_song)
            .optional()?
            .ok_or_else(|| Error::NotFound {
                entity: "song",
                id: format!("{category}/{song_id}"),
            })
    }

    /// Songs of `category` that have not been collected yet, by id.
    pub fn list_uncollected_songs(&self, category: Category) -> Result<Vec<Song>> {
        let sql = format!(
            "SELECT {SONG_COLUMNS} FROM {} WHERE isCollected = 0 ORDER BY id",
            category.table()
        );
        query_songs(&self.conn, &sql, [])
    }

    /// Songs of `category`, optionally filtered on the collected flag.
    ///
    /// With a filter, guessed songs sort first. Without one, every song of
    /// the category is returned by id.
    pub fn list_collected_songs(
        &self,
        category: Category,
        collected: Option<bool>,
    ) -> Result<Vec<Song>> {
        let table = category.table();
        match collected {
            Some(flag) => {
                let sql = format!(
                    "SELECT {SONG_COLUMNS} FROM {table} WHERE isCollected = ?1 ORDER BY isGuessed DESC, id"
                );
                query_songs(&self.conn, &sql, [flag])
            }
            None => {
                let sql = format!("SELECT {SONG_COLUMNS} FROM {table} ORDER BY id");
                query_songs(&self.conn, &sql, [])
            }
        }
    }

    /// Favourite songs across both categories, Current first.
    pub fn list_favourite_songs(&self) -> Result<Vec<Song>> {
        let mut songs = Vec::new();
        for category in Category::ALL {
            let sql = format!(
                "SELECT {SONG_COLUMNS} FROM {} WHERE isFavourite = 1 ORDER BY id",
                category.table()
            );
            songs.extend(query_songs(&self.conn, &sql, [])?);
        }
        Ok(songs)
    }

    /// Up to `count` distinct songs of `category`, in random order.
    pub fn random_songs(&self, category: Category, count: usize) -> Result<Vec<Song>> {
        let sql = format!(
            "SELECT {SONG_COLUMNS} FROM {} ORDER BY RANDOM() LIMIT ?1",
            category.table()
        );
        let limit = i64::try_from(count).unwrap_or(i64::MAX);
        query_songs(&self.conn, &sql, [limit])
    }

    /// Flag a song as collected. Returns the number of rows changed.
    pub fn set_collected(&self, song_id: i64, category: Category) -> Result<usize> {
        set_flag(&self.conn, category, "isCollected", song_id, true)
    }

    /// Flag a song as guessed. Returns the number of rows changed.
    pub fn set_guessed(&self, song_id: i64, category: Category) -> Result<usize> {
        set_flag(&self.conn, category, "isGuessed", song_id, true)
    }

    /// Set or clear a song's favourite flag. Returns the number of rows changed.
    pub fn set_favourite(&self, song_id: i64, category: Category, favourite: bool) -> Result<usize> {
        set_flag(&self.conn, category, "isFavourite", song_id, favourite)
    }

    /// How many songs of each category are still uncollected.
    pub fn uncollected_counts(&self) -> Result<MarkerCounts> {
        uncollected_counts(&self.conn)
    }

    /// Counters for both categories.
    pub fn stats(&self) -> Result<CatalogStats> {
        Ok(CatalogStats {
            current: category_stats(&self.conn, Category::Current)?,
            classic: category_stats(&self.conn, Category::Classic)?,
        })
    }
}

fn row_to_song(row: &Row<'_>) -> rusqlite::Result<Song> {
    Ok(Song {
        id: row.get(0)?,
        artist: row.get(1)?,
        title: row.get(2)?,
        lyric: row.get(3)?,
        album_cover: row.get(4)?,
        category: row.get(5)?,
        is_favourite: row.get(6)?,
        is_guessed: row.get(7)?,
        is_collected: row.get(8)?,
    })
}

fn row_to_marker(row: &Row<'_>) -> rusqlite::Result<Marker> {
    Ok(Marker {
        id: row.get(0)?,
        position: LatLng::new(row.get(1)?, row.get(2)?),
        category: row.get(3)?,
    })
}

fn query_songs(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Song>> {
    let mut stmt = conn.prepare(sql)?;
    let songs = stmt
        .query_map(params, row_to_song)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(songs)
}

fn fetch_marker(conn: &Connection, marker_id: i64) -> Result<Option<Marker>> {
    Ok(conn
        .query_row(
            "SELECT id, latitude, longitude, category FROM markers WHERE id = ?1",
            [marker_id],
            row_to_marker,
        )
        .optional()?)
}

fn insert_song_row(conn: &Connection, song: &NewSong) -> Result<()> {
    let sql = format!(
        "INSERT INTO {} (artist, title, lyric, albumCover, category, isFavourite, isGuessed, isCollected)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, 0)",
        song.category.table()
    );
    conn.execute(
        &sql,
        rusqlite::params![
            song.artist,
            song.title,
            song.lyric,
            song.album_cover,
            song.category
        ],
    )?;
    Ok(())
}

fn insert_marker_row(conn: &Connection, marker: &NewMarker) -> Result<()> {
    conn.execute(
        "INSERT INTO markers (latitude, longitude, category) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            marker.position.latitude,
            marker.position.longitude,
            marker.category
        ],
    )?;
    Ok(())
}

fn replace_markers(conn: &Connection, markers: &[NewMarker]) -> Result<()> {
    conn.execute("DELETE FROM markers", [])?;
    for marker in markers {
        insert_marker_row(conn, marker)?;
    }
    Ok(())
}

fn set_flag(
    conn: &Connection,
    category: Category,
    column: &str,
    song_id: i64,
    value: bool,
) -> Result<usize> {
    let sql = format!("UPDATE {} SET {column} = ?1 WHERE id = ?2", category.table());
    let updated = conn.execute(&sql, rusqlite::params![value, song_id])?;
    if updated == 0 {
        log::debug!("{} update matched no {} song with id {}", column, category, song_id);
    }
    Ok(updated)
}

fn count_rows(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<usize> {
    let count: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    Ok(usize::try_from(count).unwrap_or(0))
}

fn count_songs(conn: &Connection) -> Result<usize> {
    let mut total = 0;
    for category in Category::ALL {
        total += count_rows(conn, &format!("SELECT COUNT(*) FROM {}", category.table()), [])?;
    }
    Ok(total)
}

fn uncollected_counts(conn: &Connection) -> Result<MarkerCounts> {
    let count = |category: Category| {
        count_rows(
            conn,
            &format!(
                "SELECT COUNT(*) FROM {} WHERE isCollected = 0",
                category.table()
            ),
            [],
        )
    };
    Ok(MarkerCounts::new(
        count(Category::Current)?,
        count(Category::Classic)?,
    ))
}

fn category_stats(conn: &Connection, category: Category) -> Result<CategoryStats> {
    let table = category.table();
    let flag_count =
        |column: &str| count_rows(conn, &format!("SELECT COUNT(*) FROM {table} WHERE {column} = 1"), []);

    Ok(CategoryStats {
        total: count_rows(conn, &format!("SELECT COUNT(*) FROM {table}"), [])?,
        collected: flag_count("isCollected")?,
        guessed: flag_count("isGuessed")?,
        favourites: flag_count("isFavourite")?,
        markers: count_rows(
            conn,
            "SELECT COUNT(*) FROM markers WHERE category = ?1",
            [category],
        )?,
    })
}
