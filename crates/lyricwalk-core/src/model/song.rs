use serde::{Deserialize, Serialize};

use crate::model::Category;

/// A song in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    /// Store-assigned id, unique within the song's category table.
    pub id: i64,
    pub artist: String,
    pub title: String,
    pub lyric: String,

    /// Opaque album artwork bytes. Never decoded by the core.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub album_cover: Vec<u8>,

    pub category: Category,
    pub is_favourite: bool,
    pub is_guessed: bool,
    pub is_collected: bool,
}

impl Song {
    /// The answer text shown in a guess challenge.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}\n{}", self.title, self.artist)
    }

    /// Whether the song is collected but still waiting to be guessed.
    #[must_use]
    pub const fn is_guessable(&self) -> bool {
        self.is_collected && !self.is_guessed
    }
}

/// A song that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSong {
    pub artist: String,
    pub title: String,
    pub lyric: String,
    #[serde(default)]
    pub album_cover: Vec<u8>,
    pub category: Category,
}

impl NewSong {
    #[must_use]
    pub fn new(
        category: Category,
        artist: impl Into<String>,
        title: impl Into<String>,
        lyric: impl Into<String>,
    ) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            lyric: lyric.into(),
            album_cover: Vec::new(),
            category,
        }
    }

    #[must_use]
    pub fn with_album_cover(mut self, album_cover: Vec<u8>) -> Self {
        self.album_cover = album_cover;
        self
    }
}
