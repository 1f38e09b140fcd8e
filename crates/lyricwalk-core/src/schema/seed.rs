//! Bundled seed catalog.
//!
//! The songs every fresh catalog starts with are compiled into the binary
//! from `catalog.toml`.

use serde::Deserialize;

use crate::error::Result;
use crate::model::{Category, NewSong};

const BUNDLED_CATALOG: &str = include_str!("catalog.toml");

#[derive(Debug, Deserialize)]
struct SeedCatalog {
    #[serde(default)]
    current: Vec<SeedSong>,
    #[serde(default)]
    classic: Vec<SeedSong>,
}

#[derive(Debug, Deserialize)]
struct SeedSong {
    artist: String,
    title: String,
    lyric: String,
}

/// Parse a seed catalog document into new songs, Current first.
pub fn parse_catalog(content: &str) -> Result<Vec<NewSong>> {
    let catalog: SeedCatalog = toml::from_str(content)?;

    let tagged = catalog
        .current
        .into_iter()
        .map(|s| (Category::Current, s))
        .chain(catalog.classic.into_iter().map(|s| (Category::Classic, s)));

    Ok(tagged
        .map(|(category, s)| NewSong::new(category, s.artist, s.title, s.lyric))
        .collect())
}

/// The songs seeded into every new catalog.
pub fn bundled_songs() -> Result<Vec<NewSong>> {
    parse_catalog(BUNDLED_CATALOG)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog_sizes() {
        let songs = bundled_songs().unwrap();
        let current = songs
            .iter()
            .filter(|s| s.category == Category::Current)
            .count();
        let classic = songs
            .iter()
            .filter(|s| s.category == Category::Classic)
            .count();
        assert_eq!(current, 20);
        assert_eq!(classic, 19);
    }

    #[test]
    fn test_bundled_labels_are_unique_per_category() {
        let songs = bundled_songs().unwrap();
        for category in Category::ALL {
            let mut labels: Vec<_> = songs
                .iter()
                .filter(|s| s.category == category)
                .map(|s| format!("{}\n{}", s.title, s.artist))
                .collect();
            let total = labels.len();
            labels.sort();
            labels.dedup();
            assert_eq!(labels.len(), total, "duplicate label in {category}");
        }
    }

    #[test]
    fn test_parse_catalog_missing_section() {
        let songs = parse_catalog(
            r#"
[[classic]]
artist = "A"
title = "T"
lyric = "L"
"#,
        )
        .unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].category, Category::Classic);
    }

    #[test]
    fn test_parse_catalog_invalid() {
        assert!(parse_catalog("[[current]]\nartist = 1").is_err());
    }
}
