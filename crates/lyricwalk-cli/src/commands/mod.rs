pub mod collect;
pub mod config;
pub mod guess;
pub mod markers;
pub mod refresh;
pub mod songs;
pub mod status;

pub use collect::run_collect;
pub use guess::run_guess;
pub use markers::list_markers;
pub use refresh::run_refresh;
pub use songs::{list_favourites, list_songs, set_favourite, show_song};
pub use status::show_status;

use anyhow::{Context as _, Result};
use lyricwalk_core::model::Song;
use lyricwalk_game::{CatalogStore, Config};
use serde::Serialize;

/// Everything a subcommand needs: the open store, the effective
/// configuration and the output mode.
#[derive(Debug)]
pub struct Context {
    pub store: CatalogStore,
    pub config: Config,
    pub json: bool,
}

impl Context {
    pub async fn open(config: Config, json: bool) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create catalog directory")?;
        }

        let store =
            CatalogStore::open_with(&config.database_path, config.max_attempts_per_marker)
                .await
                .with_context(|| {
                    format!("Failed to open catalog at {}", config.database_path.display())
                })?;

        Ok(Self {
            store,
            config,
            json,
        })
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One-line rendering of a song with its flags.
pub fn song_line(song: &Song) -> String {
    let mut flags = String::new();
    if song.is_collected {
        flags.push('C');
    }
    if song.is_guessed {
        flags.push('G');
    }
    if song.is_favourite {
        flags.push('*');
    }
    format!(
        "{:>4}  {:<3} {} / {}",
        song.id, flags, song.title, song.artist
    )
}

pub fn print_songs(songs: &[Song]) {
    if songs.is_empty() {
        println!("  (none)");
        return;
    }
    for song in songs {
        println!("  {}", song_line(song));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyricwalk_core::model::Category;

    #[test]
    fn test_song_line_shows_flags() {
        let song = Song {
            id: 7,
            artist: "Artist".to_string(),
            title: "Title".to_string(),
            lyric: String::new(),
            album_cover: Vec::new(),
            category: Category::Classic,
            is_favourite: true,
            is_guessed: false,
            is_collected: true,
        };
        assert_eq!(song_line(&song), "   7  C*  Title / Artist");
    }
}
