//! Multiple-choice guess challenges for collected songs.

use lyricwalk_core::model::{Category, Song};
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::error::{GameError, GameResult};
use crate::store::CatalogStore;

/// Number of answer options in a challenge.
pub const OPTION_COUNT: usize = 4;

/// Random songs drawn for each decoy slot.
const CANDIDATES_PER_SLOT: usize = 2;

/// A lyric plus four labelled answers, exactly one of them right.
///
/// The correct index is never serialized, so a challenge can be shown as
/// JSON without giving the answer away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Challenge {
    pub song_id: i64,
    pub category: Category,
    pub lyric: String,
    pub options: [String; OPTION_COUNT],
    #[serde(skip)]
    pub correct_index: usize,
}

impl Challenge {
    pub fn correct_label(&self) -> &str {
        &self.options[self.correct_index]
    }

    pub fn evaluate(&self, chosen_index: usize) -> GameResult<GuessResult> {
        evaluate(chosen_index, self.correct_index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GuessResult {
    Correct,
    Incorrect,
}

/// Compare a chosen option against the correct one.
///
/// # Errors
/// Returns `InvalidAnswer` if `chosen_index` is not a valid option.
pub fn evaluate(chosen_index: usize, correct_index: usize) -> GameResult<GuessResult> {
    if chosen_index >= OPTION_COUNT {
        return Err(GameError::InvalidAnswer {
            index: chosen_index,
            max: OPTION_COUNT,
        });
    }
    Ok(if chosen_index == correct_index {
        GuessResult::Correct
    } else {
        GuessResult::Incorrect
    })
}

/// Build a challenge for `song`, calling `draw` once per decoy slot.
///
/// Each draw should return up to two random songs of the song's category.
/// The first candidate whose label differs from the correct one fills the
/// slot. Decoys are not compared with each other, so two slots may repeat.
///
/// # Errors
/// Returns `NotEnoughDecoys` when a draw yields no usable candidate.
pub fn build_challenge_with<R, F>(song: &Song, rng: &mut R, mut draw: F) -> GameResult<Challenge>
where
    R: Rng,
    F: FnMut() -> lyricwalk_core::Result<Vec<Song>>,
{
    let correct_index = rng.random_range(0..OPTION_COUNT);
    let correct_label = song.label();
    let mut options: [String; OPTION_COUNT] = Default::default();

    for (slot, option) in options.iter_mut().enumerate() {
        if slot == correct_index {
            option.clone_from(&correct_label);
            continue;
        }
        *option = draw()?
            .iter()
            .take(CANDIDATES_PER_SLOT)
            .map(Song::label)
            .find(|label| *label != correct_label)
            .ok_or(GameError::NotEnoughDecoys {
                category: song.category,
            })?;
    }

    Ok(Challenge {
        song_id: song.id,
        category: song.category,
        lyric: song.lyric.clone(),
        options,
        correct_index,
    })
}

/// A fresh seed for [`GuessEngine::build_challenge`].
pub fn new_seed() -> u64 {
    rand::random()
}

/// Guess flows over a shared [`CatalogStore`].
#[derive(Debug, Clone)]
pub struct GuessEngine {
    store: CatalogStore,
}

impl GuessEngine {
    pub fn new(store: CatalogStore) -> Self {
        Self { store }
    }

    /// Build the challenge for `song` that `seed` selects, drawing decoys
    /// from its category.
    ///
    /// The same seed over the same songs gives the same options in the same
    /// order, so an answer can be checked against a challenge shown earlier.
    pub async fn build_challenge(&self, song: &Song, seed: u64) -> GameResult<Challenge> {
        let song = song.clone();
        self.store
            .with_db(move |db| {
                let pool = db.list_collected_songs(song.category, None)?;

                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let mut draw_rng = ChaCha8Rng::from_rng(&mut rng);
                build_challenge_with(&song, &mut rng, || {
                    Ok(pool
                        .choose_multiple(&mut draw_rng, CANDIDATES_PER_SLOT)
                        .cloned()
                        .collect())
                })
            })
            .await
    }

    /// Load a song and build the challenge `seed` selects for it.
    pub async fn challenge_for(
        &self,
        song_id: i64,
        category: Category,
        seed: u64,
    ) -> GameResult<(Song, Challenge)> {
        let song = self.store.get_song(song_id, category).await?;
        let challenge = self.build_challenge(&song, seed).await?;
        Ok((song, challenge))
    }

    /// Record an answer. A correct answer marks the song guessed; an
    /// incorrect one changes nothing and may be retried.
    pub async fn submit_answer(
        &self,
        song: &Song,
        chosen_index: usize,
        correct_index: usize,
    ) -> GameResult<GuessResult> {
        let result = evaluate(chosen_index, correct_index)?;
        if result == GuessResult::Correct {
            self.store.set_guessed(song.id, song.category).await?;
            log::info!("Song {} ({}) guessed", song.id, song.category);
        } else {
            log::debug!("Wrong answer {} for song {}", chosen_index, song.id);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn song(id: i64, title: &str, artist: &str) -> Song {
        Song {
            id,
            artist: artist.to_string(),
            title: title.to_string(),
            lyric: format!("lyric {id}"),
            album_cover: Vec::new(),
            category: Category::Current,
            is_favourite: false,
            is_guessed: false,
            is_collected: true,
        }
    }

    #[test]
    fn test_challenge_has_correct_label_once() {
        let target = song(1, "Target", "Band");
        let pool = [song(2, "A", "X"), song(3, "B", "Y"), song(4, "C", "Z")];

        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut next = 0;
            let challenge = build_challenge_with(&target, &mut rng, || {
                next += 1;
                Ok(vec![pool[next % 3].clone(), pool[(next + 1) % 3].clone()])
            })
            .unwrap();

            assert!(challenge.correct_index < OPTION_COUNT);
            assert_eq!(challenge.options.len(), OPTION_COUNT);
            assert_eq!(challenge.correct_label(), "Target\nBand");
            let hits = challenge
                .options
                .iter()
                .filter(|o| *o == "Target\nBand")
                .count();
            assert_eq!(hits, 1);
            assert_eq!(challenge.lyric, "lyric 1");
        }
    }

    #[test]
    fn test_collision_falls_back_to_second_candidate() {
        let target = song(1, "Target", "Band");
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let challenge = build_challenge_with(&target, &mut rng, || {
            Ok(vec![target.clone(), song(9, "Other", "Act")])
        })
        .unwrap();

        for (i, option) in challenge.options.iter().enumerate() {
            if i != challenge.correct_index {
                assert_eq!(option, "Other\nAct");
            }
        }
    }

    #[test]
    fn test_not_enough_decoys() {
        let target = song(1, "Target", "Band");
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let err =
            build_challenge_with(&target, &mut rng, || Ok(vec![target.clone()])).unwrap_err();
        assert!(matches!(
            err,
            GameError::NotEnoughDecoys {
                category: Category::Current
            }
        ));

        let err = build_challenge_with(&target, &mut rng, || Ok(Vec::new())).unwrap_err();
        assert!(matches!(err, GameError::NotEnoughDecoys { .. }));
    }

    #[test]
    fn test_draw_errors_propagate() {
        let target = song(1, "Target", "Band");
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let err = build_challenge_with(&target, &mut rng, || {
            Err(lyricwalk_core::Error::StoreUnavailable("closed".to_string()))
        })
        .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_same_seed_rebuilds_same_challenge() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        store.set_collected(3, Category::Current).await.unwrap();
        let engine = GuessEngine::new(store.clone());
        let song = store.get_song(3, Category::Current).await.unwrap();

        let first = engine.build_challenge(&song, 42).await.unwrap();
        store.set_collected(4, Category::Current).await.unwrap();
        let again = engine.build_challenge(&song, 42).await.unwrap();
        assert_eq!(first, again);

        let mut slots = std::collections::HashSet::new();
        for seed in 0..32 {
            let challenge = engine.build_challenge(&song, seed).await.unwrap();
            assert_eq!(challenge.correct_label(), song.label());
            slots.insert(challenge.correct_index);
        }
        assert!(slots.len() > 1);
    }

    #[tokio::test]
    async fn test_answer_checked_against_rebuilt_challenge() {
        let store = CatalogStore::open_in_memory().await.unwrap();
        store.set_collected(5, Category::Classic).await.unwrap();
        let engine = GuessEngine::new(store.clone());

        let (song, shown) = engine.challenge_for(5, Category::Classic, 7).await.unwrap();
        let chosen = shown
            .options
            .iter()
            .position(|o| *o == song.label())
            .unwrap();

        let (_, rebuilt) = engine.challenge_for(5, Category::Classic, 7).await.unwrap();
        let result = engine
            .submit_answer(&song, chosen, rebuilt.correct_index)
            .await
            .unwrap();
        assert_eq!(result, GuessResult::Correct);
        assert!(store.get_song(5, Category::Classic).await.unwrap().is_guessed);
    }

    #[test]
    fn test_evaluate() {
        assert_eq!(evaluate(2, 2).unwrap(), GuessResult::Correct);
        assert_eq!(evaluate(0, 2).unwrap(), GuessResult::Incorrect);
        assert!(matches!(
            evaluate(4, 2),
            Err(GameError::InvalidAnswer { index: 4, max: 4 })
        ));
    }
}
