//! Error types for the game engines.

use lyricwalk_core::model::Category;
use thiserror::Error;

/// Errors raised by the store wrapper and the game engines.
#[derive(Debug, Error)]
pub enum GameError {
    /// An error propagated from the catalog.
    #[error("store error: {0}")]
    Store(#[from] lyricwalk_core::Error),

    /// The category holds too few songs to fill every decoy slot.
    #[error("not enough {category} songs to build decoys")]
    NotEnoughDecoys { category: Category },

    /// A chosen answer index outside the option range.
    #[error("answer index {index} is out of range (0..{max})")]
    InvalidAnswer { index: usize, max: usize },

    /// A refresh time that is not a valid wall-clock time.
    #[error("invalid refresh time {hour:02}:{minute:02}")]
    InvalidSchedule { hour: u32, minute: u32 },

    /// A blocking store task panicked or was cancelled.
    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl GameError {
    /// Returns `true` when the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store(e) => e.is_busy() || matches!(e, lyricwalk_core::Error::StoreUnavailable(_)),
            Self::Task(_) => true,
            _ => false,
        }
    }

    /// Returns `true` when an id lookup missed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_not_found())
    }
}

/// Convenience alias for game results.
pub type GameResult<T> = std::result::Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_unavailable_is_transient() {
        let err = GameError::from(lyricwalk_core::Error::StoreUnavailable(
            "creating".to_string(),
        ));
        assert!(err.is_transient());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_is_permanent() {
        let err = GameError::from(lyricwalk_core::Error::NotFound {
            entity: "marker",
            id: "1".to_string(),
        });
        assert!(err.is_not_found());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_invalid_answer_display() {
        let err = GameError::InvalidAnswer { index: 7, max: 4 };
        assert_eq!(err.to_string(), "answer index 7 is out of range (0..4)");
        assert!(!err.is_transient());
    }
}
