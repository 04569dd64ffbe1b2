use thiserror::Error;

/// Typed failures surfaced by the review core. Nothing here is retried;
/// callers decide whether a failure is fatal (empty document) or local to
/// one target (bad score list, bad acceptance).
#[derive(Debug, Error, PartialEq)]
pub enum ReviewError {
    #[error("document has no rows")]
    EmptyDocument,

    #[error("score {value} for candidate '{character}' is outside 0..=100")]
    InvalidScore { character: char, value: f64 },

    #[error("candidate '{character}' carries neither a stroke nor a context score")]
    MissingScores { character: char },

    #[error("candidate '{character}' is not among target {target_id}'s fused candidates")]
    UnknownCandidate { target_id: u32, character: char },

    #[error("target {target_id} is not registered")]
    UnknownTarget { target_id: u32 },
}

impl ReviewError {
    pub(crate) fn invalid_score(character: char, value: f64) -> Self {
        Self::InvalidScore { character, value }
    }

    pub(crate) fn unknown_candidate(target_id: u32, character: char) -> Self {
        Self::UnknownCandidate { target_id, character }
    }
}

pub type ReviewResult<T> = Result<T, ReviewError>;
