use thiserror::Error;

use crate::types::{PlayerState, TeamSide};

/// Why a roster or penalty operation was refused. Nothing is mutated when one
/// of these is returned; the message is shown to the operator as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
    #[error("#{number} not found in team {side}")]
    PlayerNotFound { side: TeamSide, number: u16 },
    #[error("Same player on both sides of the substitution")]
    SamePlayer,
    #[error("#{number} is not playing")]
    NotPlaying { number: u16 },
    #[error("#{number} is not on the bench")]
    NotOnBench { number: u16 },
    #[error("#{number} is already playing")]
    AlreadyPlaying { number: u16 },
    #[error("#{number} is ineligible")]
    Ineligible { number: u16 },
    #[error("#{number} cannot return from state {state}")]
    CannotReturn { number: u16, state: PlayerState },
    #[error("2 minutes for #{number} not completed yet ({remaining}s left)")]
    PenaltyNotCompleted { number: u16, remaining: u64 },
    #[error("No open penalty for #{number}")]
    NoPenalty { number: u16 },
    #[error("No completed penalty slot for team {side}")]
    NoOpenSlot { side: TeamSide },
    #[error("Team {side} already has {max} players on court")]
    CourtFull { side: TeamSide, max: usize },
    #[error("Roster size must be between {min} and {max} (got {size})")]
    RosterSize { size: usize, min: usize, max: usize },
    #[error("Expected {expected} jersey numbers, got {got}")]
    NumberCount { expected: usize, got: usize },
    #[error("Jersey number {number} is repeated")]
    DuplicateNumber { number: u16 },
    #[error("Jersey number {number} is out of range (0..={max})")]
    NumberOutOfRange { number: u16, max: u16 },
    #[error("At most {max} starters allowed (got {got})")]
    TooManyStarters { got: usize, max: usize },
}

/// Why a socket may not take the operator seat of a session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("This connection already operates a session")]
    AlreadyOperating,
    #[error("A client id is required to operate a session")]
    MissingClientId,
}

/// Failures while reading or validating `game.json`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid rule {field}: {reason}")]
    InvalidRule { field: &'static str, reason: String },
}
