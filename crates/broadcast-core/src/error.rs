//! Core error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SquareError {
    #[error("Invalid square: {0:?}")]
    Invalid(String),
}

/// Failures reported by a rules engine. All of them are recoverable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("Invalid UCI move: {0}")]
    InvalidUci(String),

    #[error("Illegal move: {0}")]
    IllegalMove(String),

    #[error("PGN replay failed: {0}")]
    Replay(String),

    #[error("No game found in PGN text")]
    NoGame,

    #[error(transparent)]
    Square(#[from] SquareError),
}
