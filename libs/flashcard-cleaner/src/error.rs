//! Error types for flashcard-cleaner.
//!
//! The transform itself never fails; these errors come from the deck file
//! parser, card sources and the batch review driver around it.

use thiserror::Error;

/// Result type alias using CleanerError.
pub type Result<T> = std::result::Result<T, CleanerError>;

#[derive(Debug, Error)]
pub enum CleanerError {
    #[error("missing front at line {line}")]
    MissingFront { line: usize },

    #[error("missing back at line {line}")]
    MissingBack { line: usize },

    #[error("invalid ID format at line {line}: {value}")]
    InvalidId { line: usize, value: String },

    #[error("duplicate ID {id} at line {line}")]
    DuplicateId { id: i64, line: usize },

    #[error("unknown card {id}")]
    UnknownCard { id: i64 },

    #[error("card {card_id} has fewer than two fields")]
    MissingFields { card_id: i64 },

    #[error("card source error: {0}")]
    Source(String),

    #[error("invalid settings: {0}")]
    Config(#[from] serde_json::Error),
}
