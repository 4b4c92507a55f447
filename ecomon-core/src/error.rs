//! Error types for the EcoMon core library.

use thiserror::Error;

/// Top-level error type for all engine operations.
///
/// The first three variants are the engine's local, recoverable failures.
/// Emotion, mood and memory operations never produce an error.
#[derive(Error, Debug)]
pub enum EcomonError {
    /// A stage advance was attempted without enough XP, at the max stage,
    /// or with a branch that conflicts with the committed one.
    #[error("Invalid evolution transition: {0}")]
    InvalidTransition(String),

    /// A reward lookup was requested for an action outside the catalog.
    #[error("Unknown action type: {0}")]
    UnknownActionType(String),

    /// Malformed caller input (quiz tallies, confidence, inactivity span).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, EcomonError>;
