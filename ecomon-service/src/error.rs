//! Service error types.

use thiserror::Error;

use ecomon_core::{EcomonError, UserId};
use ecomon_llm::LlmError;

use crate::mint::MintError;

/// Errors surfaced by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The engine rejected the operation.
    #[error("Engine error: {0}")]
    Engine(#[from] EcomonError),

    /// A content generator or image verifier failed.
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] LlmError),

    /// Minting failed.
    #[error("Mint error: {0}")]
    Mint(#[from] MintError),

    /// No account for this user.
    #[error("Unknown guardian: {0}")]
    UnknownGuardian(UserId),

    /// The account exists already.
    #[error("Guardian {0} is already registered")]
    AlreadyRegistered(UserId),

    /// The guardian has not adopted a companion yet.
    #[error("Guardian {0} has no companion")]
    NoCompanion(UserId),

    /// The guardian already has a companion.
    #[error("Guardian {0} already adopted a companion")]
    AlreadyAdopted(UserId),

    /// Quiz answers arrived without a quiz in progress.
    #[error("No quiz in progress for guardian {0}")]
    NoActiveQuiz(UserId),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, ServiceError>;
