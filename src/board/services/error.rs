//! Service-level error type shared by the workflow services.

use crate::board::{domain::BoardDomainError, ports::BoardRepositoryError};
use thiserror::Error;

/// Errors surfaced by workflow service operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Domain validation or a workflow rule failed.
    #[error(transparent)]
    Domain(#[from] BoardDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(BoardRepositoryError),
}

/// Result type for workflow service operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

impl From<BoardRepositoryError> for WorkflowError {
    /// Unwraps a rejected mutation back into its domain error; every other
    /// repository failure stays a repository error.
    fn from(err: BoardRepositoryError) -> Self {
        match err {
            BoardRepositoryError::Rejected(domain) => Self::Domain(domain),
            other => Self::Repository(other),
        }
    }
}
