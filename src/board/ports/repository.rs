//! Repository port for board persistence and locked board mutation.

use crate::board::domain::{Board, BoardDomainError, BoardId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for board repository operations.
pub type BoardRepositoryResult<T> = Result<T, BoardRepositoryError>;

/// Mutation closure applied to a board while its group lock is held.
pub type BoardMutation = Box<dyn FnOnce(&mut Board) -> Result<(), BoardDomainError> + Send>;

/// Board persistence contract.
///
/// `with_board` is the single write path for workflow mutations: the
/// adapter resolves the board, serializes the mutation against concurrent
/// writers of the same board, and commits only when the closure succeeds.
/// Multi-row position rewrites therefore apply atomically or not at all.
#[async_trait]
pub trait BoardRepository: Send + Sync {
    /// Stores a new board aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::DuplicateBoard`] when the board ID
    /// already exists.
    async fn store(&self, board: &Board) -> BoardRepositoryResult<()>;

    /// Finds a board by identifier.
    ///
    /// Returns `None` when the board does not exist.
    async fn find_by_id(&self, id: BoardId) -> BoardRepositoryResult<Option<Board>>;

    /// Runs a mutation against the board under the board-scoped lock and
    /// returns the committed aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::BoardNotFound`] when the board does
    /// not exist, [`BoardRepositoryError::Rejected`] when the closure
    /// refuses the mutation (nothing is committed), or
    /// [`BoardRepositoryError::Persistence`] for storage failures.
    async fn with_board(&self, id: BoardId, mutation: BoardMutation)
    -> BoardRepositoryResult<Board>;
}

/// Errors returned by board repository implementations.
#[derive(Debug, Clone, Error)]
pub enum BoardRepositoryError {
    /// A board with the same identifier already exists.
    #[error("duplicate board identifier: {0}")]
    DuplicateBoard(BoardId),

    /// The board was not found.
    #[error("board not found: {0}")]
    BoardNotFound(BoardId),

    /// The mutation closure rejected the change; nothing was committed.
    #[error(transparent)]
    Rejected(BoardDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl BoardRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
