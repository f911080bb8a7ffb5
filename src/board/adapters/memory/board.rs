//! In-memory board repository for tests and lightweight deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::board::{
    domain::{Board, BoardId},
    ports::{BoardMutation, BoardRepository, BoardRepositoryError, BoardRepositoryResult},
};

/// Thread-safe in-memory board repository.
///
/// The table lock doubles as the board-scoped group lock: a mutation runs
/// against a copy of the aggregate and replaces the stored one only on
/// success, bumping a per-board version counter.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBoardRepository {
    state: Arc<RwLock<InMemoryBoardState>>,
}

#[derive(Debug, Default)]
struct InMemoryBoardState {
    boards: HashMap<BoardId, StoredBoard>,
}

#[derive(Debug)]
struct StoredBoard {
    board: Board,
    version: u64,
}

impl InMemoryBoardRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the commit counter for a board, if stored.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the state lock is poisoned.
    pub fn version(&self, id: BoardId) -> BoardRepositoryResult<Option<u64>> {
        let state = read_state(&self.state)?;
        Ok(state.boards.get(&id).map(|stored| stored.version))
    }
}

fn read_state(
    state: &Arc<RwLock<InMemoryBoardState>>,
) -> BoardRepositoryResult<std::sync::RwLockReadGuard<'_, InMemoryBoardState>> {
    state
        .read()
        .map_err(|err| BoardRepositoryError::persistence(std::io::Error::other(err.to_string())))
}

fn write_state(
    state: &Arc<RwLock<InMemoryBoardState>>,
) -> BoardRepositoryResult<std::sync::RwLockWriteGuard<'_, InMemoryBoardState>> {
    state
        .write()
        .map_err(|err| BoardRepositoryError::persistence(std::io::Error::other(err.to_string())))
}

#[async_trait]
impl BoardRepository for InMemoryBoardRepository {
    async fn store(&self, board: &Board) -> BoardRepositoryResult<()> {
        let mut state = write_state(&self.state)?;
        if state.boards.contains_key(&board.id()) {
            return Err(BoardRepositoryError::DuplicateBoard(board.id()));
        }
        state.boards.insert(
            board.id(),
            StoredBoard {
                board: board.clone(),
                version: 0,
            },
        );
        Ok(())
    }

    async fn find_by_id(&self, id: BoardId) -> BoardRepositoryResult<Option<Board>> {
        let state = read_state(&self.state)?;
        Ok(state.boards.get(&id).map(|stored| stored.board.clone()))
    }

    async fn with_board(
        &self,
        id: BoardId,
        mutation: BoardMutation,
    ) -> BoardRepositoryResult<Board> {
        let mut state = write_state(&self.state)?;
        let stored = state
            .boards
            .get_mut(&id)
            .ok_or(BoardRepositoryError::BoardNotFound(id))?;
        let mut candidate = stored.board.clone();
        mutation(&mut candidate).map_err(BoardRepositoryError::Rejected)?;
        stored.board = candidate.clone();
        stored.version = stored.version.saturating_add(1);
        Ok(candidate)
    }
}
