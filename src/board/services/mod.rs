//! Orchestration services for the board workflow engine.
//!
//! Services are generic over the repository port and a [`mockable::Clock`]
//! so tests can pin time and swap persistence backends.

mod error;
mod steps;
mod tasks;

pub use error::{WorkflowError, WorkflowResult};
pub use steps::{CreateStepRequest, StepWorkflowService, UpdateStepRequest};
pub use tasks::{CreateTaskRequest, MoveTaskRequest, TaskWorkflowService, UpdateTaskRequest};

use crate::board::{
    domain::{Board, BoardId},
    ports::{BoardRepository, BoardRepositoryError},
};

async fn load_board<R: BoardRepository>(
    repository: &R,
    board_id: BoardId,
) -> WorkflowResult<Board> {
    repository
        .find_by_id(board_id)
        .await?
        .ok_or(WorkflowError::Repository(
            BoardRepositoryError::BoardNotFound(board_id),
        ))
}
