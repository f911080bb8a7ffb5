//! Error types for board workflow validation and mutation.

use super::{MemberId, StepId, TaskId};
use thiserror::Error;

/// Coarse classification of a [`BoardDomainError`].
///
/// Resolver layers map kinds to transport-level codes without matching on
/// individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardErrorKind {
    /// A referenced entity does not exist on the board.
    NotFound,
    /// The operation is not permitted in the entity's current state.
    InvalidState,
    /// The target step cannot accept more tasks.
    CapacityExceeded,
    /// The requested position has no corresponding slot.
    PositionOutOfRange,
    /// The assignment request conflicts with the current assignee.
    AssignmentConflict,
    /// A precondition for the operation does not hold.
    PreconditionFailed,
    /// An input value failed validation.
    Validation,
}

/// Errors returned while validating or mutating board workflow state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardDomainError {
    /// The step does not exist on the board.
    #[error("step not found: {0}")]
    StepNotFound(StepId),

    /// The task does not exist on the board.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The member does not belong to the board.
    #[error("member not found: {0}")]
    MemberNotFound(MemberId),

    /// The task is not a child of the claimed parent.
    #[error("task {child} is not a child of task {parent}")]
    TaskNotChildOfParent {
        /// Claimed parent task.
        parent: TaskId,
        /// Task that failed the parentage check.
        child: TaskId,
    },

    /// The task has already been finished and can no longer change.
    #[error("task {0} has already been finished")]
    TaskAlreadyFinished(TaskId),

    /// The task does not have a step and the operation requires one.
    #[error("task {0} does not have a step")]
    TaskWithoutStep(TaskId),

    /// The child task already sits on a step.
    #[error("task {0} has already been placed on a step")]
    TaskAlreadyPlaced(TaskId),

    /// The terminal step is pinned to the last position and cannot be moved.
    #[error("step {0} is terminal and cannot be moved")]
    TerminalStepPinned(StepId),

    /// The step is at its configured capacity.
    #[error("step {0} is full")]
    StepFull(StepId),

    /// The requested target position has no corresponding slot.
    #[error("target position {0} does not exist")]
    PositionOutOfRange(i32),

    /// The sibling group has reached the persisted position ceiling.
    #[error("ordered group cannot hold more entries")]
    OrderFull,

    /// The task already has an assigned member.
    #[error("task {0} already has an assigned user")]
    TaskAlreadyAssigned(TaskId),

    /// The task does not have an assigned member.
    #[error("task {0} does not have an assigned user")]
    TaskNotAssigned(TaskId),

    /// The given member is not the one assigned to the task.
    #[error("member {member} is not assigned to task {task}")]
    AssignedToDifferentMember {
        /// Task whose assignment was challenged.
        task: TaskId,
        /// Member that is not the current assignee.
        member: MemberId,
    },

    /// The board has no steps, so tasks cannot be created on it.
    #[error("board must have at least one step")]
    BoardHasNoSteps,

    /// The board name is empty after trimming.
    #[error("board name must not be empty")]
    EmptyBoardName,

    /// The step name is empty after trimming.
    #[error("step name must not be empty")]
    EmptyStepName,

    /// The task name is empty after trimming.
    #[error("task name must not be empty")]
    EmptyTaskName,

    /// The name exceeds the configured length limit.
    #[error("name exceeds the maximum length of {max} characters")]
    NameTooLong {
        /// Maximum permitted length in characters.
        max: usize,
    },

    /// Step capacity must be at least one.
    #[error("step capacity must be a positive integer")]
    ZeroCapacity,

    /// Positions are 1-based; zero and negative values are invalid.
    #[error("position must be a positive integer")]
    ZeroPosition,
}

impl BoardDomainError {
    /// Returns the coarse classification of this error.
    #[must_use]
    pub const fn kind(&self) -> BoardErrorKind {
        match self {
            Self::StepNotFound(_)
            | Self::TaskNotFound(_)
            | Self::MemberNotFound(_)
            | Self::TaskNotChildOfParent { .. } => BoardErrorKind::NotFound,
            Self::TaskAlreadyFinished(_)
            | Self::TaskWithoutStep(_)
            | Self::TaskAlreadyPlaced(_)
            | Self::TerminalStepPinned(_) => BoardErrorKind::InvalidState,
            Self::StepFull(_) => BoardErrorKind::CapacityExceeded,
            Self::PositionOutOfRange(_) | Self::OrderFull => BoardErrorKind::PositionOutOfRange,
            Self::TaskAlreadyAssigned(_)
            | Self::TaskNotAssigned(_)
            | Self::AssignedToDifferentMember { .. } => BoardErrorKind::AssignmentConflict,
            Self::BoardHasNoSteps => BoardErrorKind::PreconditionFailed,
            Self::EmptyBoardName
            | Self::EmptyStepName
            | Self::EmptyTaskName
            | Self::NameTooLong { .. }
            | Self::ZeroCapacity
            | Self::ZeroPosition => BoardErrorKind::Validation,
        }
    }
}

/// Error returned while parsing step kinds from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown step kind: {0}")]
pub struct ParseStepKindError(pub String);
