//! Domain model for the board workflow engine.
//!
//! The domain covers the board aggregate, its ordered steps and tasks, the
//! shared position ledger, and the failure taxonomy, while keeping all
//! infrastructure concerns outside of the domain boundary.

mod board;
mod error;
mod ids;
mod ordering;
mod step;
mod task;
mod values;

pub use board::{Board, PersistedBoardData, UpdateStepParams, UpdateTaskParams};
pub use error::{BoardDomainError, BoardErrorKind, ParseStepKindError};
pub use ids::{BoardId, MemberId, StepId, TaskId};
pub use ordering::GroupOrder;
pub use step::{NewStepParams, PersistedStepData, Step, StepKind};
pub use task::{NewTaskParams, PersistedTaskData, SiblingGroup, Task, TaskStage};
pub use values::{BoardName, Capacity, FieldUpdate, Position, StepName, TaskName, WorkflowLimits};
