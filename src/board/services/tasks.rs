//! Service layer for task (card) workflow operations.

use super::{WorkflowError, WorkflowResult};
use crate::board::{
    domain::{
        Board, BoardDomainError, BoardId, FieldUpdate, MemberId, NewTaskParams, Position, StepId,
        Task, TaskId, TaskName, UpdateTaskParams, WorkflowLimits,
    },
    ports::BoardRepository,
};
use mockable::Clock;
use std::sync::Arc;

/// Request payload for creating a task or a child task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    name: String,
    description: Option<String>,
}

impl CreateTaskRequest {
    /// Creates a request with the required name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Request payload for updating a task.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateTaskRequest {
    name: Option<String>,
    description: FieldUpdate<String>,
}

impl UpdateTaskRequest {
    /// Creates an empty update that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the task name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = FieldUpdate::Set(description.into());
        self
    }

    /// Clears the task description.
    #[must_use]
    pub fn clear_description(mut self) -> Self {
        self.description = FieldUpdate::Clear;
        self
    }
}

/// Target step and slot for a task move or child placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTaskRequest {
    /// Step receiving the task.
    pub target_step: StepId,
    /// 1-based slot within the target step's order.
    pub target_position: i32,
}

impl MoveTaskRequest {
    /// Creates a move request.
    #[must_use]
    pub const fn new(target_step: StepId, target_position: i32) -> Self {
        Self {
            target_step,
            target_position,
        }
    }
}

/// Task workflow orchestration service.
#[derive(Clone)]
pub struct TaskWorkflowService<R, C>
where
    R: BoardRepository,
    C: Clock + Send + Sync + 'static,
{
    repository: Arc<R>,
    clock: Arc<C>,
    limits: WorkflowLimits,
}

impl<R, C> TaskWorkflowService<R, C>
where
    R: BoardRepository,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a task workflow service with default limits.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self::with_limits(repository, clock, WorkflowLimits::default())
    }

    /// Creates a task workflow service with explicit limits.
    #[must_use]
    pub const fn with_limits(repository: Arc<R>, clock: Arc<C>, limits: WorkflowLimits) -> Self {
        Self {
            repository,
            clock,
            limits,
        }
    }

    fn new_task_params(&self, request: CreateTaskRequest) -> WorkflowResult<NewTaskParams> {
        Ok(NewTaskParams {
            id: TaskId::new(),
            name: TaskName::with_limits(request.name, &self.limits)?,
            description: request.description,
        })
    }

    /// Creates a task in the board's first step.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when validation fails, the board does
    /// not exist, or the board has no steps.
    pub async fn create_task(
        &self,
        board_id: BoardId,
        request: CreateTaskRequest,
    ) -> WorkflowResult<Task> {
        let params = self.new_task_params(request)?;
        let task_id = params.id;
        let clock = Arc::clone(&self.clock);
        let board = self
            .repository
            .with_board(board_id, Box::new(move |board| board.add_task(params, &*clock)))
            .await?;
        committed_task(&board, task_id)
    }

    /// Creates an unplaced child task under a parent.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when validation fails or the board or
    /// parent does not exist.
    pub async fn add_child(
        &self,
        board_id: BoardId,
        parent: TaskId,
        request: CreateTaskRequest,
    ) -> WorkflowResult<Task> {
        let params = self.new_task_params(request)?;
        let task_id = params.id;
        let clock = Arc::clone(&self.clock);
        let board = self
            .repository
            .with_board(
                board_id,
                Box::new(move |board| board.add_child(parent, params, &*clock)),
            )
            .await?;
        committed_task(&board, task_id)
    }

    /// Removes a child from its parent; an unplaced child is deleted with
    /// its subtree, a placed child is only unlinked.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the board, parent, or child does
    /// not exist, or the child does not belong to the parent.
    pub async fn remove_child(
        &self,
        board_id: BoardId,
        parent: TaskId,
        child: TaskId,
    ) -> WorkflowResult<()> {
        let clock = Arc::clone(&self.clock);
        self.repository
            .with_board(
                board_id,
                Box::new(move |board| board.remove_child(parent, child, &*clock)),
            )
            .await?;
        Ok(())
    }

    /// Retrieves a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the board or task does not exist.
    pub async fn get_task(&self, board_id: BoardId, task_id: TaskId) -> WorkflowResult<Task> {
        let board = super::load_board(&*self.repository, board_id).await?;
        committed_task(&board, task_id)
    }

    /// Updates a task's name or description.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when validation fails or the board or
    /// task does not exist.
    pub async fn update_task(
        &self,
        board_id: BoardId,
        task_id: TaskId,
        request: UpdateTaskRequest,
    ) -> WorkflowResult<Task> {
        let params = UpdateTaskParams {
            name: request
                .name
                .map(|name| TaskName::with_limits(name, &self.limits))
                .transpose()?,
            description: request.description,
        };
        let clock = Arc::clone(&self.clock);
        let board = self
            .repository
            .with_board(
                board_id,
                Box::new(move |board| board.update_task(task_id, params, &*clock)),
            )
            .await?;
        committed_task(&board, task_id)
    }

    /// Deletes a task and all of its descendants.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the board or task does not exist,
    /// the task is finished, or the task has no step.
    pub async fn delete_task(&self, board_id: BoardId, task_id: TaskId) -> WorkflowResult<()> {
        let clock = Arc::clone(&self.clock);
        self.repository
            .with_board(
                board_id,
                Box::new(move |board| board.delete_task(task_id, &*clock)),
            )
            .await?;
        Ok(())
    }

    /// Moves a task into a step at the requested position.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] for missing entities, frozen or stepless
    /// tasks, an unassigned task entering a terminal step, a full step,
    /// or an out-of-range position.
    pub async fn move_task(
        &self,
        board_id: BoardId,
        task_id: TaskId,
        request: MoveTaskRequest,
    ) -> WorkflowResult<Task> {
        let target = Position::new(request.target_position)?;
        let target_step = request.target_step;
        let clock = Arc::clone(&self.clock);
        let board = self
            .repository
            .with_board(
                board_id,
                Box::new(move |board| board.move_task(task_id, target_step, target, &*clock)),
            )
            .await?;
        committed_task(&board, task_id)
    }

    /// Places an unplaced child onto a step at the requested position.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] for missing entities, a child that does
    /// not belong to the parent or is already placed, an unassigned child
    /// entering a terminal step, a full step, or an out-of-range position.
    pub async fn place_child(
        &self,
        board_id: BoardId,
        parent: TaskId,
        child: TaskId,
        request: MoveTaskRequest,
    ) -> WorkflowResult<Task> {
        let target = Position::new(request.target_position)?;
        let target_step = request.target_step;
        let clock = Arc::clone(&self.clock);
        let board = self
            .repository
            .with_board(
                board_id,
                Box::new(move |board| {
                    board.place_child(parent, child, target_step, target, &*clock)
                }),
            )
            .await?;
        committed_task(&board, child)
    }

    /// Assigns a board member to a task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the board, task, or member does not
    /// exist, the task is finished, or it already has an assignee.
    pub async fn assign_member(
        &self,
        board_id: BoardId,
        task_id: TaskId,
        member: MemberId,
    ) -> WorkflowResult<Task> {
        let clock = Arc::clone(&self.clock);
        let board = self
            .repository
            .with_board(
                board_id,
                Box::new(move |board| board.assign_member(task_id, member, &*clock)),
            )
            .await?;
        committed_task(&board, task_id)
    }

    /// Removes the given member's assignment from a task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the board, task, or member does not
    /// exist, the task is finished, the task has no assignee, or the
    /// member is not the current assignee.
    pub async fn unassign_member(
        &self,
        board_id: BoardId,
        task_id: TaskId,
        member: MemberId,
    ) -> WorkflowResult<Task> {
        let clock = Arc::clone(&self.clock);
        let board = self
            .repository
            .with_board(
                board_id,
                Box::new(move |board| board.unassign_member(task_id, member, &*clock)),
            )
            .await?;
        committed_task(&board, task_id)
    }

    /// Re-derives a dense ordering over a task's unplaced children.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the board or parent does not exist.
    pub async fn recount_children(
        &self,
        board_id: BoardId,
        parent: TaskId,
    ) -> WorkflowResult<Vec<Task>> {
        let clock = Arc::clone(&self.clock);
        let board = self
            .repository
            .with_board(
                board_id,
                Box::new(move |board| board.recount_children(parent, &*clock)),
            )
            .await?;
        Ok(board.children_of(parent).into_iter().cloned().collect())
    }

    /// Lists the tasks of a step ordered by position.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the board or step does not exist.
    pub async fn list_tasks_in_step(
        &self,
        board_id: BoardId,
        step_id: StepId,
    ) -> WorkflowResult<Vec<Task>> {
        let board = super::load_board(&*self.repository, board_id).await?;
        if board.step(step_id).is_none() {
            return Err(WorkflowError::Domain(BoardDomainError::StepNotFound(
                step_id,
            )));
        }
        Ok(board.tasks_in_step(step_id).into_iter().cloned().collect())
    }

    /// Lists the unplaced children of a parent task ordered by position.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the board or parent does not exist.
    pub async fn list_children(
        &self,
        board_id: BoardId,
        parent: TaskId,
    ) -> WorkflowResult<Vec<Task>> {
        let board = super::load_board(&*self.repository, board_id).await?;
        if board.task(parent).is_none() {
            return Err(WorkflowError::Domain(BoardDomainError::TaskNotFound(
                parent,
            )));
        }
        Ok(board.children_of(parent).into_iter().cloned().collect())
    }
}

fn committed_task(board: &Board, task_id: TaskId) -> WorkflowResult<Task> {
    board
        .task(task_id)
        .cloned()
        .ok_or(WorkflowError::Domain(BoardDomainError::TaskNotFound(
            task_id,
        )))
}
