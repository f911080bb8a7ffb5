//! Service layer for step (column) workflow operations.

use super::{WorkflowError, WorkflowResult};
use crate::board::{
    domain::{
        Board, BoardDomainError, BoardId, Capacity, FieldUpdate, NewStepParams, Position, Step,
        StepId, StepKind, StepName, UpdateStepParams, WorkflowLimits,
    },
    ports::BoardRepository,
};
use mockable::Clock;
use std::sync::Arc;

/// Request payload for creating a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStepRequest {
    name: String,
    description: Option<String>,
    kind: StepKind,
    capacity: Option<i32>,
}

impl CreateStepRequest {
    /// Creates a request with required fields.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: StepKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            capacity: None,
        }
    }

    /// Sets the step description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the step capacity.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: i32) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

/// Request payload for updating a step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateStepRequest {
    name: Option<String>,
    description: FieldUpdate<String>,
    capacity: FieldUpdate<i32>,
}

impl UpdateStepRequest {
    /// Creates an empty update that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the step name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the step description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = FieldUpdate::Set(description.into());
        self
    }

    /// Clears the step description.
    #[must_use]
    pub fn clear_description(mut self) -> Self {
        self.description = FieldUpdate::Clear;
        self
    }

    /// Replaces the step capacity.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: i32) -> Self {
        self.capacity = FieldUpdate::Set(capacity);
        self
    }

    /// Removes the step capacity limit.
    #[must_use]
    pub const fn clear_capacity(mut self) -> Self {
        self.capacity = FieldUpdate::Clear;
        self
    }
}

/// Step workflow orchestration service.
#[derive(Clone)]
pub struct StepWorkflowService<R, C>
where
    R: BoardRepository,
    C: Clock + Send + Sync + 'static,
{
    repository: Arc<R>,
    clock: Arc<C>,
    limits: WorkflowLimits,
}

impl<R, C> StepWorkflowService<R, C>
where
    R: BoardRepository,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a step workflow service with default limits.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self::with_limits(repository, clock, WorkflowLimits::default())
    }

    /// Creates a step workflow service with explicit limits.
    #[must_use]
    pub const fn with_limits(repository: Arc<R>, clock: Arc<C>, limits: WorkflowLimits) -> Self {
        Self {
            repository,
            clock,
            limits,
        }
    }

    /// Creates a step at the end of the board's step order.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when input validation fails, the board
    /// does not exist, or persistence rejects the mutation.
    pub async fn create_step(
        &self,
        board_id: BoardId,
        request: CreateStepRequest,
    ) -> WorkflowResult<Step> {
        let params = NewStepParams {
            id: StepId::new(),
            name: StepName::with_limits(request.name, &self.limits)?,
            description: request.description,
            kind: request.kind,
            capacity: request.capacity.map(Capacity::new).transpose()?,
        };
        let step_id = params.id;
        let clock = Arc::clone(&self.clock);
        let board = self
            .repository
            .with_board(board_id, Box::new(move |board| board.add_step(params, &*clock)))
            .await?;
        committed_step(&board, step_id)
    }

    /// Updates a step's name, description, or capacity.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when validation fails or the board or
    /// step does not exist.
    pub async fn update_step(
        &self,
        board_id: BoardId,
        step_id: StepId,
        request: UpdateStepRequest,
    ) -> WorkflowResult<Step> {
        let params = UpdateStepParams {
            name: request
                .name
                .map(|name| StepName::with_limits(name, &self.limits))
                .transpose()?,
            description: request.description,
            capacity: request.capacity.try_map(Capacity::new)?,
        };
        let clock = Arc::clone(&self.clock);
        let board = self
            .repository
            .with_board(
                board_id,
                Box::new(move |board| board.update_step(step_id, params, &*clock)),
            )
            .await?;
        committed_step(&board, step_id)
    }

    /// Removes a step, detaching the tasks it contained.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the board or step does not exist.
    pub async fn remove_step(&self, board_id: BoardId, step_id: StepId) -> WorkflowResult<()> {
        let clock = Arc::clone(&self.clock);
        self.repository
            .with_board(
                board_id,
                Box::new(move |board| board.remove_step(step_id, &*clock)),
            )
            .await?;
        Ok(())
    }

    /// Marks a step as the board's terminal step, relocating it to the
    /// last position unless it is already last.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the board or step does not exist.
    pub async fn mark_step_finished(
        &self,
        board_id: BoardId,
        step_id: StepId,
    ) -> WorkflowResult<Step> {
        let clock = Arc::clone(&self.clock);
        let board = self
            .repository
            .with_board(
                board_id,
                Box::new(move |board| board.mark_step_finished(step_id, &*clock)),
            )
            .await?;
        committed_step(&board, step_id)
    }

    /// Moves a step to a new position in the board order.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the board or step does not exist,
    /// the step is terminal (pinned), or the target position is out of
    /// range.
    pub async fn move_step(
        &self,
        board_id: BoardId,
        step_id: StepId,
        target_position: i32,
    ) -> WorkflowResult<Step> {
        let target = Position::new(target_position)?;
        let clock = Arc::clone(&self.clock);
        let board = self
            .repository
            .with_board(
                board_id,
                Box::new(move |board| board.move_step(step_id, target, &*clock)),
            )
            .await?;
        committed_step(&board, step_id)
    }

    /// Retrieves a step by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the board or step does not exist.
    pub async fn get_step(&self, board_id: BoardId, step_id: StepId) -> WorkflowResult<Step> {
        let board = super::load_board(&*self.repository, board_id).await?;
        committed_step(&board, step_id)
    }

    /// Lists the board's steps ordered by position.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the board does not exist.
    pub async fn list_steps(&self, board_id: BoardId) -> WorkflowResult<Vec<Step>> {
        let board = super::load_board(&*self.repository, board_id).await?;
        Ok(board.steps().into_iter().cloned().collect())
    }
}

fn committed_step(board: &Board, step_id: StepId) -> WorkflowResult<Step> {
    board
        .step(step_id)
        .cloned()
        .ok_or(WorkflowError::Domain(BoardDomainError::StepNotFound(
            step_id,
        )))
}
