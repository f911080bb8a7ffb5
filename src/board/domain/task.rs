//! Task (card) entity, lifecycle stage, and sibling-group addressing.

use super::{MemberId, Position, StepId, TaskId, TaskName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived lifecycle stage of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStage {
    /// The task has no step yet (an unplaced child or a detached task).
    Unplaced,
    /// The task sits on a non-terminal step.
    Active,
    /// The task sits on the board's terminal step.
    Finished,
}

/// The ordered collection a task currently belongs to.
///
/// Every task is in exactly one sibling group at a time; positions are
/// dense and unique per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "group", rename_all = "snake_case")]
pub enum SiblingGroup {
    /// The task order of a step.
    Step {
        /// Owning step.
        step: StepId,
    },
    /// The unplaced-children order of a parent task.
    Children {
        /// Owning parent task.
        parent: TaskId,
    },
    /// The board's pool of tasks with neither step nor parent.
    Detached,
}

/// Parameter object for creating a task on a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskParams {
    /// Identifier assigned by the caller.
    pub id: TaskId,
    /// Validated task name.
    pub name: TaskName,
    /// Optional free-form description.
    pub description: Option<String>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted task name.
    pub name: TaskName,
    /// Persisted description, if any.
    pub description: Option<String>,
    /// Persisted owning step, if any.
    pub step: Option<StepId>,
    /// Persisted parent task, if any.
    pub parent: Option<TaskId>,
    /// Persisted position within the sibling group.
    pub position: Position,
    /// Persisted assignee, if any.
    pub assigned_to: Option<MemberId>,
    /// Persisted first-placement timestamp, if any.
    pub start_date: Option<DateTime<Utc>>,
    /// Persisted finish timestamp, if any.
    pub finish_date: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Task (card): a unit of work on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    name: TaskName,
    description: Option<String>,
    step: Option<StepId>,
    parent: Option<TaskId>,
    position: Position,
    assigned_to: Option<MemberId>,
    start_date: Option<DateTime<Utc>>,
    finish_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a task placed on a step.
    pub(super) fn new_in_step(
        params: NewTaskParams,
        step: StepId,
        position: Position,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(params, Some(step), None, position, now)
    }

    /// Creates an unplaced child of a parent task.
    pub(super) fn new_child(
        params: NewTaskParams,
        parent: TaskId,
        position: Position,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(params, None, Some(parent), position, now)
    }

    fn new(
        params: NewTaskParams,
        step: Option<StepId>,
        parent: Option<TaskId>,
        position: Position,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: params.id,
            name: params.name,
            description: params.description,
            step,
            parent,
            position,
            assigned_to: None,
            start_date: None,
            finish_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            description: data.description,
            step: data.step,
            parent: data.parent,
            position: data.position,
            assigned_to: data.assigned_to,
            start_date: data.start_date,
            finish_date: data.finish_date,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task name.
    #[must_use]
    pub const fn name(&self) -> &TaskName {
        &self.name
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the owning step, if the task is placed.
    #[must_use]
    pub const fn step(&self) -> Option<StepId> {
        self.step
    }

    /// Returns the parent task, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<TaskId> {
        self.parent
    }

    /// Returns the 1-based position within the current sibling group.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Returns the assigned member, if any.
    #[must_use]
    pub const fn assigned_to(&self) -> Option<MemberId> {
        self.assigned_to
    }

    /// Returns the first-placement timestamp, if set.
    #[must_use]
    pub const fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }

    /// Returns the finish timestamp, if set.
    #[must_use]
    pub const fn finish_date(&self) -> Option<DateTime<Utc>> {
        self.finish_date
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the sibling group this task is ordered in.
    #[must_use]
    pub const fn sibling_group(&self) -> SiblingGroup {
        match (self.step, self.parent) {
            (Some(step), _) => SiblingGroup::Step { step },
            (None, Some(parent)) => SiblingGroup::Children { parent },
            (None, None) => SiblingGroup::Detached,
        }
    }

    pub(super) fn rename(&mut self, name: TaskName) {
        self.name = name;
    }

    pub(super) const fn description_mut(&mut self) -> &mut Option<String> {
        &mut self.description
    }

    pub(super) const fn set_step(&mut self, step: Option<StepId>) {
        self.step = step;
    }

    pub(super) const fn clear_parent(&mut self) {
        self.parent = None;
    }

    /// Writes a new position; returns `true` when it differs from the
    /// current one.
    pub(super) const fn set_position(&mut self, position: Position) -> bool {
        if self.position.get() == position.get() {
            return false;
        }
        self.position = position;
        true
    }

    pub(super) const fn set_assignee(&mut self, member: Option<MemberId>) {
        self.assigned_to = member;
    }

    /// Sets the start date once; later calls leave the first value intact.
    pub(super) const fn mark_started(&mut self, now: DateTime<Utc>) {
        if self.start_date.is_none() {
            self.start_date = Some(now);
        }
    }

    /// Sets the finish date once; later calls leave the first value intact.
    pub(super) const fn mark_finished(&mut self, now: DateTime<Utc>) {
        if self.finish_date.is_none() {
            self.finish_date = Some(now);
        }
    }

    pub(super) const fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
