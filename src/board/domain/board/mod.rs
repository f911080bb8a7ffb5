//! Board aggregate root: step ordering, the terminal marker, and membership.
//!
//! The aggregate owns every step and task on the board and is the only
//! place positions are rewritten, so the dense-ordering invariant is
//! enforced on one code path. Task operations live in the [`task_ops`]
//! child module.

mod task_ops;

pub use task_ops::UpdateTaskParams;

use super::{
    BoardDomainError, BoardId, BoardName, Capacity, FieldUpdate, GroupOrder, MemberId,
    NewStepParams, Position, SiblingGroup, Step, StepId, StepName, Task, TaskId,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Parameter object for updating a step's mutable fields.
///
/// `kind` is fixed at creation and cannot be updated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateStepParams {
    /// Replacement name, when given.
    pub name: Option<StepName>,
    /// Description update.
    pub description: FieldUpdate<String>,
    /// Capacity update; clearing removes the limit, and lowering it below
    /// the current load only blocks future entrants.
    pub capacity: FieldUpdate<Capacity>,
}

/// Parameter object for reconstructing a persisted board aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedBoardData {
    /// Persisted board identifier.
    pub id: BoardId,
    /// Persisted board name.
    pub name: BoardName,
    /// Persisted creator.
    pub creator: MemberId,
    /// Persisted member set.
    pub members: BTreeSet<MemberId>,
    /// Persisted steps.
    pub steps: Vec<Step>,
    /// Persisted tasks.
    pub tasks: Vec<Task>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Board aggregate root.
///
/// Holds an ordered collection of steps and an arena of tasks keyed by
/// identifier, with parent links stored as optional identifiers rather
/// than owning references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    id: BoardId,
    name: BoardName,
    creator: MemberId,
    members: BTreeSet<MemberId>,
    steps: BTreeMap<StepId, Step>,
    tasks: BTreeMap<TaskId, Task>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Board {
    /// Creates an empty board; the creator is always a member.
    #[must_use]
    pub fn new(name: BoardName, creator: MemberId, clock: &impl Clock) -> Self {
        let now = clock.utc();
        let mut members = BTreeSet::new();
        members.insert(creator);
        Self {
            id: BoardId::new(),
            name,
            creator,
            members,
            steps: BTreeMap::new(),
            tasks: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstructs a board from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedBoardData) -> Self {
        let mut members = data.members;
        members.insert(data.creator);
        Self {
            id: data.id,
            name: data.name,
            creator: data.creator,
            members,
            steps: data.steps.into_iter().map(|s| (s.id(), s)).collect(),
            tasks: data.tasks.into_iter().map(|t| (t.id(), t)).collect(),
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the board identifier.
    #[must_use]
    pub const fn id(&self) -> BoardId {
        self.id
    }

    /// Returns the board name.
    #[must_use]
    pub const fn name(&self) -> &BoardName {
        &self.name
    }

    /// Returns the board creator.
    #[must_use]
    pub const fn creator(&self) -> MemberId {
        self.creator
    }

    /// Returns the member set.
    #[must_use]
    pub const fn members(&self) -> &BTreeSet<MemberId> {
        &self.members
    }

    /// Returns `true` when the member belongs to the board.
    #[must_use]
    pub fn is_member(&self, member: MemberId) -> bool {
        self.members.contains(&member)
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

    /// Adds a member to the board; returns `true` when newly added.
    pub fn add_member(&mut self, member: MemberId, clock: &impl Clock) -> bool {
        let added = self.members.insert(member);
        if added {
            self.touch(clock.utc());
        }
        added
    }

    /// Returns the step with the given identifier, if present.
    #[must_use]
    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.steps.get(&id)
    }

    /// Returns all steps ordered by position.
    #[must_use]
    pub fn steps(&self) -> Vec<&Step> {
        let mut steps: Vec<&Step> = self.steps.values().collect();
        steps.sort_by_key(|step| step.position());
        steps
    }

    /// Returns the board's terminal step, if one has been marked.
    #[must_use]
    pub fn terminal_step(&self) -> Option<&Step> {
        self.steps.values().find(|step| step.is_terminal())
    }

    /// Appends a step to the board order.
    ///
    /// While a terminal step exists it stays last: the new step takes the
    /// slot directly before it.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::OrderFull`] at the position ceiling.
    pub fn add_step(
        &mut self,
        params: NewStepParams,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        let now = clock.utc();
        let mut order = self.step_order();
        let end_slot = order
            .len()
            .checked_add(1)
            .and_then(|slot| i32::try_from(slot).ok())
            .ok_or(BoardDomainError::OrderFull)?;
        let slot = self
            .terminal_step()
            .map_or(Position::from_sequence(end_slot), Step::position);
        order.insert_at(params.id, slot)?;
        let step = Step::new(params, Position::FIRST, now);
        self.steps.insert(step.id(), step);
        self.apply_step_order(&order, now);
        self.touch(now);
        Ok(())
    }

    /// Updates a step's name, description, or capacity.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::StepNotFound`] when the step is not on
    /// this board.
    pub fn update_step(
        &mut self,
        step_id: StepId,
        update: UpdateStepParams,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        let now = clock.utc();
        let step = self
            .steps
            .get_mut(&step_id)
            .ok_or(BoardDomainError::StepNotFound(step_id))?;
        let mut changed = false;
        if let Some(name) = update.name {
            step.rename(name);
            changed = true;
        }
        changed |= update.description.apply_to(step.description_mut());
        changed |= update.capacity.apply_to(step.capacity_mut());
        if changed {
            step.touch(now);
            self.touch(now);
        }
        Ok(())
    }

    /// Removes a step and detaches every task it contained.
    ///
    /// Remaining steps close the gap. Detached tasks lose their step
    /// reference and re-home to their parent's children order, or to the
    /// board's detached pool when they have no parent; they need an
    /// explicit future move before lifecycle actions such as delete.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::StepNotFound`] when the step is not on
    /// this board, or [`BoardDomainError::OrderFull`] when a destination
    /// group is at the position ceiling.
    pub fn remove_step(
        &mut self,
        step_id: StepId,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        let now = clock.utc();
        if !self.steps.contains_key(&step_id) {
            return Err(BoardDomainError::StepNotFound(step_id));
        }
        let contained = self.ordered_task_ids(SiblingGroup::Step { step: step_id });
        self.steps.remove(&step_id);
        let remaining = self.step_order();
        self.apply_step_order(&remaining, now);
        for task_id in contained {
            self.rehome_detached_task(task_id, now)?;
        }
        self.touch(now);
        Ok(())
    }

    /// Marks a step as the board's terminal step.
    ///
    /// Any other step's marker is cleared in the same mutation. The step
    /// relocates to the last position unless it is already last, in which
    /// case no repositioning occurs.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::StepNotFound`] when the step is not on
    /// this board.
    pub fn mark_step_finished(
        &mut self,
        step_id: StepId,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        let now = clock.utc();
        if !self.steps.contains_key(&step_id) {
            return Err(BoardDomainError::StepNotFound(step_id));
        }
        let mut order = self.step_order();
        let is_last = order.entries().last().map(|(id, _)| id) == Some(step_id);
        let previous = self
            .terminal_step()
            .map(Step::id)
            .filter(|id| *id != step_id);
        if previous.is_none() && is_last && self.steps.get(&step_id).is_some_and(Step::is_terminal)
        {
            return Ok(());
        }
        if let Some(previous_id) = previous
            && let Some(cleared) = self.steps.get_mut(&previous_id)
        {
            cleared.set_terminal(false);
            cleared.touch(now);
        }
        if let Some(step) = self.steps.get_mut(&step_id) {
            step.set_terminal(true);
            step.touch(now);
        }
        if !is_last {
            order.remove(step_id);
            order.append(step_id)?;
            self.apply_step_order(&order, now);
        }
        self.touch(now);
        Ok(())
    }

    /// Moves a step to a new position in the board order.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::StepNotFound`] when the step is not on
    /// this board, [`BoardDomainError::TerminalStepPinned`] when it holds
    /// the terminal marker, or [`BoardDomainError::PositionOutOfRange`]
    /// when the target exceeds the manual range (the last slot is reserved
    /// while a terminal step exists).
    pub fn move_step(
        &mut self,
        step_id: StepId,
        target: Position,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        let now = clock.utc();
        let step = self
            .steps
            .get(&step_id)
            .ok_or(BoardDomainError::StepNotFound(step_id))?;
        if step.is_terminal() {
            return Err(BoardDomainError::TerminalStepPinned(step_id));
        }
        let mut order = self.step_order();
        let reserved = usize::from(self.terminal_step().is_some());
        let manual_max = order.len().saturating_sub(reserved);
        if usize::try_from(target.get()).is_ok_and(|slot| slot > manual_max) {
            return Err(BoardDomainError::PositionOutOfRange(target.get()));
        }
        order.remove(step_id);
        order.insert_at(step_id, target)?;
        self.apply_step_order(&order, now);
        self.touch(now);
        Ok(())
    }

    fn step_order(&self) -> GroupOrder<StepId> {
        GroupOrder::from_positions(self.steps.values().map(|step| (step.id(), step.position())))
    }

    fn apply_step_order(&mut self, order: &GroupOrder<StepId>, now: DateTime<Utc>) {
        for (id, position) in order.entries() {
            if let Some(step) = self.steps.get_mut(&id)
                && step.set_position(position)
            {
                step.touch(now);
            }
        }
    }

    const fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
