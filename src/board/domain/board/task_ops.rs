//! Task operations on the board aggregate.
//!
//! Covers creation, the parent/child hierarchy, cross-step movement with
//! capacity and finish semantics, assignment, and the recount repair path.

use super::Board;
use crate::board::domain::{
    BoardDomainError, FieldUpdate, GroupOrder, MemberId, NewTaskParams, Position, SiblingGroup,
    Step, StepId, Task, TaskId, TaskName, TaskStage,
};
use chrono::{DateTime, Utc};
use mockable::Clock;

/// Parameter object for updating a task's mutable fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateTaskParams {
    /// Replacement name, when given.
    pub name: Option<TaskName>,
    /// Description update.
    pub description: FieldUpdate<String>,
}

impl Board {
    /// Returns the task with the given identifier, if present.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Iterates every task on the board in no particular order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Returns the tasks of a step ordered by position.
    #[must_use]
    pub fn tasks_in_step(&self, step: StepId) -> Vec<&Task> {
        self.ordered_tasks(SiblingGroup::Step { step })
    }

    /// Returns the unplaced children of a parent task ordered by position.
    #[must_use]
    pub fn children_of(&self, parent: TaskId) -> Vec<&Task> {
        self.ordered_tasks(SiblingGroup::Children { parent })
    }

    /// Returns the tasks orphaned by step removal, ordered by position.
    #[must_use]
    pub fn detached_tasks(&self) -> Vec<&Task> {
        self.ordered_tasks(SiblingGroup::Detached)
    }

    /// Returns `true` when the task sits on the board's terminal step.
    #[must_use]
    pub fn is_task_finished(&self, task: &Task) -> bool {
        task.step()
            .and_then(|step| self.steps.get(&step))
            .is_some_and(Step::is_terminal)
    }

    /// Returns the derived lifecycle stage of a task.
    #[must_use]
    pub fn task_stage(&self, task: &Task) -> TaskStage {
        if task.step().is_none() {
            TaskStage::Unplaced
        } else if self.is_task_finished(task) {
            TaskStage::Finished
        } else {
            TaskStage::Active
        }
    }

    /// Creates a task in the board's first step by position, at the end
    /// of that step's order.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::BoardHasNoSteps`] when the board has no
    /// steps, or [`BoardDomainError::OrderFull`] at the position ceiling.
    pub fn add_task(
        &mut self,
        params: NewTaskParams,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        let now = clock.utc();
        let first_step = self
            .steps
            .values()
            .min_by_key(|step| step.position())
            .map(Step::id)
            .ok_or(BoardDomainError::BoardHasNoSteps)?;
        let mut order = self.task_group_order(SiblingGroup::Step { step: first_step });
        let position = order.append(params.id)?;
        let task = Task::new_in_step(params, first_step, position, now);
        self.tasks.insert(task.id(), task);
        self.touch(now);
        Ok(())
    }

    /// Creates an unplaced child task appended to the parent's children
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::TaskNotFound`] when the parent does not
    /// exist, or [`BoardDomainError::OrderFull`] at the position ceiling.
    pub fn add_child(
        &mut self,
        parent: TaskId,
        params: NewTaskParams,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        let now = clock.utc();
        if !self.tasks.contains_key(&parent) {
            return Err(BoardDomainError::TaskNotFound(parent));
        }
        let mut order = self.task_group_order(SiblingGroup::Children { parent });
        let position = order.append(params.id)?;
        let task = Task::new_child(params, parent, position, now);
        self.tasks.insert(task.id(), task);
        self.touch(now);
        Ok(())
    }

    /// Removes a child from its parent.
    ///
    /// An unplaced child is removed outright together with its subtree; a
    /// placed child is only unlinked from the parent and stays on the
    /// board.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::TaskNotFound`] when parent or child is
    /// missing, or [`BoardDomainError::TaskNotChildOfParent`] when the
    /// child does not belong to the parent.
    pub fn remove_child(
        &mut self,
        parent: TaskId,
        child: TaskId,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        let now = clock.utc();
        if !self.tasks.contains_key(&parent) {
            return Err(BoardDomainError::TaskNotFound(parent));
        }
        let child_task = self
            .tasks
            .get(&child)
            .ok_or(BoardDomainError::TaskNotFound(child))?;
        if child_task.parent() != Some(parent) {
            return Err(BoardDomainError::TaskNotChildOfParent { parent, child });
        }
        if child_task.step().is_some() {
            if let Some(unlinked) = self.tasks.get_mut(&child) {
                unlinked.clear_parent();
                unlinked.touch(now);
            }
        } else {
            self.remove_subtree(child, now);
        }
        self.touch(now);
        Ok(())
    }

    /// Updates a task's name or description.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::TaskNotFound`] when the task is not on
    /// this board.
    pub fn update_task(
        &mut self,
        task_id: TaskId,
        update: UpdateTaskParams,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        let now = clock.utc();
        let task = self
            .tasks
            .get_mut(&task_id)
            .ok_or(BoardDomainError::TaskNotFound(task_id))?;
        let mut changed = false;
        if let Some(name) = update.name {
            task.rename(name);
            changed = true;
        }
        changed |= update.description.apply_to(task.description_mut());
        if changed {
            task.touch(now);
            self.touch(now);
        }
        Ok(())
    }

    /// Deletes a task and all of its descendants.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::TaskNotFound`] when the task is missing,
    /// [`BoardDomainError::TaskAlreadyFinished`] when it is finished, or
    /// [`BoardDomainError::TaskWithoutStep`] when it has no step (a
    /// floating child must be placed before deletion).
    pub fn delete_task(
        &mut self,
        task_id: TaskId,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        let now = clock.utc();
        let task = self
            .tasks
            .get(&task_id)
            .ok_or(BoardDomainError::TaskNotFound(task_id))?;
        if self.is_task_finished(task) {
            return Err(BoardDomainError::TaskAlreadyFinished(task_id));
        }
        if task.step().is_none() {
            return Err(BoardDomainError::TaskWithoutStep(task_id));
        }
        self.remove_subtree(task_id, now);
        self.touch(now);
        Ok(())
    }

    /// Moves a task into a step at the target position.
    ///
    /// Sets `start_date` exactly once on the first successful move, and
    /// `finish_date` exactly once when the target step is terminal. A
    /// detached task may move; an unplaced child must be placed through
    /// [`Board::place_child`] instead.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::TaskNotFound`] or
    /// [`BoardDomainError::StepNotFound`] for missing entities,
    /// [`BoardDomainError::TaskAlreadyFinished`] for frozen tasks,
    /// [`BoardDomainError::TaskWithoutStep`] for unplaced children,
    /// [`BoardDomainError::TaskNotAssigned`] when a terminal target lacks
    /// an assignee, [`BoardDomainError::StepFull`] at capacity, or
    /// [`BoardDomainError::PositionOutOfRange`] for an invalid slot.
    pub fn move_task(
        &mut self,
        task_id: TaskId,
        target_step: StepId,
        target: Position,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        let now = clock.utc();
        let task = self
            .tasks
            .get(&task_id)
            .ok_or(BoardDomainError::TaskNotFound(task_id))?;
        let step = self
            .steps
            .get(&target_step)
            .ok_or(BoardDomainError::StepNotFound(target_step))?;
        if self.is_task_finished(task) {
            return Err(BoardDomainError::TaskAlreadyFinished(task_id));
        }
        if task.step().is_none() && task.parent().is_some() {
            return Err(BoardDomainError::TaskWithoutStep(task_id));
        }
        let step_is_terminal = step.is_terminal();
        if step_is_terminal && task.assigned_to().is_none() {
            return Err(BoardDomainError::TaskNotAssigned(task_id));
        }
        let source = task.sibling_group();
        self.ensure_step_has_room(target_step, task_id)?;
        self.relocate_into_step(task_id, source, target_step, target, now)?;
        self.stamp_after_placement(task_id, step_is_terminal, now);
        self.touch(now);
        Ok(())
    }

    /// Places an unplaced child onto a step at the target position.
    ///
    /// The child leaves the parent's children order, keeps its parent
    /// link, and gets `start_date` set exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::TaskNotFound`] for missing parent or
    /// child, [`BoardDomainError::TaskNotChildOfParent`] when the child
    /// does not belong to the parent,
    /// [`BoardDomainError::TaskAlreadyPlaced`] when the child already sits
    /// on a step, or the same step/terminal/capacity/position errors as
    /// [`Board::move_task`].
    pub fn place_child(
        &mut self,
        parent: TaskId,
        child: TaskId,
        target_step: StepId,
        target: Position,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        let now = clock.utc();
        if !self.tasks.contains_key(&parent) {
            return Err(BoardDomainError::TaskNotFound(parent));
        }
        let child_task = self
            .tasks
            .get(&child)
            .ok_or(BoardDomainError::TaskNotFound(child))?;
        if child_task.parent() != Some(parent) {
            return Err(BoardDomainError::TaskNotChildOfParent { parent, child });
        }
        if child_task.step().is_some() {
            return Err(BoardDomainError::TaskAlreadyPlaced(child));
        }
        let step = self
            .steps
            .get(&target_step)
            .ok_or(BoardDomainError::StepNotFound(target_step))?;
        let step_is_terminal = step.is_terminal();
        if step_is_terminal && child_task.assigned_to().is_none() {
            return Err(BoardDomainError::TaskNotAssigned(child));
        }
        self.ensure_step_has_room(target_step, child)?;
        self.relocate_into_step(
            child,
            SiblingGroup::Children { parent },
            target_step,
            target,
            now,
        )?;
        self.stamp_after_placement(child, step_is_terminal, now);
        self.touch(now);
        Ok(())
    }

    /// Assigns a board member to a task.
    ///
    /// Assignment is exclusive: one member per task.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::TaskNotFound`] when the task is missing,
    /// [`BoardDomainError::TaskAlreadyFinished`] when it is finished,
    /// [`BoardDomainError::MemberNotFound`] when the member is not on the
    /// board, or [`BoardDomainError::TaskAlreadyAssigned`] when the task
    /// already has an assignee.
    pub fn assign_member(
        &mut self,
        task_id: TaskId,
        member: MemberId,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        let now = clock.utc();
        let task = self
            .tasks
            .get(&task_id)
            .ok_or(BoardDomainError::TaskNotFound(task_id))?;
        if self.is_task_finished(task) {
            return Err(BoardDomainError::TaskAlreadyFinished(task_id));
        }
        if !self.members.contains(&member) {
            return Err(BoardDomainError::MemberNotFound(member));
        }
        if task.assigned_to().is_some() {
            return Err(BoardDomainError::TaskAlreadyAssigned(task_id));
        }
        if let Some(assigned) = self.tasks.get_mut(&task_id) {
            assigned.set_assignee(Some(member));
            assigned.touch(now);
        }
        self.touch(now);
        Ok(())
    }

    /// Removes the given member's assignment from a task.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::TaskNotFound`] when the task is missing,
    /// [`BoardDomainError::TaskAlreadyFinished`] when it is finished,
    /// [`BoardDomainError::MemberNotFound`] when the member is not on the
    /// board, [`BoardDomainError::TaskNotAssigned`] when the task has no
    /// assignee, or [`BoardDomainError::AssignedToDifferentMember`] when
    /// the given member is not the current assignee.
    pub fn unassign_member(
        &mut self,
        task_id: TaskId,
        member: MemberId,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        let now = clock.utc();
        let task = self
            .tasks
            .get(&task_id)
            .ok_or(BoardDomainError::TaskNotFound(task_id))?;
        if self.is_task_finished(task) {
            return Err(BoardDomainError::TaskAlreadyFinished(task_id));
        }
        if !self.members.contains(&member) {
            return Err(BoardDomainError::MemberNotFound(member));
        }
        let current = task
            .assigned_to()
            .ok_or(BoardDomainError::TaskNotAssigned(task_id))?;
        if current != member {
            return Err(BoardDomainError::AssignedToDifferentMember {
                task: task_id,
                member,
            });
        }
        if let Some(unassigned) = self.tasks.get_mut(&task_id) {
            unassigned.set_assignee(None);
            unassigned.touch(now);
        }
        self.touch(now);
        Ok(())
    }

    /// Re-derives a dense `1..=N` ordering over a task's unplaced-children
    /// order.
    ///
    /// Repair path for irregular removals; a well-formed children order is
    /// left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::TaskNotFound`] when the parent is not
    /// on this board.
    pub fn recount_children(
        &mut self,
        parent: TaskId,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        let now = clock.utc();
        if !self.tasks.contains_key(&parent) {
            return Err(BoardDomainError::TaskNotFound(parent));
        }
        let order = self.task_group_order(SiblingGroup::Children { parent });
        self.apply_task_order(&order, now);
        Ok(())
    }

    /// Task identifiers of a sibling group in position order.
    pub(super) fn ordered_task_ids(&self, group: SiblingGroup) -> Vec<TaskId> {
        self.task_group_order(group)
            .entries()
            .map(|(id, _)| id)
            .collect()
    }

    /// Re-homes a task whose step was just removed.
    ///
    /// The task keeps any parent link and joins that parent's children
    /// order, or the board's detached pool, at the end.
    pub(super) fn rehome_detached_task(
        &mut self,
        task_id: TaskId,
        now: DateTime<Utc>,
    ) -> Result<(), BoardDomainError> {
        let destination = self
            .tasks
            .get(&task_id)
            .and_then(Task::parent)
            .map_or(SiblingGroup::Detached, |parent| SiblingGroup::Children {
                parent,
            });
        let mut order = self.task_group_order(destination);
        let position = order.append(task_id)?;
        if let Some(task) = self.tasks.get_mut(&task_id) {
            task.set_step(None);
            task.set_position(position);
            task.touch(now);
        }
        Ok(())
    }

    fn ordered_tasks(&self, group: SiblingGroup) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks
            .values()
            .filter(|task| task.sibling_group() == group)
            .collect();
        tasks.sort_by_key(|task| task.position());
        tasks
    }

    fn task_group_order(&self, group: SiblingGroup) -> GroupOrder<TaskId> {
        GroupOrder::from_positions(
            self.tasks
                .values()
                .filter(|task| task.sibling_group() == group)
                .map(|task| (task.id(), task.position())),
        )
    }

    fn apply_task_order(&mut self, order: &GroupOrder<TaskId>, now: DateTime<Utc>) {
        for (id, position) in order.entries() {
            if let Some(task) = self.tasks.get_mut(&id)
                && task.set_position(position)
            {
                task.touch(now);
            }
        }
    }

    fn ensure_step_has_room(
        &self,
        step_id: StepId,
        moving: TaskId,
    ) -> Result<(), BoardDomainError> {
        let Some(capacity) = self.steps.get(&step_id).and_then(Step::capacity) else {
            return Ok(());
        };
        let occupied = self
            .tasks
            .values()
            .filter(|task| task.step() == Some(step_id) && task.id() != moving)
            .count();
        let limit = usize::try_from(capacity.get()).unwrap_or(usize::MAX);
        if occupied >= limit {
            return Err(BoardDomainError::StepFull(step_id));
        }
        Ok(())
    }

    /// Removes the task from its current group and inserts it into the
    /// step's order at the target slot. Validation happens before any
    /// position is written back, so a rejected move leaves the aggregate
    /// unchanged.
    fn relocate_into_step(
        &mut self,
        task_id: TaskId,
        source: SiblingGroup,
        target_step: StepId,
        target: Position,
        now: DateTime<Utc>,
    ) -> Result<(), BoardDomainError> {
        let destination = SiblingGroup::Step { step: target_step };
        if source == destination {
            let mut order = self.task_group_order(destination);
            order.remove(task_id);
            order.insert_at(task_id, target)?;
            self.apply_task_order(&order, now);
            return Ok(());
        }
        let mut source_order = self.task_group_order(source);
        source_order.remove(task_id);
        let mut destination_order = self.task_group_order(destination);
        destination_order.insert_at(task_id, target)?;
        self.apply_task_order(&source_order, now);
        if let Some(task) = self.tasks.get_mut(&task_id) {
            task.set_step(Some(target_step));
        }
        self.apply_task_order(&destination_order, now);
        Ok(())
    }

    fn stamp_after_placement(&mut self, task_id: TaskId, terminal: bool, now: DateTime<Utc>) {
        if let Some(task) = self.tasks.get_mut(&task_id) {
            task.mark_started(now);
            if terminal {
                task.mark_finished(now);
            }
            task.touch(now);
        }
    }

    /// Removes a task and its whole subtree, gap-closing every affected
    /// sibling group.
    fn remove_subtree(&mut self, root: TaskId, now: DateTime<Utc>) {
        let ids = self.subtree_of(root);
        let mut affected: Vec<SiblingGroup> = Vec::new();
        for id in &ids {
            if let Some(task) = self.tasks.get(id) {
                let group = task.sibling_group();
                if !affected.contains(&group) {
                    affected.push(group);
                }
            }
        }
        for id in &ids {
            self.tasks.remove(id);
        }
        for group in affected {
            if let SiblingGroup::Children { parent } = group
                && !self.tasks.contains_key(&parent)
            {
                continue;
            }
            let order = self.task_group_order(group);
            self.apply_task_order(&order, now);
        }
    }

    /// Collects a task and all of its descendants through the arena.
    ///
    /// Each task is collected at most once, so a malformed cyclic parent
    /// chain in persisted data cannot loop the traversal.
    fn subtree_of(&self, root: TaskId) -> Vec<TaskId> {
        let mut collected = vec![root];
        let mut frontier = vec![root];
        while let Some(current) = frontier.pop() {
            for task in self.tasks.values() {
                if task.parent() == Some(current) && !collected.contains(&task.id()) {
                    collected.push(task.id());
                    frontier.push(task.id());
                }
            }
        }
        collected
    }
}
