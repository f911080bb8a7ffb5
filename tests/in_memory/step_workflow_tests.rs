//! Step workflow tests: ordering, the terminal marker, and step lifecycle.

use crate::in_memory::helpers::{runtime, seed_board, seed_steps, workflow, Workflow};
use boardwalk::board::{
    domain::BoardDomainError,
    services::{CreateStepRequest, UpdateStepRequest, WorkflowError},
};
use boardwalk::board::domain::StepKind;
use rstest::rstest;
use std::io;
use tokio::runtime::Runtime;

/// Steps are appended with dense positions in creation order.
#[rstest]
fn created_steps_are_listed_in_order(runtime: io::Result<Runtime>, workflow: Workflow) {
    let rt = runtime.expect("runtime creation");
    let (board_id, _) = seed_board(&rt, &workflow);
    let steps = seed_steps(&rt, &workflow, board_id, &["Backlog", "Doing", "Done"]);

    let listed = rt
        .block_on(workflow.steps.list_steps(board_id))
        .expect("listing should succeed");

    let ordered: Vec<_> = listed
        .iter()
        .map(|step| (step.id(), step.position().get()))
        .collect();
    assert_eq!(
        ordered,
        vec![(steps[0], 1), (steps[1], 2), (steps[2], 3)]
    );
}

/// Scenario D: marking a non-last step terminal relocates it to the last
/// position, and the previous last step shifts down.
#[rstest]
fn marking_a_middle_step_terminal_relocates_it_last(
    runtime: io::Result<Runtime>,
    workflow: Workflow,
) {
    let rt = runtime.expect("runtime creation");
    let (board_id, _) = seed_board(&rt, &workflow);
    let steps = seed_steps(&rt, &workflow, board_id, &["S1", "S2", "S3"]);

    let marked = rt
        .block_on(workflow.steps.mark_step_finished(board_id, steps[1]))
        .expect("marking should succeed");

    assert!(marked.is_terminal());
    assert_eq!(marked.position().get(), 3);
    let listed = rt
        .block_on(workflow.steps.list_steps(board_id))
        .expect("listing should succeed");
    let ordered: Vec<_> = listed
        .iter()
        .map(|step| (step.id(), step.position().get()))
        .collect();
    assert_eq!(
        ordered,
        vec![(steps[0], 1), (steps[2], 2), (steps[1], 3)]
    );
}

/// At most one step carries the terminal marker.
#[rstest]
fn re_marking_moves_the_terminal_marker(runtime: io::Result<Runtime>, workflow: Workflow) {
    let rt = runtime.expect("runtime creation");
    let (board_id, _) = seed_board(&rt, &workflow);
    let steps = seed_steps(&rt, &workflow, board_id, &["S1", "S2", "S3"]);
    rt.block_on(workflow.steps.mark_step_finished(board_id, steps[2]))
        .expect("first marking should succeed");

    rt.block_on(workflow.steps.mark_step_finished(board_id, steps[0]))
        .expect("second marking should succeed");

    let listed = rt
        .block_on(workflow.steps.list_steps(board_id))
        .expect("listing should succeed");
    let terminal: Vec<_> = listed
        .iter()
        .filter(|step| step.is_terminal())
        .map(|step| step.id())
        .collect();
    assert_eq!(terminal, vec![steps[0]]);
    assert_eq!(listed.last().map(|step| step.id()), Some(steps[0]));
}

/// A step created while a terminal step exists slots in before it.
#[rstest]
fn new_steps_slot_in_before_the_terminal_step(
    runtime: io::Result<Runtime>,
    workflow: Workflow,
) {
    let rt = runtime.expect("runtime creation");
    let (board_id, _) = seed_board(&rt, &workflow);
    let steps = seed_steps(&rt, &workflow, board_id, &["Backlog", "Done"]);
    rt.block_on(workflow.steps.mark_step_finished(board_id, steps[1]))
        .expect("marking should succeed");

    let review = rt
        .block_on(workflow.steps.create_step(
            board_id,
            CreateStepRequest::new("Review", StepKind::Task),
        ))
        .expect("step creation should succeed");

    assert_eq!(review.position().get(), 2);
    let listed = rt
        .block_on(workflow.steps.list_steps(board_id))
        .expect("listing should succeed");
    let ordered: Vec<_> = listed.iter().map(|step| step.id()).collect();
    assert_eq!(ordered, vec![steps[0], review.id(), steps[1]]);
}

/// Manual moves cannot take the slot reserved for the terminal step.
#[rstest]
fn manual_moves_cannot_displace_the_terminal_step(
    runtime: io::Result<Runtime>,
    workflow: Workflow,
) {
    let rt = runtime.expect("runtime creation");
    let (board_id, _) = seed_board(&rt, &workflow);
    let steps = seed_steps(&rt, &workflow, board_id, &["S1", "S2", "S3"]);
    rt.block_on(workflow.steps.mark_step_finished(board_id, steps[2]))
        .expect("marking should succeed");

    let pinned = rt.block_on(workflow.steps.move_step(board_id, steps[2], 1));
    assert!(matches!(
        pinned,
        Err(WorkflowError::Domain(BoardDomainError::TerminalStepPinned(_)))
    ));

    let reserved = rt.block_on(workflow.steps.move_step(board_id, steps[0], 3));
    assert!(matches!(
        reserved,
        Err(WorkflowError::Domain(BoardDomainError::PositionOutOfRange(3)))
    ));
}

/// Removing a step closes the gap in the board order.
#[rstest]
fn removing_a_step_recounts_the_remainder(runtime: io::Result<Runtime>, workflow: Workflow) {
    let rt = runtime.expect("runtime creation");
    let (board_id, _) = seed_board(&rt, &workflow);
    let steps = seed_steps(&rt, &workflow, board_id, &["S1", "S2", "S3"]);

    rt.block_on(workflow.steps.remove_step(board_id, steps[0]))
        .expect("removal should succeed");

    let listed = rt
        .block_on(workflow.steps.list_steps(board_id))
        .expect("listing should succeed");
    let ordered: Vec<_> = listed
        .iter()
        .map(|step| (step.id(), step.position().get()))
        .collect();
    assert_eq!(ordered, vec![(steps[1], 1), (steps[2], 2)]);
}

/// Lowering capacity below the current load keeps existing tasks in place.
#[rstest]
fn capacity_can_drop_below_current_load(runtime: io::Result<Runtime>, workflow: Workflow) {
    let rt = runtime.expect("runtime creation");
    let (board_id, _) = seed_board(&rt, &workflow);
    let steps = seed_steps(&rt, &workflow, board_id, &["Doing"]);
    for name in ["One", "Two"] {
        rt.block_on(workflow.tasks.create_task(
            board_id,
            boardwalk::board::services::CreateTaskRequest::new(name),
        ))
        .expect("task creation should succeed");
    }

    let updated = rt
        .block_on(workflow.steps.update_step(
            board_id,
            steps[0],
            UpdateStepRequest::new().with_capacity(1),
        ))
        .expect("update should succeed");

    assert_eq!(updated.capacity().map(|capacity| capacity.get()), Some(1));
    let occupants = rt
        .block_on(workflow.tasks.list_tasks_in_step(board_id, steps[0]))
        .expect("listing should succeed");
    assert_eq!(occupants.len(), 2);
}
