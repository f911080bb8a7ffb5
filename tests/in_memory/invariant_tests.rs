//! Invariant tests: dense ordering and the single-terminal guarantee
//! across mixed mutation sequences.

use crate::in_memory::helpers::{runtime, seed_board, seed_steps, workflow, Workflow};
use boardwalk::board::{
    domain::{BoardId, StepId},
    ports::BoardRepository,
    services::{CreateTaskRequest, MoveTaskRequest},
};
use rstest::rstest;
use std::io;
use tokio::runtime::Runtime;

fn assert_dense(rt: &Runtime, workflow: &Workflow, board_id: BoardId, steps: &[StepId]) {
    for step in steps {
        let positions: Vec<i32> = rt
            .block_on(workflow.tasks.list_tasks_in_step(board_id, *step))
            .expect("listing should succeed")
            .iter()
            .map(|task| task.position().get())
            .collect();
        let expected: Vec<i32> = (1..=i32::try_from(positions.len()).expect("small group"))
            .collect();
        assert_eq!(positions, expected, "positions must be dense 1..N");
    }
    let step_positions: Vec<i32> = rt
        .block_on(workflow.steps.list_steps(board_id))
        .expect("listing should succeed")
        .iter()
        .map(|step| step.position().get())
        .collect();
    let expected: Vec<i32> = (1..=i32::try_from(step_positions.len()).expect("small board"))
        .collect();
    assert_eq!(step_positions, expected, "step positions must be dense 1..N");
}

/// Dense 1..N positions hold in every group after an arbitrary mix of
/// creates, moves, reorders, and deletes.
#[rstest]
fn dense_ordering_survives_a_mixed_mutation_sequence(
    runtime: io::Result<Runtime>,
    workflow: Workflow,
) {
    let rt = runtime.expect("runtime creation");
    let (board_id, _) = seed_board(&rt, &workflow);
    let steps = seed_steps(&rt, &workflow, board_id, &["S1", "S2", "S3"]);

    let mut ids = Vec::new();
    for name in ["T1", "T2", "T3", "T4", "T5"] {
        let task = rt
            .block_on(workflow.tasks.create_task(board_id, CreateTaskRequest::new(name)))
            .expect("task creation should succeed");
        ids.push(task.id());
    }
    assert_dense(&rt, &workflow, board_id, &steps);

    rt.block_on(workflow.tasks.move_task(board_id, ids[1], MoveTaskRequest::new(steps[1], 1)))
        .expect("move should succeed");
    rt.block_on(workflow.tasks.move_task(board_id, ids[3], MoveTaskRequest::new(steps[1], 1)))
        .expect("move should succeed");
    rt.block_on(workflow.tasks.move_task(board_id, ids[0], MoveTaskRequest::new(steps[0], 3)))
        .expect("reorder should succeed");
    assert_dense(&rt, &workflow, board_id, &steps);

    rt.block_on(workflow.tasks.delete_task(board_id, ids[3]))
        .expect("delete should succeed");
    rt.block_on(workflow.tasks.move_task(board_id, ids[2], MoveTaskRequest::new(steps[2], 1)))
        .expect("move should succeed");
    rt.block_on(workflow.tasks.move_task(board_id, ids[4], MoveTaskRequest::new(steps[2], 1)))
        .expect("move should succeed");
    assert_dense(&rt, &workflow, board_id, &steps);

    rt.block_on(workflow.steps.move_step(board_id, steps[2], 1))
        .expect("step move should succeed");
    assert_dense(&rt, &workflow, board_id, &steps);
}

/// Marking steps terminal repeatedly never leaves two markers behind and
/// keeps the marked step last.
#[rstest]
fn single_terminal_marker_after_repeated_marking(
    runtime: io::Result<Runtime>,
    workflow: Workflow,
) {
    let rt = runtime.expect("runtime creation");
    let (board_id, _) = seed_board(&rt, &workflow);
    let steps = seed_steps(&rt, &workflow, board_id, &["S1", "S2", "S3", "S4"]);

    for step in [steps[2], steps[0], steps[3], steps[0]] {
        rt.block_on(workflow.steps.mark_step_finished(board_id, step))
            .expect("marking should succeed");

        let listed = rt
            .block_on(workflow.steps.list_steps(board_id))
            .expect("listing should succeed");
        let terminal: Vec<_> = listed
            .iter()
            .filter(|candidate| candidate.is_terminal())
            .map(|candidate| candidate.id())
            .collect();
        assert_eq!(terminal, vec![step]);
        assert_eq!(listed.last().map(|candidate| candidate.id()), Some(step));
    }
    assert_dense(&rt, &workflow, board_id, &steps);
}

/// Removing a populated step leaves the detached pool densely numbered.
#[rstest]
fn detached_pool_is_densely_numbered(runtime: io::Result<Runtime>, workflow: Workflow) {
    let rt = runtime.expect("runtime creation");
    let (board_id, _) = seed_board(&rt, &workflow);
    let steps = seed_steps(&rt, &workflow, board_id, &["S1", "S2"]);
    for name in ["T1", "T2", "T3"] {
        rt.block_on(workflow.tasks.create_task(board_id, CreateTaskRequest::new(name)))
            .expect("task creation should succeed");
    }

    rt.block_on(workflow.steps.remove_step(board_id, steps[0]))
        .expect("removal should succeed");

    let board = rt
        .block_on(workflow.repository.find_by_id(board_id))
        .expect("lookup should succeed")
        .expect("board should exist");
    let detached: Vec<i32> = board
        .detached_tasks()
        .iter()
        .map(|task| task.position().get())
        .collect();
    assert_eq!(detached, vec![1, 2, 3]);
}
