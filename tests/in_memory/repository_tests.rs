//! Contract tests for [`InMemoryBoardRepository`]: store, lookup, and the
//! locked-mutation helper.

use crate::in_memory::helpers::{runtime, workflow, Workflow};
use boardwalk::board::{
    adapters::memory::InMemoryBoardRepository,
    domain::{Board, BoardDomainError, BoardId, BoardName, MemberId, StepId},
    ports::{BoardRepository, BoardRepositoryError},
};
use mockable::DefaultClock;
use rstest::rstest;
use std::io;
use tokio::runtime::Runtime;

fn sample_board() -> Board {
    Board::new(
        BoardName::new("Contract board").expect("valid board name"),
        MemberId::new(),
        &DefaultClock,
    )
}

/// Stored boards round-trip through lookup.
#[rstest]
fn store_then_find_returns_the_board(runtime: io::Result<Runtime>, workflow: Workflow) {
    let rt = runtime.expect("runtime creation");
    let board = sample_board();

    rt.block_on(workflow.repository.store(&board))
        .expect("store should succeed");

    let fetched = rt
        .block_on(workflow.repository.find_by_id(board.id()))
        .expect("lookup should succeed");
    assert_eq!(fetched, Some(board));
}

/// Duplicate board identifiers are rejected.
#[rstest]
fn duplicate_board_id_rejected(runtime: io::Result<Runtime>, workflow: Workflow) {
    let rt = runtime.expect("runtime creation");
    let board = sample_board();
    rt.block_on(workflow.repository.store(&board))
        .expect("first store should succeed");

    let result = rt.block_on(workflow.repository.store(&board));

    assert!(
        matches!(result, Err(BoardRepositoryError::DuplicateBoard(id)) if id == board.id()),
        "should reject a duplicate board identifier"
    );
}

/// Unknown identifiers resolve to `None` rather than an error.
#[rstest]
fn find_missing_board_returns_none(runtime: io::Result<Runtime>, workflow: Workflow) {
    let rt = runtime.expect("runtime creation");

    let fetched = rt
        .block_on(workflow.repository.find_by_id(BoardId::new()))
        .expect("lookup should succeed");

    assert_eq!(fetched, None);
}

/// A successful mutation commits and bumps the version counter.
#[rstest]
fn with_board_commits_and_bumps_the_version(runtime: io::Result<Runtime>, workflow: Workflow) {
    let rt = runtime.expect("runtime creation");
    let board = sample_board();
    let member = MemberId::new();
    rt.block_on(workflow.repository.store(&board))
        .expect("store should succeed");

    let committed = rt
        .block_on(workflow.repository.with_board(
            board.id(),
            Box::new(move |aggregate| {
                aggregate.add_member(member, &DefaultClock);
                Ok(())
            }),
        ))
        .expect("mutation should succeed");

    assert!(committed.is_member(member));
    assert_eq!(
        workflow
            .repository
            .version(board.id())
            .expect("version lookup should succeed"),
        Some(1)
    );
    let fetched = rt
        .block_on(workflow.repository.find_by_id(board.id()))
        .expect("lookup should succeed")
        .expect("board should exist");
    assert!(fetched.is_member(member));
}

/// A rejected mutation commits nothing and keeps the version counter.
#[rstest]
fn with_board_rolls_back_rejected_mutations(runtime: io::Result<Runtime>, workflow: Workflow) {
    let rt = runtime.expect("runtime creation");
    let board = sample_board();
    let member = MemberId::new();
    let missing_step = StepId::new();
    rt.block_on(workflow.repository.store(&board))
        .expect("store should succeed");

    let result = rt.block_on(workflow.repository.with_board(
        board.id(),
        Box::new(move |aggregate| {
            aggregate.add_member(member, &DefaultClock);
            Err(BoardDomainError::StepNotFound(missing_step))
        }),
    ));

    assert!(matches!(
        result,
        Err(BoardRepositoryError::Rejected(BoardDomainError::StepNotFound(id))) if id == missing_step
    ));
    let fetched = rt
        .block_on(workflow.repository.find_by_id(board.id()))
        .expect("lookup should succeed")
        .expect("board should exist");
    assert!(!fetched.is_member(member));
    assert_eq!(
        workflow
            .repository
            .version(board.id())
            .expect("version lookup should succeed"),
        Some(0)
    );
}

/// Mutating a missing board fails with a board-level not-found error.
#[rstest]
fn with_board_requires_the_board(runtime: io::Result<Runtime>, workflow: Workflow) {
    let rt = runtime.expect("runtime creation");
    let stranger = BoardId::new();

    let result = rt.block_on(
        workflow
            .repository
            .with_board(stranger, Box::new(|_| Ok(()))),
    );

    assert!(matches!(
        result,
        Err(BoardRepositoryError::BoardNotFound(id)) if id == stranger
    ));
}

/// Clones share state: a mutation through one handle is visible through
/// another.
#[rstest]
fn cloned_repositories_share_state(runtime: io::Result<Runtime>) {
    let rt = runtime.expect("runtime creation");
    let repository = InMemoryBoardRepository::new();
    let clone = repository.clone();
    let board = sample_board();

    rt.block_on(repository.store(&board))
        .expect("store should succeed");

    let fetched = rt
        .block_on(clone.find_by_id(board.id()))
        .expect("lookup should succeed");
    assert_eq!(fetched.map(|found| found.id()), Some(board.id()));
}
