//! `PostgreSQL` repository implementation for board workflow storage.
//!
//! Every mutation runs in one Diesel transaction with the board row locked
//! via `SELECT ... FOR UPDATE`, so concurrent position rewrites of the
//! same board serialize. Step and task rows are rewritten inside the
//! transaction, and the board's `lock_version` counter increments on
//! commit.

use super::{
    models::{BoardChangeset, BoardRow, NewBoardRow, NewStepRow, NewTaskRow, StepRow, TaskRow},
    schema::{boards, steps, tasks},
};
use crate::board::{
    domain::{
        Board, BoardId, BoardName, Capacity, MemberId, PersistedBoardData, PersistedStepData,
        PersistedTaskData, Position, Step, StepId, StepKind, StepName, Task, TaskId, TaskName,
    },
    ports::{BoardMutation, BoardRepository, BoardRepositoryError, BoardRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::BTreeSet;

/// `PostgreSQL` connection pool type used by board adapters.
pub type BoardPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed board repository.
#[derive(Debug, Clone)]
pub struct PostgresBoardRepository {
    pool: BoardPgPool,
}

/// Transaction-internal error carrying either a repository failure or a
/// raw Diesel error.
enum TxError {
    Repo(BoardRepositoryError),
    Diesel(DieselError),
}

impl From<DieselError> for TxError {
    fn from(err: DieselError) -> Self {
        Self::Diesel(err)
    }
}

fn collapse(err: TxError) -> BoardRepositoryError {
    match err {
        TxError::Repo(repo) => repo,
        TxError::Diesel(diesel) => BoardRepositoryError::persistence(diesel),
    }
}

impl PostgresBoardRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: BoardPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> BoardRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> BoardRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(BoardRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(BoardRepositoryError::persistence)?
    }
}

#[async_trait]
impl BoardRepository for PostgresBoardRepository {
    async fn store(&self, board: &Board) -> BoardRepositoryResult<()> {
        let board_id = board.id();
        let snapshot = board.clone();

        self.run_blocking(move |connection| {
            let board_row = to_new_board_row(&snapshot, 0)?;
            let step_rows = step_rows_of(&snapshot);
            let task_rows = task_rows_of(&snapshot);

            connection
                .transaction::<(), TxError, _>(|tx| {
                    diesel::insert_into(boards::table)
                        .values(&board_row)
                        .execute(tx)?;
                    insert_children(tx, &step_rows, &task_rows)?;
                    Ok(())
                })
                .map_err(|err| match err {
                    TxError::Diesel(DieselError::DatabaseError(
                        DatabaseErrorKind::UniqueViolation,
                        _,
                    )) => BoardRepositoryError::DuplicateBoard(board_id),
                    other => collapse(other),
                })
        })
        .await
    }

    async fn find_by_id(&self, id: BoardId) -> BoardRepositoryResult<Option<Board>> {
        self.run_blocking(move |connection| {
            let row = boards::table
                .find(id.into_inner())
                .select(BoardRow::as_select())
                .first::<BoardRow>(connection)
                .optional()
                .map_err(BoardRepositoryError::persistence)?;
            row.map(|board_row| {
                let (step_rows, task_rows) = load_children(connection, id)?;
                assemble_board(board_row, step_rows, task_rows)
            })
            .transpose()
        })
        .await
    }

    async fn with_board(
        &self,
        id: BoardId,
        mutation: BoardMutation,
    ) -> BoardRepositoryResult<Board> {
        self.run_blocking(move |connection| {
            connection
                .transaction::<Board, TxError, _>(|tx| {
                    let row = boards::table
                        .find(id.into_inner())
                        .for_update()
                        .select(BoardRow::as_select())
                        .first::<BoardRow>(tx)
                        .optional()?
                        .ok_or(TxError::Repo(BoardRepositoryError::BoardNotFound(id)))?;
                    let lock_version = row.lock_version;
                    let (step_rows, task_rows) = load_children(tx, id).map_err(TxError::Repo)?;
                    let mut board =
                        assemble_board(row, step_rows, task_rows).map_err(TxError::Repo)?;

                    mutation(&mut board)
                        .map_err(|err| TxError::Repo(BoardRepositoryError::Rejected(err)))?;

                    persist_committed(tx, &board, lock_version)?;
                    Ok(board)
                })
                .map_err(collapse)
        })
        .await
    }
}

fn load_children(
    connection: &mut PgConnection,
    id: BoardId,
) -> BoardRepositoryResult<(Vec<StepRow>, Vec<TaskRow>)> {
    let step_rows = steps::table
        .filter(steps::board_id.eq(id.into_inner()))
        .select(StepRow::as_select())
        .load::<StepRow>(connection)
        .map_err(BoardRepositoryError::persistence)?;
    let task_rows = tasks::table
        .filter(tasks::board_id.eq(id.into_inner()))
        .select(TaskRow::as_select())
        .load::<TaskRow>(connection)
        .map_err(BoardRepositoryError::persistence)?;
    Ok((step_rows, task_rows))
}

/// Rewrites the board's step and task rows and bumps `lock_version`.
fn persist_committed(
    tx: &mut PgConnection,
    board: &Board,
    previous_version: i64,
) -> Result<(), TxError> {
    let changeset = BoardChangeset {
        name: board.name().as_str().to_owned(),
        members: members_payload(board).map_err(TxError::Repo)?,
        lock_version: previous_version.saturating_add(1),
        updated_at: board.updated_at(),
    };
    diesel::update(boards::table.find(board.id().into_inner()))
        .set(&changeset)
        .execute(tx)?;

    diesel::delete(tasks::table.filter(tasks::board_id.eq(board.id().into_inner())))
        .execute(tx)?;
    diesel::delete(steps::table.filter(steps::board_id.eq(board.id().into_inner())))
        .execute(tx)?;
    insert_children(tx, &step_rows_of(board), &task_rows_of(board))?;
    Ok(())
}

fn insert_children(
    tx: &mut PgConnection,
    step_rows: &[NewStepRow],
    task_rows: &[NewTaskRow],
) -> Result<(), TxError> {
    if !step_rows.is_empty() {
        diesel::insert_into(steps::table)
            .values(step_rows)
            .execute(tx)?;
    }
    if !task_rows.is_empty() {
        diesel::insert_into(tasks::table)
            .values(task_rows)
            .execute(tx)?;
    }
    Ok(())
}

fn members_payload(board: &Board) -> BoardRepositoryResult<serde_json::Value> {
    serde_json::to_value(board.members()).map_err(BoardRepositoryError::persistence)
}

fn to_new_board_row(board: &Board, lock_version: i64) -> BoardRepositoryResult<NewBoardRow> {
    Ok(NewBoardRow {
        id: board.id().into_inner(),
        name: board.name().as_str().to_owned(),
        creator: board.creator().into_inner(),
        members: members_payload(board)?,
        lock_version,
        created_at: board.created_at(),
        updated_at: board.updated_at(),
    })
}

fn step_rows_of(board: &Board) -> Vec<NewStepRow> {
    board
        .steps()
        .into_iter()
        .map(|step| NewStepRow {
            id: step.id().into_inner(),
            board_id: board.id().into_inner(),
            name: step.name().as_str().to_owned(),
            description: step.description().map(str::to_owned),
            kind: step.kind().as_str().to_owned(),
            capacity: step.capacity().map(Capacity::get),
            position: step.position().get(),
            is_terminal: step.is_terminal(),
            created_at: step.created_at(),
            updated_at: step.updated_at(),
        })
        .collect()
}

fn task_rows_of(board: &Board) -> Vec<NewTaskRow> {
    board
        .tasks()
        .map(|task| NewTaskRow {
            id: task.id().into_inner(),
            board_id: board.id().into_inner(),
            step_id: task.step().map(StepId::into_inner),
            parent_id: task.parent().map(TaskId::into_inner),
            name: task.name().as_str().to_owned(),
            description: task.description().map(str::to_owned),
            position: task.position().get(),
            assigned_to: task.assigned_to().map(MemberId::into_inner),
            start_date: task.start_date(),
            finish_date: task.finish_date(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        })
        .collect()
}

fn row_to_step(row: StepRow) -> BoardRepositoryResult<Step> {
    let data = PersistedStepData {
        id: StepId::from_uuid(row.id),
        name: StepName::new(row.name).map_err(BoardRepositoryError::persistence)?,
        description: row.description,
        kind: StepKind::try_from(row.kind.as_str()).map_err(BoardRepositoryError::persistence)?,
        capacity: row
            .capacity
            .map(Capacity::new)
            .transpose()
            .map_err(BoardRepositoryError::persistence)?,
        position: Position::new(row.position).map_err(BoardRepositoryError::persistence)?,
        is_terminal: row.is_terminal,
        created_at: row.created_at,
        updated_at: row.updated_at,
    };
    Ok(Step::from_persisted(data))
}

fn row_to_task(row: TaskRow) -> BoardRepositoryResult<Task> {
    let data = PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        name: TaskName::new(row.name).map_err(BoardRepositoryError::persistence)?,
        description: row.description,
        step: row.step_id.map(StepId::from_uuid),
        parent: row.parent_id.map(TaskId::from_uuid),
        position: Position::new(row.position).map_err(BoardRepositoryError::persistence)?,
        assigned_to: row.assigned_to.map(MemberId::from_uuid),
        start_date: row.start_date,
        finish_date: row.finish_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
    };
    Ok(Task::from_persisted(data))
}

fn assemble_board(
    row: BoardRow,
    step_rows: Vec<StepRow>,
    task_rows: Vec<TaskRow>,
) -> BoardRepositoryResult<Board> {
    let members: BTreeSet<MemberId> =
        serde_json::from_value(row.members).map_err(BoardRepositoryError::persistence)?;
    let data = PersistedBoardData {
        id: BoardId::from_uuid(row.id),
        name: BoardName::new(row.name).map_err(BoardRepositoryError::persistence)?,
        creator: MemberId::from_uuid(row.creator),
        members,
        steps: step_rows
            .into_iter()
            .map(row_to_step)
            .collect::<BoardRepositoryResult<Vec<_>>>()?,
        tasks: task_rows
            .into_iter()
            .map(row_to_task)
            .collect::<BoardRepositoryResult<Vec<_>>>()?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    };
    Ok(Board::from_persisted(data))
}
