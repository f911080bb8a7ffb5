//! Diesel row models for board persistence.

use super::schema::{boards, steps, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for board records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = boards)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BoardRow {
    /// Board identifier.
    pub id: uuid::Uuid,
    /// Board name.
    pub name: String,
    /// Creating member.
    pub creator: uuid::Uuid,
    /// Member set JSON payload.
    pub members: Value,
    /// Commit counter.
    pub lock_version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for board records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = boards)]
pub struct NewBoardRow {
    /// Board identifier.
    pub id: uuid::Uuid,
    /// Board name.
    pub name: String,
    /// Creating member.
    pub creator: uuid::Uuid,
    /// Member set JSON payload.
    pub members: Value,
    /// Commit counter.
    pub lock_version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Changeset for rewriting a board row inside a locked mutation.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = boards)]
pub struct BoardChangeset {
    /// Board name.
    pub name: String,
    /// Member set JSON payload.
    pub members: Value,
    /// Commit counter.
    pub lock_version: i64,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for step records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = steps)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StepRow {
    /// Step identifier.
    pub id: uuid::Uuid,
    /// Owning board.
    pub board_id: uuid::Uuid,
    /// Step name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Advisory role classification.
    pub kind: String,
    /// Optional task capacity.
    pub capacity: Option<i32>,
    /// 1-based dense position within the board order.
    pub position: i32,
    /// Terminal marker.
    pub is_terminal: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for step records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = steps)]
pub struct NewStepRow {
    /// Step identifier.
    pub id: uuid::Uuid,
    /// Owning board.
    pub board_id: uuid::Uuid,
    /// Step name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Advisory role classification.
    pub kind: String,
    /// Optional task capacity.
    pub capacity: Option<i32>,
    /// 1-based dense position within the board order.
    pub position: i32,
    /// Terminal marker.
    pub is_terminal: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning board.
    pub board_id: uuid::Uuid,
    /// Owning step, if placed.
    pub step_id: Option<uuid::Uuid>,
    /// Parent task, if any.
    pub parent_id: Option<uuid::Uuid>,
    /// Task name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// 1-based dense position within the sibling group.
    pub position: i32,
    /// Assigned member, if any.
    pub assigned_to: Option<uuid::Uuid>,
    /// First-placement timestamp, if set.
    pub start_date: Option<DateTime<Utc>>,
    /// Finish timestamp, if set.
    pub finish_date: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning board.
    pub board_id: uuid::Uuid,
    /// Owning step, if placed.
    pub step_id: Option<uuid::Uuid>,
    /// Parent task, if any.
    pub parent_id: Option<uuid::Uuid>,
    /// Task name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// 1-based dense position within the sibling group.
    pub position: i32,
    /// Assigned member, if any.
    pub assigned_to: Option<uuid::Uuid>,
    /// First-placement timestamp, if set.
    pub start_date: Option<DateTime<Utc>>,
    /// Finish timestamp, if set.
    pub finish_date: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
