//! Step (column) entity and its classification.

use super::{Capacity, ParseStepKindError, Position, StepId, StepName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Advisory classification of a step's role on the board.
///
/// The kind is fixed at creation and carries no workflow behaviour; the
/// terminal marker alone gates finish semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Entry column for new work.
    Start,
    /// Regular working column.
    Task,
    /// Column intended to hold completed work.
    Finish,
}

impl StepKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Task => "task",
            Self::Finish => "finish",
        }
    }
}

impl TryFrom<&str> for StepKind {
    type Error = ParseStepKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "start" => Ok(Self::Start),
            "task" => Ok(Self::Task),
            "finish" => Ok(Self::Finish),
            _ => Err(ParseStepKindError(value.to_owned())),
        }
    }
}

/// Parameter object for adding a step to a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStepParams {
    /// Identifier assigned by the caller.
    pub id: StepId,
    /// Validated step name.
    pub name: StepName,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Advisory role classification.
    pub kind: StepKind,
    /// Optional task capacity.
    pub capacity: Option<Capacity>,
}

/// Parameter object for reconstructing a persisted step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedStepData {
    /// Persisted step identifier.
    pub id: StepId,
    /// Persisted step name.
    pub name: StepName,
    /// Persisted description, if any.
    pub description: Option<String>,
    /// Persisted role classification.
    pub kind: StepKind,
    /// Persisted capacity, if any.
    pub capacity: Option<Capacity>,
    /// Persisted position within the board order.
    pub position: Position,
    /// Persisted terminal marker.
    pub is_terminal: bool,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Step (column) on a board: an ordered container of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    id: StepId,
    name: StepName,
    description: Option<String>,
    kind: StepKind,
    capacity: Option<Capacity>,
    position: Position,
    is_terminal: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Step {
    /// Creates a new step at the given position.
    pub(super) fn new(params: NewStepParams, position: Position, now: DateTime<Utc>) -> Self {
        Self {
            id: params.id,
            name: params.name,
            description: params.description,
            kind: params.kind,
            capacity: params.capacity,
            position,
            is_terminal: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstructs a step from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedStepData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            description: data.description,
            kind: data.kind,
            capacity: data.capacity,
            position: data.position,
            is_terminal: data.is_terminal,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the step identifier.
    #[must_use]
    pub const fn id(&self) -> StepId {
        self.id
    }

    /// Returns the step name.
    #[must_use]
    pub const fn name(&self) -> &StepName {
        &self.name
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the advisory role classification.
    #[must_use]
    pub const fn kind(&self) -> StepKind {
        self.kind
    }

    /// Returns the configured capacity, if any.
    #[must_use]
    pub const fn capacity(&self) -> Option<Capacity> {
        self.capacity
    }

    /// Returns the 1-based position within the board order.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Returns `true` when this step is the board's terminal step.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.is_terminal
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

    pub(super) fn rename(&mut self, name: StepName) {
        self.name = name;
    }

    pub(super) const fn description_mut(&mut self) -> &mut Option<String> {
        &mut self.description
    }

    pub(super) const fn capacity_mut(&mut self) -> &mut Option<Capacity> {
        &mut self.capacity
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

    pub(super) const fn set_terminal(&mut self, is_terminal: bool) {
        self.is_terminal = is_terminal;
    }

    pub(super) const fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
