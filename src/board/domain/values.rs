//! Validated scalar types shared across the board workflow domain.

use super::BoardDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tunable validation limits for workflow input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowLimits {
    /// Maximum length of board, step, and task names in characters.
    pub max_name_length: usize,
}

impl WorkflowLimits {
    /// Default maximum name length in characters.
    pub const DEFAULT_MAX_NAME_LENGTH: usize = 200;
}

impl Default for WorkflowLimits {
    fn default() -> Self {
        Self {
            max_name_length: Self::DEFAULT_MAX_NAME_LENGTH,
        }
    }
}

/// Defines a trimmed, non-empty, bounded name newtype.
macro_rules! validated_name {
    ($(#[doc = $doc:literal] $name:ident => $empty_error:ident),+ $(,)?) => {
        $(
            #[doc = $doc]
            #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(String);

            impl $name {
                /// Creates a validated name using the default limits.
                ///
                /// # Errors
                ///
                /// Returns the empty-name error when the value is empty after
                /// trimming, or [`BoardDomainError::NameTooLong`] when it
                /// exceeds the length limit.
                pub fn new(value: impl Into<String>) -> Result<Self, BoardDomainError> {
                    Self::with_limits(value, &WorkflowLimits::default())
                }

                /// Creates a validated name against the given limits.
                ///
                /// # Errors
                ///
                /// Same conditions as [`Self::new`].
                pub fn with_limits(
                    value: impl Into<String>,
                    limits: &WorkflowLimits,
                ) -> Result<Self, BoardDomainError> {
                    let raw = value.into();
                    let trimmed = raw.trim();
                    if trimmed.is_empty() {
                        return Err(BoardDomainError::$empty_error);
                    }
                    if trimmed.chars().count() > limits.max_name_length {
                        return Err(BoardDomainError::NameTooLong {
                            max: limits.max_name_length,
                        });
                    }
                    Ok(Self(trimmed.to_owned()))
                }

                /// Returns the name as `str`.
                #[must_use]
                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl AsRef<str> for $name {
                fn as_ref(&self) -> &str {
                    self.as_str()
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )+
    };
}

validated_name! {
    #[doc = "Validated board name."]
    BoardName => EmptyBoardName,
    #[doc = "Validated step name."]
    StepName => EmptyStepName,
    #[doc = "Validated task name."]
    TaskName => EmptyTaskName,
}

/// 1-based position of an entity within its sibling group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(i32);

impl Position {
    /// The first slot of any sibling group.
    pub const FIRST: Self = Self(1);

    /// Creates a validated position.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::ZeroPosition`] when the value is less
    /// than one.
    pub const fn new(value: i32) -> Result<Self, BoardDomainError> {
        if value < 1 {
            return Err(BoardDomainError::ZeroPosition);
        }
        Ok(Self(value))
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Builds a position from a 1-based sequence counter.
    ///
    /// Callers guarantee the counter is positive; the ledger derives it
    /// from sequence indexes.
    pub(crate) const fn from_sequence(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Upper bound on the number of tasks a step may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capacity(i32);

impl Capacity {
    /// Creates a validated capacity.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::ZeroCapacity`] when the value is less
    /// than one.
    pub const fn new(value: i32) -> Result<Self, BoardDomainError> {
        if value < 1 {
            return Err(BoardDomainError::ZeroCapacity);
        }
        Ok(Self(value))
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tri-state update for an optional field.
///
/// Distinguishes "leave unchanged" from "clear" so update requests can
/// express both without sentinel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldUpdate<T> {
    /// Leave the current value unchanged.
    #[default]
    Keep,
    /// Clear the current value.
    Clear,
    /// Replace the current value.
    Set(T),
}

impl<T> FieldUpdate<T> {
    /// Applies the update to an optional slot.
    ///
    /// Returns `true` when the slot was written.
    pub fn apply_to(self, slot: &mut Option<T>) -> bool {
        match self {
            Self::Keep => false,
            Self::Clear => {
                *slot = None;
                true
            }
            Self::Set(value) => {
                *slot = Some(value);
                true
            }
        }
    }

    /// Maps the carried value, preserving `Keep` and `Clear`.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FieldUpdate<U> {
        match self {
            Self::Keep => FieldUpdate::Keep,
            Self::Clear => FieldUpdate::Clear,
            Self::Set(value) => FieldUpdate::Set(f(value)),
        }
    }

    /// Validates the carried value, preserving `Keep` and `Clear`.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `f` for a `Set` value.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<FieldUpdate<U>, E> {
        match self {
            Self::Keep => Ok(FieldUpdate::Keep),
            Self::Clear => Ok(FieldUpdate::Clear),
            Self::Set(value) => Ok(FieldUpdate::Set(f(value)?)),
        }
    }
}
