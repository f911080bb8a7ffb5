//! Identifier newtypes for the board workflow domain.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Defines a UUID-backed identifier newtype with the standard conversions.
macro_rules! uuid_identifier {
    ($(#[doc = $doc:literal] $name:ident),+ $(,)?) => {
        $(
            #[doc = $doc]
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(Uuid);

            impl $name {
                /// Creates a new random identifier.
                #[must_use]
                pub fn new() -> Self {
                    Self(Uuid::new_v4())
                }

                /// Creates an identifier from an existing UUID.
                #[must_use]
                pub const fn from_uuid(uuid: Uuid) -> Self {
                    Self(uuid)
                }

                /// Returns the wrapped UUID.
                #[must_use]
                pub const fn into_inner(self) -> Uuid {
                    self.0
                }
            }

            impl Default for $name {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl AsRef<Uuid> for $name {
                fn as_ref(&self) -> &Uuid {
                    &self.0
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

uuid_identifier! {
    #[doc = "Unique identifier for a board."]
    BoardId,
    #[doc = "Unique identifier for a step (column) on a board."]
    StepId,
    #[doc = "Unique identifier for a task (card) on a board."]
    TaskId,
    #[doc = "Unique identifier for a board member."]
    MemberId,
}
