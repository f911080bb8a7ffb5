//! Dense 1-based ordering over a sibling group.
//!
//! `GroupOrder` is the position ledger shared by step ordering on a board,
//! task ordering inside a step, and child ordering under a parent task. It
//! holds the group as a sequence of identifiers; positions are derived from
//! sequence indexes, so density and uniqueness hold by construction after
//! any combination of append, remove, and insert.

use super::{BoardDomainError, Position};

/// Ordered sibling group over entity identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupOrder<I> {
    ids: Vec<I>,
}

impl<I: Copy + Eq> GroupOrder<I> {
    /// Creates an empty group.
    #[must_use]
    pub const fn new() -> Self {
        Self { ids: Vec::new() }
    }

    /// Builds a group from persisted `(id, position)` pairs.
    ///
    /// Entries are ordered by their stored position; gaps and duplicates in
    /// the input collapse into a dense sequence, which makes this the repair
    /// path for irregular persisted orderings as well.
    #[must_use]
    pub fn from_positions(entries: impl IntoIterator<Item = (I, Position)>) -> Self {
        let mut pairs: Vec<(I, Position)> = entries.into_iter().collect();
        pairs.sort_by_key(|(_, position)| *position);
        Self {
            ids: pairs.into_iter().map(|(id, _)| id).collect(),
        }
    }

    /// Returns the number of entries in the group.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` when the group has no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns `true` when the identifier is a member of the group.
    #[must_use]
    pub fn contains(&self, id: I) -> bool {
        self.ids.contains(&id)
    }

    /// Returns the current position of the identifier, if present.
    #[must_use]
    pub fn position_of(&self, id: I) -> Option<Position> {
        self.entries()
            .find(|(entry, _)| *entry == id)
            .map(|(_, position)| position)
    }

    /// Appends an entry at position `N + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::OrderFull`] when the group has reached
    /// the persisted position ceiling.
    pub fn append(&mut self, id: I) -> Result<Position, BoardDomainError> {
        let next = self
            .ids
            .len()
            .checked_add(1)
            .and_then(|len| i32::try_from(len).ok())
            .ok_or(BoardDomainError::OrderFull)?;
        self.ids.push(id);
        Ok(Position::from_sequence(next))
    }

    /// Removes an entry, closing the gap it leaves behind.
    ///
    /// Returns `true` when the entry was present.
    pub fn remove(&mut self, id: I) -> bool {
        let before = self.ids.len();
        self.ids.retain(|entry| *entry != id);
        self.ids.len() != before
    }

    /// Inserts an entry at the target slot, shifting later entries up.
    ///
    /// The target must satisfy `1 <= target <= N + 1` for the group's
    /// current size `N`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::PositionOutOfRange`] when the target has
    /// no corresponding slot, or [`BoardDomainError::OrderFull`] at the
    /// position ceiling.
    pub fn insert_at(&mut self, id: I, target: Position) -> Result<(), BoardDomainError> {
        if i32::try_from(self.ids.len().checked_add(1).unwrap_or(usize::MAX)).is_err() {
            return Err(BoardDomainError::OrderFull);
        }
        let index = usize::try_from(target.get())
            .ok()
            .and_then(|slot| slot.checked_sub(1))
            .ok_or(BoardDomainError::PositionOutOfRange(target.get()))?;
        if index > self.ids.len() {
            return Err(BoardDomainError::PositionOutOfRange(target.get()));
        }
        self.ids.insert(index, id);
        Ok(())
    }

    /// Iterates the group as `(id, position)` pairs with dense positions
    /// `1..=N`.
    pub fn entries(&self) -> impl Iterator<Item = (I, Position)> + '_ {
        self.ids
            .iter()
            .copied()
            .zip(1i32..)
            .map(|(id, sequence)| (id, Position::from_sequence(sequence)))
    }
}
