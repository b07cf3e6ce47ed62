//! Bidirectional `GId` ↔ `LocalId` map.

use indexmap::IndexSet;

use super::gid::GId;

/// Dense integer handle for a [`GId`], unique within one table.
///
/// `LocalId::NONE` (raw value `0`) is never assigned to an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LocalId(u32);

impl LocalId {
    /// The reserved "no id" handle.
    pub const NONE: LocalId = LocalId(0);

    /// Get the raw id value.
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// True for the reserved "no id" value.
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for LocalId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Append-only intern table between external and local identifiers.
///
/// Backed by an `IndexSet`: the insertion position of a `GId` is its local id
/// minus one, so both directions are O(1) and ids can never be reassigned.
#[derive(Debug, Default, Clone)]
pub struct IdentityIndex {
    ids: IndexSet<GId>,
}

impl IdentityIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the local id for `gid`, assigning the next one if unseen.
    pub fn get_id(&mut self, gid: GId) -> LocalId {
        let (position, _) = self.ids.insert_full(gid);
        LocalId(position as u32 + 1)
    }

    /// Return the local id for `gid` without assigning one.
    pub fn find_id(&self, gid: &GId) -> Option<LocalId> {
        self.ids
            .get_index_of(gid)
            .map(|position| LocalId(position as u32 + 1))
    }

    /// Reverse lookup. `None` for `LocalId::NONE` and for unassigned ids.
    pub fn get_gid(&self, id: LocalId) -> Option<GId> {
        if id.is_none() {
            return None;
        }
        self.ids.get_index(id.0 as usize - 1).copied()
    }

    /// Number of identifiers seen so far.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when nothing has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
