//! Identity Index
//!
//! Graph items, groups, data records and rows arrive from the host under
//! stable composite identifiers ([`GId`]). Traversal and rendering work on
//! dense integer handles instead ([`LocalId`]).
//!
//! # Overview
//!
//! The [`IdentityIndex`] is an append-only intern table:
//!
//! - The first time a `GId` is seen it receives the next local id.
//! - The same `GId` always maps back to the same local id for the lifetime
//!   of the owning table.
//! - Local id `0` is reserved and means "none".
//!
//! Identifiers frequently arrive again across incremental refresh calls and
//! sometimes from another table, so the index never reassigns or forgets.

mod gid;
mod index;

pub use gid::{ClassId, EntryId, GId, RecordId};
pub use index::{IdentityIndex, LocalId};
