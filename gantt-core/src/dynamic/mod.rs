//! Dynamic Child Rows
//!
//! Rows can grow children at display time: rows of this table, or of another
//! named table, that correlate with a root row by key and (optionally) by
//! time. The correlation is re-evaluated whenever the visible time window
//! moves or the data changes.
//!
//! # Modes
//!
//! A table's raw [`ChildModeConfig`](crate::config::ChildModeConfig) is
//! resolved once into a [`ChildMode`]:
//!
//! - `Static`: no dynamic evaluation at all.
//! - `Dynamic`: parent/child key kinds, window and intersection flags, the
//!   candidate source, and a per-class [`CopyBehavior`] table.
//!
//! # Clone identity
//!
//! Children are clones of their source rows, cached per parent. The cache
//! lives as long as the table, so a clone handed out once is handed out
//! again on every later pass that still matches it.

mod mode;
mod resolver;

pub use mode::{
    ChildMode, ChildSource, CopyBehavior, CopyBehaviorTable, DynamicMode, KeyKind, SourceScope,
};
pub use resolver::{DynamicChildResolver, RowRef, SourceRow};
