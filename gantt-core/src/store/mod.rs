//! Graph Item Store
//!
//! Rows, their graphs and the graph items inside them, plus the incremental
//! refresh protocol the host uses to keep them current.
//!
//! # Refresh protocol
//!
//! Every change arrives as "target id + optional snapshot":
//!
//! - snapshot present, id unseen: build a new item stamped with the active
//!   skin index and insert it into the graph and both indices
//! - snapshot present, id known: merge the snapshot into the stored item
//!   (unless updates are disabled for the request)
//! - snapshot absent: remove the item
//!
//! The batch variant folds the per-item results into a single changed flag
//! so the host schedules at most one repaint.

mod item;
mod item_store;
mod row;

pub use item::{Color, GraphItem, ItemBehavior, ItemSnapshot, LineStyle, SkinEntry};
pub use item_store::{GraphItemStore, ItemRefresh, RefreshOptions};
pub use row::{Graph, Row, RowData, RowSnapshot};
