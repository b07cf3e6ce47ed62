//! Gantt Core
//!
//! Data engine behind a Gantt chart table. It implements:
//!
//! - Identity interning (global ids to compact local ids)
//! - The graph item store (rows, their items, the item and group indices)
//! - The link graph with cycle-safe traversal
//! - Dynamic child rows resolved against the visible time window
//!
//! The crate is usable as a native Rust library and, with the `python`
//! feature, as a Python extension module via PyO3.
//!
//! # Architecture
//!
//! - `identity`: `GId` and the per-table `IdentityIndex`
//! - `store`: item snapshots, rows and the `GraphItemStore`
//! - `links`: link declarations, the mirrored `LinkGraph` and traversal
//! - `dynamic`: child modes and the `DynamicChildResolver`
//! - `table`: the `Table` facade tying the above together
//! - `registry`: named tables for cross-table child sources
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use gantt_core::{
//!     Direction, GId, ItemSnapshot, LinkDeclaration, RefreshOptions, RowSnapshot, Table,
//!     TableConfig, TimeRange,
//! };
//!
//! let mut table = Table::new(&TableConfig::new("plan")).unwrap();
//! let row = GId::new(1, 1);
//! table.refresh_row(None, Some(&RowSnapshot::new(row))).unwrap();
//!
//! let day = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
//! let slot = TimeRange::new(
//!     day.and_hms_opt(8, 0, 0).unwrap(),
//!     day.and_hms_opt(12, 0, 0).unwrap(),
//! );
//! for record in [1, 2] {
//!     let item = ItemSnapshot::new(GId::new(10, record), row, slot);
//!     table.refresh_item(None, Some(&item), RefreshOptions::default()).unwrap();
//! }
//!
//! table.add_link(&LinkDeclaration::new(GId::new(10, 1), GId::new(10, 2)));
//! assert_eq!(table.links_for(&GId::new(10, 1), Direction::Next, false).len(), 1);
//! ```

pub mod config;
pub mod dynamic;
pub mod error;
pub mod identity;
pub mod links;
pub mod registry;
pub mod store;
pub mod table;
pub mod time;

#[cfg(feature = "python")]
mod python;

pub use config::{ChildModeConfig, TableConfig};
pub use error::{GanttError, Result};
pub use identity::{ClassId, GId, IdentityIndex, LocalId};
pub use links::{Direction, Endpoint, LinkDeclaration, LinkShape, ResolvedLink};
pub use registry::{TableLookup, TableRef, TableRegistry};
pub use store::{GraphItem, ItemRefresh, ItemSnapshot, RefreshOptions, Row, RowSnapshot};
pub use table::Table;
pub use time::TimeRange;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module definition.
///
/// Called by Python when importing the module.
#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::PyTable>()?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
