//! Python bindings for a single table.
//!
//! Global ids cross the boundary as `(class, record)` tuples and times as
//! UTC unix seconds.

use chrono::DateTime;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::TableConfig;
use crate::error::GanttError;
use crate::identity::{GId, LocalId};
use crate::links::{Direction, LinkDeclaration};
use crate::store::{ItemSnapshot, RefreshOptions};
use crate::table::Table;
use crate::time::TimeRange;

type PyGId = (u32, i64);

impl From<GanttError> for PyErr {
    fn from(err: GanttError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

fn gid((class, record): PyGId) -> GId {
    GId::new(class, record)
}

fn direction(text: &str) -> PyResult<Direction> {
    match text {
        "prev" => Ok(Direction::Prev),
        "next" => Ok(Direction::Next),
        "both" => Ok(Direction::Both),
        other => Err(PyValueError::new_err(format!("unknown direction `{other}`"))),
    }
}

/// Python-exposed table.
///
/// Tables are single-threaded; the class is pinned to the creating thread.
#[pyclass(name = "Table", unsendable)]
pub struct PyTable {
    table: Table,
}

#[pymethods]
impl PyTable {
    /// Create a table from its JSON configuration.
    #[new]
    fn new(config_json: &str) -> PyResult<Self> {
        let config = TableConfig::from_json(config_json)?;
        Ok(Self {
            table: Table::new(&config)?,
        })
    }

    /// Table name.
    #[getter]
    fn name(&self) -> String {
        self.table.name().to_string()
    }

    /// Local id of a global id, assigned on first sight.
    fn get_id(&mut self, id: PyGId) -> u32 {
        self.table.get_id(gid(id)).raw()
    }

    /// Global id of a local id, if known.
    fn get_gid(&self, id: u32) -> Option<(u32, i64, Option<i64>)> {
        self.table
            .get_gid(LocalId::from(id))
            .map(|gid| (gid.class.0, gid.record.0, gid.entry.map(|entry| entry.0)))
    }

    /// Insert or update an item on `row` spanning `[start, end)`.
    #[pyo3(signature = (id, row, start, end, group=None))]
    fn insert_item(
        &mut self,
        id: PyGId,
        row: PyGId,
        start: i64,
        end: i64,
        group: Option<PyGId>,
    ) -> PyResult<bool> {
        let at = |secs: i64| {
            DateTime::from_timestamp(secs, 0)
                .map(|time| time.naive_utc())
                .ok_or_else(|| PyValueError::new_err(format!("timestamp out of range: {secs}")))
        };
        let time = TimeRange::new(at(start)?, at(end)?);
        let mut snapshot = ItemSnapshot::new(gid(id), gid(row), time);
        snapshot.group_id = group.map(gid);
        Ok(self
            .table
            .refresh_item(None, Some(&snapshot), RefreshOptions::default())?)
    }

    /// Remove an item.
    fn remove_item(&mut self, id: PyGId) -> PyResult<bool> {
        Ok(self
            .table
            .refresh_item(Some(gid(id)), None, RefreshOptions::default())?)
    }

    /// Add a link; returns true if the link graph changed.
    #[pyo3(signature = (prev, next, transitive=false))]
    fn add_link(&mut self, prev: PyGId, next: PyGId, transitive: bool) -> bool {
        let mut declaration = LinkDeclaration::new(gid(prev), gid(next));
        declaration.transitive = transitive;
        self.table.add_link(&declaration)
    }

    /// Remove the link `prev -> next`.
    fn remove_link(&mut self, prev: PyGId, next: PyGId) -> bool {
        self.table.remove_link(&gid(prev), &gid(next))
    }

    /// Links touching `anchor` as `(prev, next)` local id pairs.
    #[pyo3(signature = (anchor, direction="next", expand_chain=false))]
    fn links_for(
        &self,
        anchor: PyGId,
        direction: &str,
        expand_chain: bool,
    ) -> PyResult<Vec<(u32, u32)>> {
        let direction = self::direction(direction)?;
        Ok(self
            .table
            .links_for(&gid(anchor), direction, expand_chain)
            .into_iter()
            .map(|link| (link.prev.local_id().raw(), link.next.local_id().raw()))
            .collect())
    }

    /// Number of stored links.
    fn link_count(&self) -> usize {
        self.table.link_count()
    }

    fn __repr__(&self) -> String {
        format!(
            "Table(name={:?}, items={}, links={})",
            self.table.name(),
            self.table.store().item_count(),
            self.table.link_count()
        )
    }
}
