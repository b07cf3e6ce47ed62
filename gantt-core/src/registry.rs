//! Named table lookup.
//!
//! A table whose dynamic children come from another table finds that table
//! by name at resolution time. Tables are shared as `Rc<RefCell<Table>>`;
//! the source table is only borrowed immutably while the dependent table
//! resolves.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::config::TableConfig;
use crate::error::Result;
use crate::table::Table;
use crate::time::TimeRange;

/// Shared handle to a registered table.
pub type TableRef = Rc<RefCell<Table>>;

/// Name → table lookup used for cross-table child sources.
pub trait TableLookup {
    /// Table registered under `name`, if any.
    fn lookup(&self, name: &str) -> Option<TableRef>;
}

/// Owns the tables of one chart, in registration order.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: IndexMap<String, TableRef>,
}

impl TableRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `table` under its own name, replacing any previous table
    /// with that name.
    pub fn register(&mut self, table: Table) -> TableRef {
        let name = table.name().to_string();
        let shared = Rc::new(RefCell::new(table));
        if self.tables.insert(name.clone(), Rc::clone(&shared)).is_some() {
            warn!(table = %name, "replaced registered table");
        }
        shared
    }

    /// Build a table from `config` and register it.
    pub fn create(&mut self, config: &TableConfig) -> Result<TableRef> {
        Ok(self.register(Table::new(config)?))
    }

    /// Table registered under `name`.
    pub fn get(&self, name: &str) -> Option<&TableRef> {
        self.tables.get(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True when no table is registered.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Resolve dynamic children of every table, in registration order.
    ///
    /// A table sourcing another table's dynamic children must be registered
    /// after it. Returns true if any table ran a pass.
    pub fn resolve_all(&self, window: TimeRange, force: bool) -> Result<bool> {
        let mut ran = false;
        for (name, table) in &self.tables {
            ran |= table.borrow_mut().resolve_dynamic_children(window, force, self)?;
            debug!(table = %name, ran, "resolve pass");
        }
        Ok(ran)
    }
}

impl TableLookup for TableRegistry {
    fn lookup(&self, name: &str) -> Option<TableRef> {
        self.tables.get(name).cloned()
    }
}
