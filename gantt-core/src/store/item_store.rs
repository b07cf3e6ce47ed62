//! Graph Item Store
//!
//! Owns the table's rows (and through them every graph) together with two
//! secondary indices:
//!
//! - the item index: item id → id of the row whose graph holds it
//! - the group index: group id → ids of the items sharing that group
//!
//! Neither index ever holds an entry for an item that is absent from all
//! graphs. Every mutation goes through [`GraphItemStore::refresh_item`] or
//! [`GraphItemStore::refresh_row`], which apply insert, update and delete
//! through one entry point.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace, warn};

use super::item::{GraphItem, ItemSnapshot};
use super::row::{Graph, Row, RowSnapshot};
use crate::error::{GanttError, Result};
use crate::identity::GId;

/// Switches for one refresh request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshOptions {
    /// Known items are left as they are; only unseen ones get inserted.
    pub disable_update: bool,
    /// On delete, search every graph and sweep the group index when the
    /// item index is stale or no longer knows the item.
    pub force: bool,
}

impl RefreshOptions {
    /// Deletes clean up stale index entries.
    pub fn forced() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }

    /// Existing items are not merged.
    pub fn insert_only() -> Self {
        Self {
            disable_update: true,
            ..Self::default()
        }
    }
}

/// One entry of a batch refresh: an upsert when a snapshot is present,
/// a removal otherwise.
#[derive(Debug, Clone, Copy)]
pub struct ItemRefresh<'a> {
    pub id: Option<GId>,
    pub snapshot: Option<&'a ItemSnapshot>,
}

impl<'a> ItemRefresh<'a> {
    /// Insert or merge `snapshot`.
    pub fn upsert(snapshot: &'a ItemSnapshot) -> Self {
        Self {
            id: None,
            snapshot: Some(snapshot),
        }
    }

    /// Delete the item `id`.
    pub fn remove(id: GId) -> Self {
        Self {
            id: Some(id),
            snapshot: None,
        }
    }
}

/// Rows, graphs and the item/group indices of one table.
#[derive(Debug, Default)]
pub struct GraphItemStore {
    rows: IndexMap<GId, Row>,
    items: HashMap<GId, GId>,
    groups: HashMap<GId, IndexSet<GId>>,
    active_skin: u32,
}

impl GraphItemStore {
    /// An empty store drawing with skin `active_skin`.
    pub fn new(active_skin: u32) -> Self {
        Self {
            active_skin,
            ..Self::default()
        }
    }

    /// Skin index stamped on items created from now on.
    pub fn active_skin(&self) -> u32 {
        self.active_skin
    }

    /// Skin used for items inserted from now on.
    pub fn set_active_skin(&mut self, skin: u32) {
        self.active_skin = skin;
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Row `id`, if present.
    pub fn row(&self, id: &GId) -> Option<&Row> {
        self.rows.get(id)
    }

    /// Every row, in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    /// Rows without a parent in the row hierarchy.
    pub fn root_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.values().filter(|row| row.is_root())
    }

    /// Number of rows, with or without a graph.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Id of the row whose graph holds `item`.
    pub fn row_of(&self, item: &GId) -> Option<GId> {
        self.items.get(item).copied()
    }

    /// Looks the item up through the item index.
    pub fn item(&self, id: &GId) -> Option<&GraphItem> {
        let row = self.items.get(id)?;
        self.rows.get(row)?.graph.as_ref()?.get(id)
    }

    /// True if the item index knows `id`.
    pub fn contains_item(&self, id: &GId) -> bool {
        self.items.contains_key(id)
    }

    /// Number of indexed items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Items sharing `group`, in insertion order.
    pub fn group_members(&self, group: &GId) -> Option<&IndexSet<GId>> {
        self.groups.get(group)
    }

    /// True if `id` names a group with at least one member.
    pub fn is_group(&self, id: &GId) -> bool {
        self.groups.contains_key(id)
    }

    // ------------------------------------------------------------------
    // Item refresh
    // ------------------------------------------------------------------

    /// Apply one insert, update or delete.
    ///
    /// The target is `id`, or the snapshot's own id when `id` is absent.
    /// A present snapshot upserts, an absent one removes. Returns true when
    /// the visible state changed.
    pub fn refresh_item(
        &mut self,
        id: Option<GId>,
        snapshot: Option<&ItemSnapshot>,
        options: RefreshOptions,
    ) -> Result<bool> {
        match (id, snapshot) {
            (id, Some(snapshot)) => self.upsert_item(id.unwrap_or(snapshot.id), snapshot, options),
            (Some(id), None) => Ok(self.remove_item(id, options)),
            (None, None) => Err(GanttError::MissingItemId),
        }
    }

    /// Batch variant of [`refresh_item`](Self::refresh_item).
    ///
    /// Stops at the first contract error; otherwise returns one aggregated
    /// changed flag for the whole batch.
    pub fn refresh_items<'a>(
        &mut self,
        requests: impl IntoIterator<Item = ItemRefresh<'a>>,
        options: RefreshOptions,
    ) -> Result<bool> {
        let mut changed = false;
        let mut applied = 0usize;
        for request in requests {
            changed |= self.refresh_item(request.id, request.snapshot, options)?;
            applied += 1;
        }
        debug!(applied, changed, "batch item refresh");
        Ok(changed)
    }

    fn upsert_item(
        &mut self,
        id: GId,
        snapshot: &ItemSnapshot,
        options: RefreshOptions,
    ) -> Result<bool> {
        let current_row = self.items.get(&id).copied();
        let row_id = snapshot
            .row_id
            .or(current_row)
            .ok_or(GanttError::MissingRowId(id))?;

        let Some(current_row) = current_row else {
            let item = GraphItem::from_snapshot(id, row_id, snapshot, self.active_skin);
            self.insert_item(item);
            trace!(item = %id, row = %row_id, "inserted graph item");
            return Ok(true);
        };

        if options.disable_update {
            return Ok(false);
        }

        let existing = self
            .rows
            .get_mut(&current_row)
            .and_then(|row| row.graph.as_mut())
            .and_then(|graph| graph.remove(&id));

        let Some(mut item) = existing else {
            // Indexed but missing from its graph: treat as a fresh insert.
            warn!(item = %id, row = %current_row, "stale item index entry, reinserting");
            self.items.remove(&id);
            self.sweep_groups(&id);
            let item = GraphItem::from_snapshot(id, row_id, snapshot, self.active_skin);
            self.insert_item(item);
            return Ok(true);
        };

        let old_group = item.group_id;
        let mut changed = item.merge(snapshot);
        if item.row_id != row_id {
            trace!(item = %id, from = %item.row_id, to = %row_id, "moving graph item");
            item.row_id = row_id;
            changed = true;
        }
        if old_group != item.group_id {
            if let Some(group) = old_group {
                self.unindex_group(&group, &id);
            }
        }
        self.insert_item(item);
        Ok(changed)
    }

    /// Place an item into its row's graph and both indices, creating the
    /// row shell and the graph when needed.
    fn insert_item(&mut self, item: GraphItem) {
        let id = item.id;
        let row_id = item.row_id;
        if let Some(group) = item.group_id {
            self.groups.entry(group).or_default().insert(id);
        }
        self.rows
            .entry(row_id)
            .or_insert_with(|| Row::bare(row_id))
            .graph
            .get_or_insert_with(Graph::new)
            .upsert(item);
        self.items.insert(id, row_id);
    }

    /// Drop `id` from the item index, and from its graph when the indexed
    /// row still holds it.
    ///
    /// A stale index entry (the indexed graph no longer holds the item) is
    /// only dropped. With `force` every graph is searched for the item and
    /// the group index is swept as well.
    fn remove_item(&mut self, id: GId, options: RefreshOptions) -> bool {
        let indexed = self.items.remove(&id);

        let removed = indexed.and_then(|row_id| {
            self.rows
                .get_mut(&row_id)
                .and_then(|row| row.graph.as_mut())
                .and_then(|graph| graph.remove(&id))
        });
        if let Some(item) = removed {
            if let Some(group) = item.group_id {
                self.unindex_group(&group, &id);
            }
            trace!(item = %id, row = %item.row_id, "removed graph item");
            return true;
        }

        if !options.force {
            if let Some(row_id) = indexed {
                warn!(item = %id, row = %row_id, "stale item index entry dropped on delete");
            }
            return false;
        }

        let mut purged = 0usize;
        for graph in self.rows.values_mut().filter_map(|row| row.graph.as_mut()) {
            purged += usize::from(graph.remove(&id).is_some());
        }
        let swept = self.sweep_groups(&id);
        debug!(item = %id, purged, swept, "forced delete");
        indexed.is_some() || purged > 0 || swept
    }

    fn unindex_group(&mut self, group: &GId, item: &GId) {
        if let Some(members) = self.groups.get_mut(group) {
            members.shift_remove(item);
            if members.is_empty() {
                self.groups.remove(group);
            }
        }
    }

    /// Remove `item` from every group. Returns true if any entry went away.
    fn sweep_groups(&mut self, item: &GId) -> bool {
        let mut swept = false;
        self.groups.retain(|_, members| {
            swept |= members.shift_remove(item);
            !members.is_empty()
        });
        swept
    }

    // ------------------------------------------------------------------
    // Row and graph refresh
    // ------------------------------------------------------------------

    /// Insert, update or delete a row.
    ///
    /// Deleting a row deletes its graph and every index entry of its items.
    pub fn refresh_row(&mut self, id: Option<GId>, snapshot: Option<&RowSnapshot>) -> Result<bool> {
        match (id, snapshot) {
            (id, Some(snapshot)) => {
                let id = id.unwrap_or(snapshot.id);
                let skin = self.active_skin;
                match self.rows.get_mut(&id) {
                    Some(row) => Ok(row.merge(snapshot, skin)),
                    None => {
                        self.rows.insert(id, Row::from_snapshot(id, snapshot, skin));
                        trace!(row = %id, "inserted row");
                        Ok(true)
                    }
                }
            }
            (Some(id), None) => {
                let Some(mut row) = self.rows.shift_remove(&id) else {
                    return Ok(false);
                };
                if let Some(graph) = row.graph.take() {
                    self.unindex_graph(&graph);
                }
                trace!(row = %id, "removed row");
                Ok(true)
            }
            (None, None) => Err(GanttError::MissingRowSnapshot),
        }
    }

    /// Drop a row's graph and purge its items from both indices.
    ///
    /// The row itself stays. Returns false if the row had no graph.
    pub fn remove_graph(&mut self, row: &GId) -> bool {
        let Some(graph) = self.rows.get_mut(row).and_then(|row| row.graph.take()) else {
            return false;
        };
        self.unindex_graph(&graph);
        debug!(row = %row, items = graph.len(), "removed graph");
        true
    }

    fn unindex_graph(&mut self, graph: &Graph) {
        for item in graph.iter() {
            self.items.remove(&item.id);
            if let Some(group) = item.group_id {
                self.unindex_group(&group, &item.id);
            }
        }
    }
}
