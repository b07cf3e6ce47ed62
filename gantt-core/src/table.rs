//! Table
//!
//! One Gantt table: its identity index, graph item store, link graph,
//! group collapse state and dynamic child resolver, behind the refresh and
//! query surface the host talks to.
//!
//! # Refresh pipeline
//!
//! ```text
//! host snapshots ──► refresh_row / refresh_item(s) ──► GraphItemStore
//!                          │ (interns ids)
//!                          ▼
//! link declarations ─► set_links / add_link ───────► LinkGraph
//!
//! visible window ────► resolve_dynamic_children ───► DynamicChildResolver
//! ```
//!
//! Every entry point runs synchronously on the owning thread. Tables are
//! shared through `Rc<RefCell<_>>` in a [`TableRegistry`](crate::TableRegistry)
//! when one table sources children from another.

use std::collections::HashSet;

use indexmap::IndexSet;
use smallvec::{smallvec, SmallVec};
use tracing::debug;

use crate::config::TableConfig;
use crate::dynamic::{ChildMode, ChildSource, DynamicChildResolver, RowRef, SourceRow, SourceScope};
use crate::error::{GanttError, Result};
use crate::identity::{GId, IdentityIndex, LocalId};
use crate::links::{
    collect_all_links, collect_links, Direction, DrawableResolver, EdgeKey, Endpoint,
    LinkDeclaration, LinkGraph, LinkQuery, LinkShape, ResolvedLink,
};
use crate::registry::TableLookup;
use crate::store::{
    GraphItem, GraphItemStore, ItemRefresh, ItemSnapshot, RefreshOptions, Row, RowSnapshot,
};
use crate::time::TimeRange;

/// A Gantt table.
#[derive(Debug)]
pub struct Table {
    name: String,
    ids: IdentityIndex,
    store: GraphItemStore,
    links: LinkGraph,
    collapsed: HashSet<GId>,
    link_shape: LinkShape,
    resolver: DynamicChildResolver,
}

impl Table {
    /// Build a table, parsing its child-mode configuration once.
    pub fn new(config: &TableConfig) -> Result<Self> {
        let mode = ChildMode::from_config(&config.children)?;
        debug!(table = %config.name, dynamic = !mode.is_static(), "created table");
        Ok(Self {
            name: config.name.clone(),
            ids: IdentityIndex::new(),
            store: GraphItemStore::new(config.active_skin),
            links: LinkGraph::new(),
            collapsed: HashSet::new(),
            link_shape: config.link_shape,
            resolver: DynamicChildResolver::new(mode),
        })
    }

    /// Name the table is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// Local id of `gid`, assigned on first sight.
    pub fn get_id(&mut self, gid: GId) -> LocalId {
        self.ids.get_id(gid)
    }

    /// Local id of `gid` if it was ever seen.
    pub fn find_id(&self, gid: &GId) -> Option<LocalId> {
        self.ids.find_id(gid)
    }

    /// Global id behind a local id.
    pub fn get_gid(&self, id: LocalId) -> Option<GId> {
        self.ids.get_gid(id)
    }

    fn intern(&mut self, id: Option<GId>, snapshot: Option<&ItemSnapshot>) {
        if let Some(id) = id {
            self.ids.get_id(id);
        }
        if let Some(snapshot) = snapshot {
            self.ids.get_id(snapshot.id);
            for key in [snapshot.group_id, snapshot.data_id].into_iter().flatten() {
                self.ids.get_id(key);
            }
        }
    }

    // ------------------------------------------------------------------
    // Rows and items
    // ------------------------------------------------------------------

    /// Insert, update or delete one item. See [`GraphItemStore::refresh_item`].
    pub fn refresh_item(
        &mut self,
        id: Option<GId>,
        snapshot: Option<&ItemSnapshot>,
        options: RefreshOptions,
    ) -> Result<bool> {
        self.intern(id, snapshot);
        self.store.refresh_item(id, snapshot, options)
    }

    /// Apply a batch of item refreshes and report one changed flag.
    pub fn refresh_items<'a>(
        &mut self,
        requests: impl IntoIterator<Item = ItemRefresh<'a>>,
        options: RefreshOptions,
    ) -> Result<bool> {
        let requests: Vec<ItemRefresh<'a>> = requests.into_iter().collect();
        for request in &requests {
            self.intern(request.id, request.snapshot);
        }
        self.store.refresh_items(requests, options)
    }

    /// Insert, update or delete one row.
    pub fn refresh_row(&mut self, id: Option<GId>, snapshot: Option<&RowSnapshot>) -> Result<bool> {
        if let Some(id) = id.or(snapshot.map(|snapshot| snapshot.id)) {
            self.ids.get_id(id);
        }
        self.store.refresh_row(id, snapshot)
    }

    /// Drop a row's graph and everything indexed from it.
    pub fn remove_graph(&mut self, row: &GId) -> bool {
        self.store.remove_graph(row)
    }

    /// Switch the skin applied to newly inserted items.
    pub fn set_active_skin(&mut self, skin: u32) {
        self.store.set_active_skin(skin);
    }

    /// Read access to rows, items and indices.
    pub fn store(&self) -> &GraphItemStore {
        &self.store
    }

    /// Stored item `id`.
    pub fn item(&self, id: &GId) -> Option<&GraphItem> {
        self.store.item(id)
    }

    /// Stored row `id`.
    pub fn row(&self, id: &GId) -> Option<&Row> {
        self.store.row(id)
    }

    /// Rows without a parent.
    pub fn root_rows(&self) -> impl Iterator<Item = &Row> {
        self.store.root_rows()
    }

    /// Items of `group`, in insertion order.
    pub fn group_members(&self, group: &GId) -> Option<&IndexSet<GId>> {
        self.store.group_members(group)
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    /// Render `group` collapsed (links then attach to the group, not its
    /// items). Returns true if the state changed.
    pub fn set_group_collapsed(&mut self, group: GId, collapsed: bool) -> bool {
        if collapsed {
            self.ids.get_id(group);
            self.collapsed.insert(group)
        } else {
            self.collapsed.remove(&group)
        }
    }

    /// True if `group` is drawn as one node.
    pub fn is_group_collapsed(&self, group: &GId) -> bool {
        self.collapsed.contains(group)
    }

    // ------------------------------------------------------------------
    // Links
    // ------------------------------------------------------------------

    /// Rebuild the link graph from scratch. Returns the number of edges kept
    /// after filtering malformed declarations.
    pub fn set_links(&mut self, declarations: &[LinkDeclaration]) -> usize {
        let ids = &mut self.ids;
        let records = declarations.iter().filter_map(|declaration| declaration.resolve(ids));
        self.links = LinkGraph::from_records(records);
        debug!(
            table = %self.name,
            declared = declarations.len(),
            kept = self.links.len(),
            "rebuilt link graph"
        );
        self.links.len()
    }

    /// Add or update one link. Returns true if the link graph changed.
    pub fn add_link(&mut self, declaration: &LinkDeclaration) -> bool {
        match declaration.resolve(&mut self.ids) {
            Some(record) => self.links.add(record),
            None => false,
        }
    }

    /// Add or update several links with a single changed flag.
    pub fn refresh_links(&mut self, declarations: &[LinkDeclaration]) -> bool {
        declarations
            .iter()
            .fold(false, |changed, declaration| self.add_link(declaration) | changed)
    }

    /// Remove the link `prev → next`. Unknown links are a no-op.
    pub fn remove_link(&mut self, prev: &GId, next: &GId) -> bool {
        let (Some(prev), Some(next)) = (self.ids.find_id(prev), self.ids.find_id(next)) else {
            return false;
        };
        self.links.remove(&EdgeKey { prev, next }).is_some()
    }

    /// The mirrored adjacency behind link queries.
    pub fn link_graph(&self) -> &LinkGraph {
        &self.links
    }

    /// Number of stored links, drawable or not.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Links reachable from `anchor` (an item or a group) in `direction`.
    ///
    /// Unknown anchors yield no links.
    pub fn links_for(
        &self,
        anchor: &GId,
        direction: Direction,
        expand_chain: bool,
    ) -> Vec<ResolvedLink> {
        let Some(anchor) = self.ids.find_id(anchor) else {
            return Vec::new();
        };
        let query = LinkQuery {
            anchor,
            direction,
            expand_chain,
        };
        collect_links(&self.links, self, &query, self.link_shape)
    }

    /// Every link with resolved endpoints ("always show" mode).
    pub fn all_links(&self) -> Vec<ResolvedLink> {
        collect_all_links(&self.links, self, self.link_shape)
    }

    // ------------------------------------------------------------------
    // Dynamic children
    // ------------------------------------------------------------------

    /// Recompute dynamic children of every root row for `window`.
    ///
    /// Does nothing unless forced or the window moved since the last pass
    /// (static tables only ever run their first pass). Returns true if a
    /// pass ran.
    pub fn resolve_dynamic_children(
        &mut self,
        window: TimeRange,
        force: bool,
        tables: &dyn TableLookup,
    ) -> Result<bool> {
        if !self.resolver.needs_recompute(&window, force) {
            return Ok(false);
        }

        let source = match self.resolver.mode() {
            ChildMode::Static => None,
            ChildMode::Dynamic(mode) => Some(mode.source.clone()),
        };

        let total = match source {
            None => self.resolver.resolve(std::iter::empty(), &[], window, true),
            Some(ChildSource::Table { name, scope }) if name != self.name => {
                let shared = tables
                    .lookup(&name)
                    .ok_or_else(|| GanttError::UnknownTable(name.clone()))?;
                let other = shared
                    .try_borrow()
                    .map_err(|_| GanttError::TableBusy(name.clone()))?;
                let sources = other.source_rows(scope);
                self.resolver.resolve(self.store.root_rows(), &sources, window, false)
            }
            Some(source) => {
                let sources: Vec<SourceRow<'_>> = match source.scope() {
                    SourceScope::AllRows => self.store.rows().map(SourceRow::Borrowed).collect(),
                    SourceScope::RootRows => {
                        self.store.root_rows().map(SourceRow::Borrowed).collect()
                    }
                    // Detached copies: a clone may be its own source.
                    SourceScope::DynamicChildren => self
                        .resolver
                        .all_children()
                        .map(|row| SourceRow::Owned(row.borrow().clone()))
                        .collect(),
                };
                self.resolver.resolve(self.store.root_rows(), &sources, window, true)
            }
        };

        debug!(table = %self.name, children = total, force, "resolved dynamic children");
        Ok(true)
    }

    /// Current dynamic children of `row`.
    pub fn dynamic_children(&self, row: &GId) -> &[RowRef] {
        self.resolver.children(row)
    }

    /// Candidate rows this table offers to another table's resolver.
    fn source_rows(&self, scope: SourceScope) -> Vec<SourceRow<'_>> {
        match scope {
            SourceScope::AllRows => self.store.rows().map(SourceRow::Borrowed).collect(),
            SourceScope::RootRows => self.store.root_rows().map(SourceRow::Borrowed).collect(),
            SourceScope::DynamicChildren => self
                .resolver
                .all_children()
                .map(|row| SourceRow::Shared(row.borrow()))
                .collect(),
        }
    }
}

impl DrawableResolver for Table {
    fn representative(&self, id: LocalId) -> Option<Endpoint> {
        let gid = self.ids.get_gid(id)?;
        if let Some(item) = self.store.item(&gid) {
            return match item.group_id.filter(|group| self.collapsed.contains(group)) {
                Some(group) => self.ids.find_id(&group).map(Endpoint::Group),
                None => Some(Endpoint::Item(id)),
            };
        }
        self.store.is_group(&gid).then_some(Endpoint::Group(id))
    }

    fn anchor_ids(&self, node: Endpoint) -> SmallVec<[LocalId; 4]> {
        let mut ids: SmallVec<[LocalId; 4]> = smallvec![node.local_id()];
        let Some(gid) = self.ids.get_gid(node.local_id()) else {
            return ids;
        };
        match node {
            Endpoint::Item(_) => {
                let group = self.store.item(&gid).and_then(|item| item.group_id);
                ids.extend(group.and_then(|group| self.ids.find_id(&group)));
            }
            Endpoint::Group(_) => {
                if let Some(members) = self.store.group_members(&gid) {
                    ids.extend(members.iter().filter_map(|member| self.ids.find_id(member)));
                }
            }
        }
        ids
    }

    fn links_suppressed(&self, node: Endpoint) -> bool {
        let Some(gid) = self.ids.get_gid(node.local_id()) else {
            return false;
        };
        let group = match node {
            Endpoint::Item(_) => match self.store.item(&gid) {
                Some(item) if item.behavior.suppress_links => return true,
                Some(item) => item.group_id,
                None => return false,
            },
            Endpoint::Group(_) => Some(gid),
        };
        group
            .and_then(|group| self.store.group_members(&group))
            .is_some_and(|members| {
                members
                    .iter()
                    .filter_map(|member| self.store.item(member))
                    .any(|item| item.behavior.suppress_links)
            })
    }
}
