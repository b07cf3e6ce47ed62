//! Dynamic Child Resolver
//!
//! Computes, per root row, which rows qualify as its dynamic children and
//! keeps a persistent clone of each.
//!
//! # Algorithm
//!
//! For every root row:
//!
//! 1. Build the parent key map: key (per parent key kind) of every visible
//!    parent item → union of those items' time ranges. With the `Row` key
//!    kind the row's own id maps to the requested window.
//! 2. Keep the candidate source rows that share at least one key with the
//!    map, optionally requiring an actual time overlap.
//! 3. Find or create the clone of each match in the parent's cache, hide
//!    every item in the clone's graph, then copy back the source items the
//!    class rules admit.
//! 4. Replace the parent's child list wholesale.
//!
//! Clones outlive recomputation: resolving the same parent against the same
//! source hands out the same `Rc` every time, so UI state attached to a clone
//! (selection, expansion) survives scrolling.

use std::cell::{Ref, RefCell};
use std::collections::{HashMap, HashSet};
use std::ops::Deref;
use std::rc::Rc;

use indexmap::IndexMap;

use super::mode::{ChildMode, CopyBehavior, DynamicMode, KeyKind};
use crate::identity::GId;
use crate::store::{Graph, Row};
use crate::time::TimeRange;

/// Shared handle to a dynamic-child clone row.
pub type RowRef = Rc<RefCell<Row>>;

/// A candidate source row, however the caller got hold of it.
pub enum SourceRow<'a> {
    /// A row owned by a table's store.
    Borrowed(&'a Row),
    /// Another table's dynamic-child clone.
    Shared(Ref<'a, Row>),
    /// A detached copy.
    Owned(Row),
}

impl Deref for SourceRow<'_> {
    type Target = Row;

    fn deref(&self) -> &Row {
        match self {
            SourceRow::Borrowed(row) => row,
            SourceRow::Shared(row) => row,
            SourceRow::Owned(row) => row,
        }
    }
}

/// Key value → union of the time ranges of the parent items carrying it.
type KeyMap = HashMap<GId, TimeRange>;

/// Per-table dynamic child state: mode, staleness marker and clone cache.
#[derive(Debug, Default)]
pub struct DynamicChildResolver {
    mode: ChildMode,
    evaluated: bool,
    last_window: Option<TimeRange>,
    /// parent row → source row → clone.
    clones: IndexMap<GId, IndexMap<GId, RowRef>>,
    /// parent row → current dynamic children.
    children: IndexMap<GId, Vec<RowRef>>,
}

impl DynamicChildResolver {
    /// A resolver that has not run yet.
    pub fn new(mode: ChildMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Mode parsed at construction.
    pub fn mode(&self) -> &ChildMode {
        &self.mode
    }

    /// Window of the last evaluation, if any.
    pub fn last_window(&self) -> Option<TimeRange> {
        self.last_window
    }

    /// True when a pass over `window` would produce something new.
    ///
    /// Static mode only ever runs its first pass. Dynamic mode reruns when
    /// forced or when the window moved since the last pass.
    pub fn needs_recompute(&self, window: &TimeRange, force: bool) -> bool {
        match self.mode {
            ChildMode::Static => !self.evaluated,
            ChildMode::Dynamic(_) => !self.evaluated || force || self.last_window != Some(*window),
        }
    }

    /// Recompute the children of every root row in `roots`.
    ///
    /// With `exclude_parent` a root never becomes its own child (the source
    /// is the table the roots belong to). Sources sharing a row id count as
    /// one candidate carrying the union of their items, so a row never
    /// appears twice among a parent's children. Returns the number of
    /// children.
    pub fn resolve<'r>(
        &mut self,
        roots: impl IntoIterator<Item = &'r Row>,
        sources: &[SourceRow<'_>],
        window: TimeRange,
        exclude_parent: bool,
    ) -> usize {
        self.evaluated = true;
        self.last_window = Some(window);

        let ChildMode::Dynamic(mode) = &self.mode else {
            self.children.clear();
            return 0;
        };

        let candidates = group_sources(sources);

        let mut live = HashSet::new();
        let mut total = 0;
        for parent in roots {
            live.insert(parent.id);
            let keys = parent_keys(mode, parent, &window);
            let cache = self.clones.entry(parent.id).or_default();

            let mut resolved = Vec::new();
            for (&id, rows) in &candidates {
                if exclude_parent && id == parent.id {
                    continue;
                }
                if !rows.iter().any(|row| source_matches(mode, row, &keys)) {
                    continue;
                }
                let clone = cache
                    .entry(id)
                    .or_insert_with(|| Rc::new(RefCell::new(rows[0].clone_shell(parent.id))))
                    .clone();
                sync_clone(mode, &mut clone.borrow_mut(), rows, &keys);
                resolved.push(clone);
            }

            total += resolved.len();
            self.children.insert(parent.id, resolved);
        }

        self.children.retain(|id, _| live.contains(id));
        self.clones.retain(|id, _| live.contains(id));
        total
    }

    /// Current dynamic children of `parent`.
    pub fn children(&self, parent: &GId) -> &[RowRef] {
        self.children.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every current dynamic child, across all parents.
    pub fn all_children(&self) -> impl Iterator<Item = &RowRef> {
        self.children.values().flatten()
    }
}

fn parent_keys(mode: &DynamicMode, parent: &Row, window: &TimeRange) -> KeyMap {
    let mut keys = KeyMap::new();
    if mode.parent_key == KeyKind::Row {
        keys.insert(parent.id, *window);
        return keys;
    }

    let visible = parent.graph.iter().flat_map(|graph| graph.visible());
    for item in visible {
        if mode.visible_window_only && !item.time.intersects(window) {
            continue;
        }
        if let Some(key) = mode.parent_key.key_of(item) {
            keys.entry(key)
                .and_modify(|range| *range = range.union(&item.time))
                .or_insert(item.time);
        }
    }
    keys
}

fn source_matches(mode: &DynamicMode, source: &Row, keys: &KeyMap) -> bool {
    let mut items = source.items().filter(|item| item.visible);

    if mode.child_key == KeyKind::Row {
        let Some(range) = keys.get(&source.id) else {
            return false;
        };
        return !mode.require_intersection || items.any(|item| item.time.intersects(range));
    }

    items.any(|item| {
        match mode.child_key.key_of(item).and_then(|key| keys.get(&key)) {
            Some(range) => !mode.require_intersection || range.intersects(&item.time),
            None => false,
        }
    })
}

/// Candidates grouped by row id, in first-seen order. One source row can
/// arrive several times, e.g. as a clone under more than one parent of the
/// source table.
fn group_sources<'s>(sources: &'s [SourceRow<'_>]) -> IndexMap<GId, Vec<&'s Row>> {
    let mut grouped: IndexMap<GId, Vec<&'s Row>> = IndexMap::new();
    for source in sources {
        grouped.entry(source.id).or_default().push(&**source);
    }
    grouped
}

fn sync_clone(mode: &DynamicMode, clone: &mut Row, sources: &[&Row], keys: &KeyMap) {
    let clone_id = clone.id;
    if let Some(first) = sources.first() {
        clone.data = first.data.clone();
    }
    let graph = clone.graph.get_or_insert_with(Graph::new);
    graph.hide_all();

    let items = sources.iter().flat_map(|source| source.items());
    for item in items.filter(|item| item.visible) {
        let matched = mode.child_key.key_of(item).and_then(|key| keys.get(&key));
        let copy = match mode.behavior_for(item.id.class) {
            CopyBehavior::Always => true,
            CopyBehavior::None => false,
            CopyBehavior::ExistsPair => matched.is_some(),
            CopyBehavior::SynchronPair => matched.is_some_and(|range| range.intersects(&item.time)),
        };
        if !copy {
            continue;
        }

        let mut copied = item.clone();
        copied.row_id = clone_id;
        copied.visible = true;
        graph.upsert(copied);
    }
}
