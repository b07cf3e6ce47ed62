//! Mirrored adjacency indices.
//!
//! Every edge is reachable twice: from `by_prev` under its prev endpoint and
//! from `by_next` under its next endpoint. Both maps are only ever touched
//! together, so they always describe the same edge set.

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::record::{EdgeKey, LinkRecord};
use crate::identity::LocalId;

type EdgeList = SmallVec<[EdgeKey; 4]>;

/// Directed link edges with two mirrored adjacency multimaps.
#[derive(Debug, Default, Clone)]
pub struct LinkGraph {
    records: IndexMap<EdgeKey, LinkRecord>,
    by_prev: IndexMap<LocalId, EdgeList>,
    by_next: IndexMap<LocalId, EdgeList>,
}

impl LinkGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build both indices from a record list. Later duplicates replace
    /// earlier ones.
    pub fn from_records(records: impl IntoIterator<Item = LinkRecord>) -> Self {
        let mut graph = Self::new();
        for record in records {
            graph.add(record);
        }
        graph
    }

    /// Add an edge, or replace the record of an existing one.
    ///
    /// Returns true if the edge set or the stored record changed.
    pub fn add(&mut self, record: LinkRecord) -> bool {
        let key = record.key();
        match self.records.get_mut(&key) {
            Some(existing) if *existing == record => false,
            Some(existing) => {
                *existing = record;
                true
            }
            None => {
                self.by_prev.entry(key.prev).or_default().push(key);
                self.by_next.entry(key.next).or_default().push(key);
                self.records.insert(key, record);
                true
            }
        }
    }

    /// Remove an edge from both indices.
    pub fn remove(&mut self, key: &EdgeKey) -> Option<LinkRecord> {
        let record = self.records.shift_remove(key)?;
        detach(&mut self.by_prev, key.prev, key);
        detach(&mut self.by_next, key.next, key);
        Some(record)
    }

    /// Drop every edge from the records and both indices.
    pub fn clear(&mut self) {
        self.records.clear();
        self.by_prev.clear();
        self.by_next.clear();
    }

    /// Stored record of edge `key`.
    pub fn record(&self, key: &EdgeKey) -> Option<&LinkRecord> {
        self.records.get(key)
    }

    /// Edges whose prev endpoint is `id`.
    pub fn outgoing(&self, id: LocalId) -> &[EdgeKey] {
        self.by_prev.get(&id).map(|edges| edges.as_slice()).unwrap_or(&[])
    }

    /// Edges whose next endpoint is `id`.
    pub fn incoming(&self, id: LocalId) -> &[EdgeKey] {
        self.by_next.get(&id).map(|edges| edges.as_slice()).unwrap_or(&[])
    }

    /// Every edge, walked through the prev-keyed index. Prev endpoints come
    /// in first-seen order.
    pub fn iter_by_prev(&self) -> impl Iterator<Item = &LinkRecord> {
        self.by_prev
            .values()
            .flat_map(|edges| edges.iter())
            .filter_map(|key| self.records.get(key))
    }

    /// Number of distinct edges.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when there is no edge.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn detach(index: &mut IndexMap<LocalId, EdgeList>, id: LocalId, key: &EdgeKey) {
    if let Some(edges) = index.get_mut(&id) {
        edges.retain(|edge| edge != key);
        if edges.is_empty() {
            index.shift_remove(&id);
        }
    }
}
