//! Link Traversal
//!
//! Answers "which dependency lines touch item X" for the renderer.
//!
//! # Algorithm
//!
//! Breadth-first walk with an explicit visited set:
//!
//! 1. Seed the queue with the anchor's drawable representative (the item, or
//!    its group when the group is rendered collapsed).
//! 2. Pop a node. A node whose link drawing is suppressed contributes nothing.
//! 3. Collect the node's edges in the requested direction, skipping edges
//!    already recorded.
//! 4. Resolve both endpoints of each new edge to their drawable
//!    representatives and record the edge with its effective shape.
//! 5. With whole-chain expansion, an edge marked transitive enqueues its far
//!    endpoint unless that node was already visited.
//!
//! Link data is user-declared and may contain cycles. The visited set is what
//! makes the walk terminate; there is no recursion.

use std::collections::{HashSet, VecDeque};

use smallvec::SmallVec;
use tracing::trace;

use super::adjacency::LinkGraph;
use super::record::{EdgeKey, LinkRecord, LinkShape, LinkSource};
use crate::identity::LocalId;
use crate::store::Color;

/// Which edges of a node a query follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Edges pointing at the node (its predecessors).
    Prev,
    /// Edges leaving the node (its successors).
    #[default]
    Next,
    /// Both of the above.
    Both,
}

impl Direction {
    fn follows_outgoing(self) -> bool {
        matches!(self, Direction::Next | Direction::Both)
    }

    fn follows_incoming(self) -> bool {
        matches!(self, Direction::Prev | Direction::Both)
    }
}

/// A bounded link query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkQuery {
    pub anchor: LocalId,
    pub direction: Direction,
    /// Keep walking across transitive edges.
    pub expand_chain: bool,
}

/// What a link end is drawn against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Item(LocalId),
    Group(LocalId),
}

impl Endpoint {
    /// Local id of the item or group behind the endpoint.
    pub fn local_id(&self) -> LocalId {
        match self {
            Endpoint::Item(id) | Endpoint::Group(id) => *id,
        }
    }
}

/// An edge ready for drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub key: EdgeKey,
    pub prev: Endpoint,
    pub next: Endpoint,
    pub shape: LinkShape,
    pub width: u16,
    pub color: Color,
    pub source: LinkSource,
}

impl ResolvedLink {
    fn new(record: &LinkRecord, prev: Endpoint, next: Endpoint, default_shape: LinkShape) -> Self {
        Self {
            key: record.key(),
            prev,
            next,
            shape: record.shape.unwrap_or(default_shape),
            width: record.width,
            color: record.color,
            source: record.source.clone(),
        }
    }
}

/// Maps local ids onto what is currently drawn.
///
/// Implemented by the table, which knows items, groups and collapse state.
pub trait DrawableResolver {
    /// Current drawable representative of `id`, or `None` if nothing on
    /// screen stands for it.
    fn representative(&self, id: LocalId) -> Option<Endpoint>;

    /// Local ids whose edges belong to `node`: an item plus its group, or a
    /// group plus its members.
    fn anchor_ids(&self, node: Endpoint) -> SmallVec<[LocalId; 4]>;

    /// True when link drawing is disabled for the node's group.
    fn links_suppressed(&self, node: Endpoint) -> bool;
}

/// Walk the link graph from `query.anchor`.
pub fn collect_links<R: DrawableResolver + ?Sized>(
    graph: &LinkGraph,
    resolver: &R,
    query: &LinkQuery,
    default_shape: LinkShape,
) -> Vec<ResolvedLink> {
    let mut links = Vec::new();
    let Some(seed) = resolver.representative(query.anchor) else {
        return links;
    };

    let mut visited: HashSet<Endpoint> = HashSet::new();
    let mut recorded: HashSet<EdgeKey> = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(seed);
    queue.push_back(seed);

    while let Some(node) = queue.pop_front() {
        if resolver.links_suppressed(node) {
            continue;
        }

        for id in resolver.anchor_ids(node) {
            let outgoing = graph.outgoing(id).iter().filter(|_| query.direction.follows_outgoing());
            let incoming = graph.incoming(id).iter().filter(|_| query.direction.follows_incoming());

            for key in outgoing.chain(incoming) {
                if !recorded.insert(*key) {
                    continue;
                }
                let Some(record) = graph.record(key) else {
                    continue;
                };
                let (Some(prev), Some(next)) =
                    (resolver.representative(key.prev), resolver.representative(key.next))
                else {
                    trace!(
                        prev = key.prev.raw(),
                        next = key.next.raw(),
                        "link endpoint not drawable"
                    );
                    continue;
                };

                links.push(ResolvedLink::new(record, prev, next, default_shape));

                if query.expand_chain && record.transitive {
                    let far = if key.prev == id { next } else { prev };
                    if visited.insert(far) {
                        queue.push_back(far);
                    }
                }
            }
        }
    }

    links
}

/// Every known edge with resolved endpoints, without walking.
pub fn collect_all_links<R: DrawableResolver + ?Sized>(
    graph: &LinkGraph,
    resolver: &R,
    default_shape: LinkShape,
) -> Vec<ResolvedLink> {
    graph
        .iter_by_prev()
        .filter_map(|record| {
            let prev = resolver.representative(record.prev)?;
            let next = resolver.representative(record.next)?;
            Some(ResolvedLink::new(record, prev, next, default_shape))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    /// Every id is its own drawable item; ids listed in `muted` suppress links.
    struct FlatResolver {
        muted: Vec<u32>,
    }

    impl DrawableResolver for FlatResolver {
        fn representative(&self, id: LocalId) -> Option<Endpoint> {
            (!id.is_none()).then_some(Endpoint::Item(id))
        }

        fn anchor_ids(&self, node: Endpoint) -> SmallVec<[LocalId; 4]> {
            smallvec![node.local_id()]
        }

        fn links_suppressed(&self, node: Endpoint) -> bool {
            self.muted.contains(&node.local_id().raw())
        }
    }

    fn edge(prev: u32, next: u32, transitive: bool) -> LinkRecord {
        LinkRecord {
            prev: LocalId::from(prev),
            next: LocalId::from(next),
            shape: None,
            width: 1,
            color: Color::EMPTY,
            transitive,
            source: LinkSource::default(),
        }
    }

    fn query(anchor: u32, direction: Direction, expand_chain: bool) -> LinkQuery {
        LinkQuery {
            anchor: LocalId::from(anchor),
            direction,
            expand_chain,
        }
    }

    fn walk(graph: &LinkGraph, resolver: &FlatResolver, query: LinkQuery) -> Vec<ResolvedLink> {
        collect_links(graph, resolver, &query, LinkShape::Straight)
    }

    #[test]
    fn cycle_yields_each_edge_once_and_terminates() {
        let graph = LinkGraph::from_records([edge(1, 2, true), edge(2, 3, true), edge(3, 1, true)]);
        let resolver = FlatResolver { muted: vec![] };

        let links = walk(&graph, &resolver, query(1, Direction::Next, true));
        assert_eq!(links.len(), 3);

        let keys: HashSet<_> = links.iter().map(|link| link.key).collect();
        assert_eq!(keys.len(), 3);

        let both = walk(&graph, &resolver, query(1, Direction::Both, true));
        assert_eq!(both.len(), 3);
    }

    #[test]
    fn without_expansion_only_direct_edges() {
        let graph =
            LinkGraph::from_records([edge(1, 2, true), edge(2, 3, true), edge(4, 1, false)]);
        let resolver = FlatResolver { muted: vec![] };

        let next = walk(&graph, &resolver, query(1, Direction::Next, false));
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].next, Endpoint::Item(LocalId::from(2)));

        let prev = walk(&graph, &resolver, query(1, Direction::Prev, false));
        assert_eq!(prev.len(), 1);
        assert_eq!(prev[0].prev, Endpoint::Item(LocalId::from(4)));
    }

    #[test]
    fn non_transitive_edges_stop_the_chain() {
        let graph = LinkGraph::from_records([edge(1, 2, false), edge(2, 3, true)]);
        let resolver = FlatResolver { muted: vec![] };

        let links = walk(&graph, &resolver, query(1, Direction::Next, true));
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn suppressed_nodes_contribute_no_edges() {
        let graph = LinkGraph::from_records([edge(1, 2, true), edge(2, 3, true)]);
        let resolver = FlatResolver { muted: vec![2] };

        let links = walk(&graph, &resolver, query(1, Direction::Next, true));
        assert_eq!(links.len(), 1);

        let muted_anchor = FlatResolver { muted: vec![1] };
        assert!(walk(&graph, &muted_anchor, query(1, Direction::Next, true)).is_empty());
    }

    #[test]
    fn default_shape_applies_only_when_unset() {
        let mut curved = edge(1, 3, false);
        curved.shape = Some(LinkShape::Curved);
        let graph = LinkGraph::from_records([edge(1, 2, false), curved]);
        let resolver = FlatResolver { muted: vec![] };

        let links = walk(&graph, &resolver, query(1, Direction::Next, false));
        let shapes: Vec<_> = links.iter().map(|link| (link.key.next.raw(), link.shape)).collect();
        assert!(shapes.contains(&(2, LinkShape::Straight)));
        assert!(shapes.contains(&(3, LinkShape::Curved)));
    }

    #[test]
    fn collect_all_ignores_walk_and_suppression() {
        let graph = LinkGraph::from_records([edge(1, 2, false), edge(5, 6, false)]);
        let resolver = FlatResolver { muted: vec![1, 5] };
        assert_eq!(collect_all_links(&graph, &resolver, LinkShape::Orthogonal).len(), 2);
    }
}
