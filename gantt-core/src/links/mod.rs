//! Link Graph
//!
//! Directed dependency links between graph items or groups.
//!
//! # Overview
//!
//! - Declarations arrive with external identifiers and are filtered and
//!   interned into [`LinkRecord`]s.
//! - A [`LinkGraph`] keeps two adjacency multimaps, one keyed by each edge's
//!   prev endpoint and one keyed by its next endpoint. They are built and
//!   patched together and are always mirror images.
//! - [`collect_links`] walks the graph breadth-first for a single anchor;
//!   [`collect_all_links`] lists every edge for the "always show" mode.
//!
//! Endpoints are resolved to whatever currently stands for them on screen
//! through the [`DrawableResolver`] seam.

mod adjacency;
mod record;
mod traversal;

pub use adjacency::LinkGraph;
pub use record::{EdgeKey, LinkDeclaration, LinkRecord, LinkShape, LinkSource};
pub use traversal::{
    collect_all_links, collect_links, Direction, DrawableResolver, Endpoint, LinkQuery,
    ResolvedLink,
};
