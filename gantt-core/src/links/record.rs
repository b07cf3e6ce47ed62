//! Link declarations and records.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::identity::{GId, IdentityIndex, LocalId};
use crate::store::Color;

/// How a dependency line is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkShape {
    Straight,
    #[default]
    Orthogonal,
    Curved,
}

/// Where a link came from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkSource {
    /// Table that declared the link, when it is not the owning table.
    #[serde(default)]
    pub table: Option<String>,
    /// Record that declared the link.
    #[serde(default)]
    pub declared_by: Option<GId>,
}

/// Host-side link declaration, endpoints still as external identifiers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinkDeclaration {
    #[serde(default)]
    pub prev: Option<GId>,
    #[serde(default)]
    pub next: Option<GId>,
    #[serde(default)]
    pub shape: Option<LinkShape>,
    #[serde(default = "default_width")]
    pub width: u16,
    #[serde(default)]
    pub color: Color,
    /// Whole-chain queries keep walking past this edge.
    #[serde(default)]
    pub transitive: bool,
    #[serde(default)]
    pub source: LinkSource,
}

fn default_width() -> u16 {
    1
}

impl LinkDeclaration {
    /// A plain, non-transitive link from `prev` to `next`.
    pub fn new(prev: GId, next: GId) -> Self {
        Self {
            prev: Some(prev),
            next: Some(next),
            width: default_width(),
            ..Self::default()
        }
    }

    /// Mark the link as part of a chain.
    pub fn transitive(mut self) -> Self {
        self.transitive = true;
        self
    }

    /// Override the table default shape.
    pub fn with_shape(mut self, shape: LinkShape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Intern both endpoints and build the record.
    ///
    /// Declarations with a missing endpoint, identical endpoints or a
    /// class-less endpoint are dropped here. They are expected noise from
    /// sparse configuration.
    pub fn resolve(&self, ids: &mut IdentityIndex) -> Option<LinkRecord> {
        let (Some(prev), Some(next)) = (self.prev, self.next) else {
            trace!(prev = ?self.prev, next = ?self.next, "dropping link with a missing endpoint");
            return None;
        };
        if prev == next {
            trace!(endpoint = %prev, "dropping self link");
            return None;
        }
        if !prev.has_class() || !next.has_class() {
            trace!(%prev, %next, "dropping link with a class-less endpoint");
            return None;
        }

        Some(LinkRecord {
            prev: ids.get_id(prev),
            next: ids.get_id(next),
            shape: self.shape,
            width: self.width,
            color: self.color,
            transitive: self.transitive,
            source: self.source.clone(),
        })
    }
}

/// Identity of an edge: its two endpoints in declaration direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
    pub prev: LocalId,
    pub next: LocalId,
}

/// A directed edge between two local ids (item- or group-level).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub prev: LocalId,
    pub next: LocalId,
    /// Explicit shape; the table default applies when absent.
    pub shape: Option<LinkShape>,
    pub width: u16,
    pub color: Color,
    pub transitive: bool,
    pub source: LinkSource,
}

impl LinkRecord {
    /// The `(prev, next)` pair identifying this edge.
    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            prev: self.prev,
            next: self.next,
        }
    }
}
