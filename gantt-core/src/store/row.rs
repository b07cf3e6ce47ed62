//! Rows and their graphs.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::item::{GraphItem, ItemSnapshot};
use crate::identity::GId;

/// Ordered, mutable collection of the graph items shown on one row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    items: IndexMap<GId, GraphItem>,
}

impl Graph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Item `id`, hidden or not.
    pub fn get(&self, id: &GId) -> Option<&GraphItem> {
        self.items.get(id)
    }

    /// Mutable access to item `id`.
    pub fn get_mut(&mut self, id: &GId) -> Option<&mut GraphItem> {
        self.items.get_mut(id)
    }

    /// True if the graph holds `id`.
    pub fn contains(&self, id: &GId) -> bool {
        self.items.contains_key(id)
    }

    /// Insert or replace an item, keeping the position of a replaced one.
    pub fn upsert(&mut self, item: GraphItem) {
        self.items.insert(item.id, item);
    }

    /// Remove an item, preserving the order of the rest.
    pub fn remove(&mut self, id: &GId) -> Option<GraphItem> {
        self.items.shift_remove(id)
    }

    /// Items in insertion order, hidden ones included.
    pub fn iter(&self) -> impl Iterator<Item = &GraphItem> {
        self.items.values()
    }

    /// Items with `visible` set.
    pub fn visible(&self) -> impl Iterator<Item = &GraphItem> {
        self.items.values().filter(|item| item.visible)
    }

    /// Clear `visible` on every item. Items stay in the graph.
    pub fn hide_all(&mut self) {
        for item in self.items.values_mut() {
            item.visible = false;
        }
    }

    /// Number of items, hidden ones included.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the graph holds no item at all.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Free-form row payload. Copied into dynamic-child clones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowData {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

/// Host payload for one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowSnapshot {
    pub id: GId,
    #[serde(default)]
    pub parent: Option<GId>,
    #[serde(default)]
    pub data: RowData,
    /// Row-tag items (badges shown in the row header, not on the timeline).
    #[serde(default)]
    pub tags: Vec<ItemSnapshot>,
}

impl RowSnapshot {
    /// A root row snapshot with empty data.
    pub fn new(id: GId) -> Self {
        Self {
            id,
            parent: None,
            data: RowData::default(),
            tags: Vec::new(),
        }
    }

    /// Nest the row under `parent`.
    pub fn with_parent(mut self, parent: GId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.data.label = label.into();
        self
    }
}

/// A row in the table hierarchy. Owns zero or one graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: GId,
    pub parent: Option<GId>,
    pub data: RowData,
    pub tags: Vec<GraphItem>,
    pub graph: Option<Graph>,
}

impl Row {
    /// Row shell with no data, tags or graph.
    pub fn bare(id: GId) -> Self {
        Self {
            id,
            parent: None,
            data: RowData::default(),
            tags: Vec::new(),
            graph: None,
        }
    }

    /// Build row `id` from a snapshot. Tag items are stamped with `id`, which
    /// wins over the snapshot's own id.
    pub fn from_snapshot(id: GId, snapshot: &RowSnapshot, skin_index: u32) -> Self {
        Self {
            id,
            parent: snapshot.parent,
            data: snapshot.data.clone(),
            tags: tags_from(id, snapshot, skin_index),
            graph: None,
        }
    }

    /// Clone used as a dynamic child under `parent`.
    ///
    /// Carries the row data only: no graph items and no row tags.
    pub fn clone_shell(&self, parent: GId) -> Self {
        Self {
            id: self.id,
            parent: Some(parent),
            data: self.data.clone(),
            tags: Vec::new(),
            graph: Some(Graph::new()),
        }
    }

    /// True for rows without a parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Iterate every item of the row's graph (empty when there is none).
    pub fn items(&self) -> impl Iterator<Item = &GraphItem> {
        self.graph.iter().flat_map(|graph| graph.iter())
    }

    /// Merge a snapshot. The parent link is authoritative and always
    /// replaced; label and fields follow the item merge rules.
    pub fn merge(&mut self, snapshot: &RowSnapshot, skin_index: u32) -> bool {
        let mut changed = false;

        if self.parent != snapshot.parent {
            self.parent = snapshot.parent;
            changed = true;
        }
        if !snapshot.data.label.is_empty() && self.data.label != snapshot.data.label {
            self.data.label = snapshot.data.label.clone();
            changed = true;
        }
        for (key, value) in &snapshot.data.fields {
            if self.data.fields.get(key) != Some(value) {
                self.data.fields.insert(key.clone(), value.clone());
                changed = true;
            }
        }
        if !snapshot.tags.is_empty() {
            let tags = tags_from(self.id, snapshot, skin_index);
            if tags != self.tags {
                self.tags = tags;
                changed = true;
            }
        }

        changed
    }
}

fn tags_from(row_id: GId, snapshot: &RowSnapshot, skin_index: u32) -> Vec<GraphItem> {
    snapshot
        .tags
        .iter()
        .map(|tag| GraphItem::from_snapshot(tag.id, row_id, tag, skin_index))
        .collect()
}
