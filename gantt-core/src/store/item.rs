//! Graph items and their incoming snapshots.
//!
//! A [`GraphItem`] is the stored record; an [`ItemSnapshot`] is what the host
//! pushes on every refresh. Merging a snapshot into an existing item follows
//! "no change unless told otherwise" rules, see [`GraphItem::merge`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::identity::GId;
use crate::time::TimeRange;

/// Packed RGBA color.
///
/// [`Color::EMPTY`] is a sentinel meaning "leave unchanged" and never
/// overwrites a stored color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    pub const EMPTY: Color = Color(u32::MAX);

    /// True for the "keep stored value" sentinel.
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Overwrite `self` with `incoming` unless `incoming` is the sentinel.
    fn merge_from(&mut self, incoming: Color) {
        if !incoming.is_empty() {
            *self = incoming;
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Border line style. `Unset` is the "leave unchanged" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Unset,
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    fn merge_from(&mut self, incoming: LineStyle) {
        if incoming != LineStyle::Unset {
            *self = incoming;
        }
    }
}

/// One visual-skin override, keyed by skin name on the item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkinEntry {
    #[serde(default)]
    pub fill: Color,
    #[serde(default)]
    pub border: Color,
    #[serde(default)]
    pub style: LineStyle,
    /// Replace an existing entry under the same key instead of keeping it.
    #[serde(default)]
    pub refresh: bool,
}

/// Behaviour flags of a stored item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemBehavior {
    pub movable: bool,
    pub resizable: bool,
    /// Dependency lines are not drawn from this item (or its group).
    pub suppress_links: bool,
}

impl Default for ItemBehavior {
    fn default() -> Self {
        Self {
            movable: true,
            resizable: true,
            suppress_links: false,
        }
    }
}

/// Host payload for one graph item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub id: GId,
    #[serde(default)]
    pub row_id: Option<GId>,
    #[serde(default)]
    pub group_id: Option<GId>,
    #[serde(default)]
    pub data_id: Option<GId>,
    pub time: TimeRange,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub tooltip: String,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub layer: i32,
    #[serde(default)]
    pub fill: Color,
    #[serde(default)]
    pub border: Color,
    #[serde(default)]
    pub style: LineStyle,
    #[serde(default)]
    pub skins: BTreeMap<String, SkinEntry>,
    #[serde(default)]
    pub movable: Option<bool>,
    #[serde(default)]
    pub resizable: Option<bool>,
    #[serde(default)]
    pub suppress_links: Option<bool>,
}

impl ItemSnapshot {
    /// Minimal snapshot: identity, row and time, everything else defaulted.
    pub fn new(id: GId, row_id: GId, time: TimeRange) -> Self {
        Self {
            id,
            row_id: Some(row_id),
            group_id: None,
            data_id: None,
            time,
            label: String::new(),
            tooltip: String::new(),
            progress: 0,
            layer: 0,
            fill: Color::EMPTY,
            border: Color::EMPTY,
            style: LineStyle::Unset,
            skins: BTreeMap::new(),
            movable: None,
            resizable: None,
            suppress_links: None,
        }
    }

    /// Make the item a member of `group_id`.
    pub fn with_group(mut self, group_id: GId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// Set the data key used for dynamic child matching.
    pub fn with_data(mut self, data_id: GId) -> Self {
        self.data_id = Some(data_id);
        self
    }

    /// Set the fill color.
    pub fn with_fill(mut self, fill: Color) -> Self {
        self.fill = fill;
        self
    }
}

/// A time-ranged visual unit stored in exactly one row's graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphItem {
    pub id: GId,
    pub row_id: GId,
    pub group_id: Option<GId>,
    pub data_id: Option<GId>,
    pub time: TimeRange,
    pub label: String,
    pub tooltip: String,
    pub progress: u8,
    pub layer: i32,
    pub fill: Color,
    pub border: Color,
    pub style: LineStyle,
    pub skins: BTreeMap<String, SkinEntry>,
    /// Skin index active on the table when the item was created.
    pub skin_index: u32,
    pub behavior: ItemBehavior,
    /// Cleared when a dynamic-child clone no longer qualifies for the item.
    pub visible: bool,
}

impl GraphItem {
    /// Build a fresh item from a snapshot.
    pub fn from_snapshot(id: GId, row_id: GId, snapshot: &ItemSnapshot, skin_index: u32) -> Self {
        let defaults = ItemBehavior::default();
        Self {
            id,
            row_id,
            group_id: snapshot.group_id,
            data_id: snapshot.data_id,
            time: snapshot.time,
            label: snapshot.label.clone(),
            tooltip: snapshot.tooltip.clone(),
            progress: snapshot.progress,
            layer: snapshot.layer,
            fill: snapshot.fill,
            border: snapshot.border,
            style: snapshot.style,
            skins: snapshot.skins.clone(),
            skin_index,
            behavior: ItemBehavior {
                movable: snapshot.movable.unwrap_or(defaults.movable),
                resizable: snapshot.resizable.unwrap_or(defaults.resizable),
                suppress_links: snapshot.suppress_links.unwrap_or(defaults.suppress_links),
            },
            visible: true,
        }
    }

    /// Merge an incoming snapshot into this item.
    ///
    /// - time is always replaced
    /// - text and numeric fields overwrite only when non-default
    /// - group and data ids overwrite only when present
    /// - sentinel colors and styles leave the stored value alone
    /// - skins merge key by key; an existing key is replaced only when the
    ///   incoming entry carries `refresh`
    ///
    /// Returns true if anything changed. Row moves are the store's business.
    pub fn merge(&mut self, snapshot: &ItemSnapshot) -> bool {
        let before = self.clone();

        self.time = snapshot.time;

        if !snapshot.label.is_empty() {
            self.label = snapshot.label.clone();
        }
        if !snapshot.tooltip.is_empty() {
            self.tooltip = snapshot.tooltip.clone();
        }
        if snapshot.progress != 0 {
            self.progress = snapshot.progress;
        }
        if snapshot.layer != 0 {
            self.layer = snapshot.layer;
        }
        if snapshot.group_id.is_some() {
            self.group_id = snapshot.group_id;
        }
        if snapshot.data_id.is_some() {
            self.data_id = snapshot.data_id;
        }

        self.fill.merge_from(snapshot.fill);
        self.border.merge_from(snapshot.border);
        self.style.merge_from(snapshot.style);

        for (key, incoming) in &snapshot.skins {
            match self.skins.get_mut(key) {
                Some(existing) if incoming.refresh => *existing = incoming.clone(),
                Some(_) => {}
                None => {
                    self.skins.insert(key.clone(), incoming.clone());
                }
            }
        }

        if let Some(movable) = snapshot.movable {
            self.behavior.movable = movable;
        }
        if let Some(resizable) = snapshot.resizable {
            self.behavior.resizable = resizable;
        }
        if let Some(suppress) = snapshot.suppress_links {
            self.behavior.suppress_links = suppress;
        }

        *self != before
    }
}
