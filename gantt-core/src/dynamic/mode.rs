//! Resolved dynamic-child mode descriptors.

use std::collections::HashMap;
use std::str::FromStr;

use crate::config::ChildModeConfig;
use crate::error::{GanttError, Result};
use crate::identity::{ClassId, GId};
use crate::store::GraphItem;

/// Which identifier of an item (or row) correlates parents with children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Item,
    Group,
    Data,
    /// The whole row stands for itself.
    Row,
}

impl KeyKind {
    /// The key this kind extracts from `item`.
    pub fn key_of(self, item: &GraphItem) -> Option<GId> {
        match self {
            KeyKind::Item => Some(item.id),
            KeyKind::Group => item.group_id,
            KeyKind::Data => item.data_id,
            KeyKind::Row => Some(item.row_id),
        }
    }
}

impl FromStr for KeyKind {
    type Err = GanttError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "item" => Ok(KeyKind::Item),
            "group" => Ok(KeyKind::Group),
            "data" => Ok(KeyKind::Data),
            "row" => Ok(KeyKind::Row),
            other => Err(GanttError::InvalidConfig(format!("unknown key kind `{other}`"))),
        }
    }
}

/// Per-class rule for copying a source item into a clone row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyBehavior {
    /// Never copied.
    None,
    /// Always copied.
    Always,
    /// Copied when the item's key exists in the parent key map.
    ExistsPair,
    /// Copied when the matched parent range and the item's range intersect.
    SynchronPair,
}

impl FromStr for CopyBehavior {
    type Err = GanttError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(CopyBehavior::None),
            "always" => Ok(CopyBehavior::Always),
            "existspair" => Ok(CopyBehavior::ExistsPair),
            "synchronpair" => Ok(CopyBehavior::SynchronPair),
            other => Err(GanttError::InvalidConfig(format!("unknown copy behaviour `{other}`"))),
        }
    }
}

/// Typed class number → copy behaviour table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyBehaviorTable {
    rules: HashMap<ClassId, CopyBehavior>,
}

impl CopyBehaviorTable {
    /// Explicit rule for `class`, if one was given.
    pub fn get(&self, class: ClassId) -> Option<CopyBehavior> {
        self.rules.get(&class).copied()
    }

    /// Set the rule for `class`. A later rule wins.
    pub fn insert(&mut self, class: ClassId, behavior: CopyBehavior) {
        self.rules.insert(class, behavior);
    }

    /// Number of explicit rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when no explicit rule was given.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromStr for CopyBehaviorTable {
    type Err = GanttError;

    /// Parses `"10=Always; 12=SynchronPair, 14 = none"`.
    fn from_str(s: &str) -> Result<Self> {
        let mut table = Self::default();
        for entry in s.split([';', ',']).map(str::trim).filter(|entry| !entry.is_empty()) {
            let (class, behavior) = entry.split_once('=').ok_or_else(|| {
                GanttError::InvalidConfig(format!("expected `class=behaviour`, got `{entry}`"))
            })?;
            let class = class.trim();
            let class: u32 = class
                .parse()
                .map_err(|_| GanttError::InvalidConfig(format!("bad class number `{class}`")))?;
            table.insert(ClassId(class), behavior.parse()?);
        }
        Ok(table)
    }
}

/// Where candidate child rows come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildSource {
    /// The table's own rows.
    Local(SourceScope),
    /// Rows of another named table.
    Table { name: String, scope: SourceScope },
}

impl ChildSource {
    /// Which rows of the source are candidates.
    pub fn scope(&self) -> SourceScope {
        match self {
            ChildSource::Local(scope) | ChildSource::Table { scope, .. } => *scope,
        }
    }
}

/// Which rows of the source table are candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceScope {
    #[default]
    AllRows,
    RootRows,
    /// Rows the source table already resolved as its own dynamic children.
    DynamicChildren,
}

impl FromStr for SourceScope {
    type Err = GanttError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(SourceScope::AllRows),
            "roots" | "root" => Ok(SourceScope::RootRows),
            "dynamic" | "children" => Ok(SourceScope::DynamicChildren),
            other => Err(GanttError::InvalidConfig(format!("unknown source scope `{other}`"))),
        }
    }
}

/// Dynamic evaluation parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicMode {
    pub parent_key: KeyKind,
    pub child_key: KeyKind,
    pub visible_window_only: bool,
    pub require_intersection: bool,
    pub source: ChildSource,
    pub class_rules: CopyBehaviorTable,
}

impl DynamicMode {
    /// Behaviour for an item class.
    ///
    /// Classes without an explicit rule follow the mode: `SynchronPair` when
    /// time intersection is required, `ExistsPair` otherwise.
    pub fn behavior_for(&self, class: ClassId) -> CopyBehavior {
        self.class_rules.get(class).unwrap_or(if self.require_intersection {
            CopyBehavior::SynchronPair
        } else {
            CopyBehavior::ExistsPair
        })
    }
}

/// Resolved, immutable dynamic-child mode of a table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChildMode {
    /// No dynamic evaluation.
    #[default]
    Static,
    Dynamic(DynamicMode),
}

impl ChildMode {
    /// Parse the raw configuration once.
    pub fn from_config(config: &ChildModeConfig) -> Result<Self> {
        match config.mode.trim().to_ascii_lowercase().as_str() {
            "" | "static" => return Ok(ChildMode::Static),
            "dynamic" => {}
            other => return Err(GanttError::InvalidConfig(format!("unknown child mode `{other}`"))),
        }

        let scope: SourceScope = config.source_scope.parse()?;
        let source = match &config.source_table {
            Some(name) if !name.trim().is_empty() => ChildSource::Table {
                name: name.trim().to_string(),
                scope,
            },
            _ => ChildSource::Local(scope),
        };

        Ok(ChildMode::Dynamic(DynamicMode {
            parent_key: config.parent_key.parse()?,
            child_key: config.child_key.parse()?,
            visible_window_only: config.visible_window_only,
            require_intersection: config.require_intersection,
            source,
            class_rules: config.class_behaviors.parse()?,
        }))
    }

    /// True when no dynamic children are computed.
    pub fn is_static(&self) -> bool {
        matches!(self, ChildMode::Static)
    }
}
