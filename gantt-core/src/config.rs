//! Table Configuration
//!
//! Raw, host-supplied configuration. It is read once when a table is built;
//! free-form text fields (key kinds, copy-behaviour rules) are parsed into
//! typed descriptors at that point and never looked at again.
//!
//! # Example
//!
//! ```rust
//! use gantt_core::config::TableConfig;
//!
//! let config = TableConfig::from_json(r#"{
//!     "name": "crew",
//!     "link_shape": "curved",
//!     "children": {
//!         "mode": "dynamic",
//!         "parent_key": "data",
//!         "child_key": "data",
//!         "source_table": "equipment",
//!         "source_scope": "roots",
//!         "class_behaviors": "10=SynchronPair; 11=Always"
//!     }
//! }"#).unwrap();
//! assert_eq!(config.name, "crew");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::links::LinkShape;

/// Configuration of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Name under which other tables look this one up.
    pub name: String,
    /// Shape used for links that do not declare one.
    #[serde(default)]
    pub link_shape: LinkShape,
    /// Skin index stamped on newly created items.
    #[serde(default)]
    pub active_skin: u32,
    /// Dynamic child row behaviour.
    #[serde(default)]
    pub children: ChildModeConfig,
}

impl TableConfig {
    /// A static table named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link_shape: LinkShape::default(),
            active_skin: 0,
            children: ChildModeConfig::default(),
        }
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Use `children` as the dynamic child mode.
    pub fn with_children(mut self, children: ChildModeConfig) -> Self {
        self.children = children;
        self
    }

    /// Shape for links that do not set their own.
    pub fn with_link_shape(mut self, shape: LinkShape) -> Self {
        self.link_shape = shape;
        self
    }
}

/// Raw dynamic-child configuration, as text.
///
/// An empty or `"static"` mode disables dynamic evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChildModeConfig {
    /// `"static"` or `"dynamic"`.
    pub mode: String,
    /// One of `item`, `group`, `data`, `row`.
    pub parent_key: String,
    /// One of `item`, `group`, `data`, `row`.
    pub child_key: String,
    /// Only parent items overlapping the visible window contribute keys.
    pub visible_window_only: bool,
    /// Sources must overlap in time, not just share a key.
    pub require_intersection: bool,
    /// Take candidate rows from this other table.
    pub source_table: Option<String>,
    /// One of `all`, `roots`, `dynamic`. Empty means `all`.
    pub source_scope: String,
    /// `"<class>=<Behaviour>"` entries separated by `;` or `,`.
    pub class_behaviors: String,
}

impl ChildModeConfig {
    /// Dynamic mode keyed by the two given key kinds.
    pub fn dynamic(parent_key: &str, child_key: &str) -> Self {
        Self {
            mode: "dynamic".into(),
            parent_key: parent_key.into(),
            child_key: child_key.into(),
            ..Self::default()
        }
    }

    /// Take candidates from `table`, limited to `scope`.
    pub fn sourced_from(mut self, table: impl Into<String>, scope: &str) -> Self {
        self.source_table = Some(table.into());
        self.source_scope = scope.into();
        self
    }

    /// Per-class copy rules, in `class=Behaviour` form.
    pub fn with_class_behaviors(mut self, rules: impl Into<String>) -> Self {
        self.class_behaviors = rules.into();
        self
    }
}
