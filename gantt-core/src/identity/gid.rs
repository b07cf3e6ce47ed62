//! Composite external identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Item class number. Class `0` marks an identifier without a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub u32);

/// Record number within a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

/// Optional sub-entry within a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub i64);

/// Immutable composite identifier `{class, record, entry?}`.
///
/// Two `GId`s are the same identifier exactly when all three parts are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GId {
    pub class: ClassId,
    pub record: RecordId,
    #[serde(default)]
    pub entry: Option<EntryId>,
}

impl GId {
    /// Identifier without an entry part.
    pub const fn new(class: u32, record: i64) -> Self {
        Self {
            class: ClassId(class),
            record: RecordId(record),
            entry: None,
        }
    }

    /// Identifier with an entry part.
    pub const fn with_entry(class: u32, record: i64, entry: i64) -> Self {
        Self {
            class: ClassId(class),
            record: RecordId(record),
            entry: Some(EntryId(entry)),
        }
    }

    /// False for identifiers that never resolved to a class.
    pub fn has_class(&self) -> bool {
        self.class.0 != 0
    }
}

impl fmt::Display for GId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.class.0, self.record.0)?;
        if let Some(entry) = self.entry {
            write!(f, "/{}", entry.0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_covers_every_part() {
        assert_eq!(GId::new(3, 7), GId::new(3, 7));
        assert_ne!(GId::new(3, 7), GId::new(4, 7));
        assert_ne!(GId::new(3, 7), GId::with_entry(3, 7, 1));
        assert_ne!(GId::with_entry(3, 7, 1), GId::with_entry(3, 7, 2));
    }

    #[test]
    fn display_includes_entry_when_present() {
        assert_eq!(GId::new(3, 7).to_string(), "3:7");
        assert_eq!(GId::with_entry(3, 7, 2).to_string(), "3:7/2");
    }

    #[test]
    fn class_zero_means_classless() {
        assert!(!GId::new(0, 1).has_class());
        assert!(GId::new(1, 1).has_class());
    }
}
