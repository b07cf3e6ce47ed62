//! Error types for the gantt-core crate.
//!
//! Only broken host contracts are errors. Lookup misses are reported through
//! `Option`/`bool`, and malformed link declarations are filtered out before
//! they reach an index.

use thiserror::Error;

use crate::identity::GId;

/// Errors raised by the refresh and resolution entry points.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GanttError {
    /// A refresh request carried neither an identifier nor a snapshot.
    #[error("refresh request carries neither an item id nor a snapshot")]
    MissingItemId,

    /// An item insert could not derive the row it belongs to.
    #[error("no row id derivable for item {0}")]
    MissingRowId(GId),

    /// A row refresh request carried neither an identifier nor a snapshot.
    #[error("row refresh request carries neither a row id nor a snapshot")]
    MissingRowSnapshot,

    /// Configuration text failed to parse.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A dynamic child mode names a table the lookup service does not know.
    #[error("unknown table `{0}`")]
    UnknownTable(String),

    /// The source table is mutably borrowed (re-entrant resolution).
    #[error("table `{0}` is busy")]
    TableBusy(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GanttError>;

impl From<serde_json::Error> for GanttError {
    fn from(err: serde_json::Error) -> Self {
        GanttError::InvalidConfig(err.to_string())
    }
}
