use thiserror::Error;

use crate::path::Path;

/// Errors originating from the core module.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Referenced file does not exist.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: String,
    },

    /// Unsupported document format.
    #[error("Unsupported format: {format}")]
    UnsupportedFormat {
        /// The format string that is unsupported.
        format: String,
    },
}

/// Errors raised by the nested-structure operations.
///
/// Every variant is returned synchronously to the immediate caller; no
/// operation retries or recovers internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NestedError {
    /// Two flat paths collide, or one is a strict prefix of another.
    #[error("Conflicting keys: {path}")]
    ConflictingKeys {
        /// Full path of the entry that could not be placed.
        path: Path,
    },

    /// A strict merge found differing values for the same key.
    #[error("Merge conflict at {path}: {values}")]
    MergeConflict {
        /// Path of the conflicting key.
        path: Path,
        /// Rendering of every value present for the key, left to right.
        values: String,
    },

    /// Co-traversed arguments do not share the same shape.
    #[error("Structural mismatch at {path}: {reason}")]
    StructuralMismatch {
        /// Location of the first disagreeing node.
        path: Path,
        /// What disagreed.
        reason: String,
    },

    /// Indexing failed somewhere along the path.
    #[error("Path not found: {path}")]
    PathNotFound {
        /// The requested path.
        path: Path,
    },

    /// An operation that needs at least one key got an empty path.
    #[error("Empty path")]
    EmptyPath,

    /// A string path or flat key was to be split on an empty separator.
    #[error("Empty separator")]
    EmptySeparator,

    /// A record could not be rebuilt from field values.
    #[error("Invalid record {type_name}: {reason}")]
    InvalidRecord {
        /// Record type name.
        type_name: &'static str,
        /// Why the rebuild failed.
        reason: String,
    },
}
