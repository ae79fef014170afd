//! Error types for template handling
//!
//! Provides error handling for:
//! - Document operations (file → [`Document`](crate::Document) → file)
//! - Migration loading (version → [`MigrationSet`](crate::MigrationSet))
//! - Migration application (operation → document)
//!
//! Field path and transform errors live next to their types in
//! [`crate::path`] and [`crate::migration::transform`].

use std::path::PathBuf;

pub use crate::migration::transform::TransformError;
pub use crate::path::PathError;

/// Errors while reading, parsing or writing documents
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error during file write
    #[error("io error writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed YAML input
    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// Malformed JSON input
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Syntax error in a named file
    #[error("syntax error in {path}: {message}")]
    Syntax { path: PathBuf, message: String },

    /// Serialization failed
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl DocumentError {
    /// Create read error for path
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create write error for path
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Create syntax error for path
    pub fn syntax_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Syntax {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors while loading or applying migration sets
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Version identifier cannot name a migration set
    #[error("invalid migration version '{0}': use letters, digits, '.', '_' or '-'")]
    InvalidVersion(String),

    /// IO error reading a migration set
    #[error("io error reading migration set {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Migration set is not a sequence of records
    #[error("invalid migration set {origin}: {message}")]
    InvalidSet { origin: String, message: String },

    /// A record for a known operation is malformed
    #[error("invalid migration record #{index} in {origin}: {message}")]
    InvalidRecord {
        origin: String,
        index: usize,
        message: String,
    },

    /// An operation could not be applied
    #[error("migration {version} failed at operation #{index} ({operation}): {source}")]
    Apply {
        version: String,
        index: usize,
        operation: String,
        #[source]
        source: PathError,
    },

    /// Document error
    #[error("document error: {0}")]
    Document(#[from] DocumentError),
}

impl MigrationError {
    /// Create invalid record error
    pub fn invalid_record(origin: impl Into<String>, index: usize, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            origin: origin.into(),
            index,
            message: message.into(),
        }
    }

    /// Create invalid set error
    pub fn invalid_set(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSet {
            origin: origin.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for template operations
pub type HarborResult<T> = Result<T, MigrationError>;
