//! Error handling types and utilities.

use std::path::PathBuf;
use thiserror::Error;

/// A specialized Result type for lunrsearch operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods at the application edge (reading generator input, CLI).
pub type Result<T> = anyhow::Result<T>;

/// A symbol that could not be turned into an index entry.
///
/// Never fatal: the entry is skipped and the build continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("skipping malformed entry ({prefix:?}, {name:?}, {object_type:?}): {reason}")]
pub struct MalformedEntryWarning {
    pub prefix: String,
    pub name: String,
    pub object_type: String,
    pub reason: MalformedReason,
}

/// Why an object-table entry was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// A `cpp:` name without any `::` scope separator.
    MissingScope,
    /// The document index points past the document list.
    UnknownDocument(usize),
    /// The object type index is absent from the type table.
    UnknownObjectType(usize),
    /// The document exists but has no title to show.
    MissingTitle(usize),
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingScope => f.write_str("no scope separator in name"),
            Self::UnknownDocument(index) => write!(f, "unknown document index {}", index),
            Self::UnknownObjectType(index) => write!(f, "unknown object type index {}", index),
            Self::MissingTitle(index) => write!(f, "document {} has no title", index),
        }
    }
}

/// The text engine cannot pre-build an index for this build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("search index pre-building unavailable: {reason}")]
pub struct IndexBuildUnavailable {
    pub reason: String,
}

/// Writing the bundle to disk failed. Search is unavailable for this deployment.
#[derive(Debug, Error)]
#[error("failed to write search bundle to {}: {source}", path.display())]
pub struct BundleWriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// The bundle handed to a query client is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorruptIndexError {
    #[error("bundle could not be read: {0}")]
    Fetch(String),
    #[error("bundle could not be parsed: {0}")]
    Parse(String),
    #[error("unsupported bundle format {found} (expected {expected})")]
    Format { found: u32, expected: u32 },
    #[error("text index cites reference {reference} missing from the back-reference table")]
    DanglingReference { reference: u32 },
    #[error("back-reference key {key} maps to an entry with reference {reference}")]
    MismatchedReference { key: u32, reference: u32 },
}

/// A query was issued before the client finished loading its bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("search index is not loaded yet")]
pub struct NotReadyError;

/// Errors surfaced to the caller of a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error(transparent)]
    NotReady(#[from] NotReadyError),
    #[error("search unavailable: {0}")]
    Unavailable(#[from] CorruptIndexError),
}
