//! The persisted search bundle: text index plus back-reference table.

use crate::entry::{EntrySet, IndexEntry};
use crate::error::{BundleWriteError, CorruptIndexError};
use crate::search::TextIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use xxhash_rust::xxh3::xxh3_64;

/// Version of the bundle layout written by this crate.
pub const BUNDLE_FORMAT: u32 = 1;

/// Where the bundle lives relative to the build output directory.
pub const DEFAULT_BUNDLE_PATH: &str = "_static/js/lunrindex.json";

/// Everything a query client needs, in one JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexBundle {
    pub format: u32,
    /// Absent when pre-building was unavailable; clients then index `documents` themselves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<TextIndex>,
    /// Back-reference table: reference → entry.
    pub documents: BTreeMap<u32, IndexEntry>,
}

impl IndexBundle {
    pub fn new(index: Option<TextIndex>, entries: &EntrySet) -> Self {
        Self {
            format: BUNDLE_FORMAT,
            index,
            documents: entries
                .iter()
                .map(|entry| (entry.reference, entry.clone()))
                .collect(),
        }
    }

    /// Serializes to the text image that gets deployed.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parses and validates a bundle image.
    pub fn parse(bytes: &[u8]) -> Result<Self, CorruptIndexError> {
        let bundle: Self =
            serde_json::from_slice(bytes).map_err(|e| CorruptIndexError::Parse(e.to_string()))?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Checks the join between the text index and the back-reference table.
    pub fn validate(&self) -> Result<(), CorruptIndexError> {
        if self.format != BUNDLE_FORMAT {
            return Err(CorruptIndexError::Format {
                found: self.format,
                expected: BUNDLE_FORMAT,
            });
        }

        if let Some((&key, entry)) = self
            .documents
            .iter()
            .find(|(key, entry)| **key != entry.reference)
        {
            return Err(CorruptIndexError::MismatchedReference {
                key,
                reference: entry.reference,
            });
        }

        if let Some(index) = &self.index {
            if let Some(reference) = index
                .cited_references()
                .find(|reference| !self.documents.contains_key(reference))
            {
                return Err(CorruptIndexError::DanglingReference { reference });
            }
            index.validate()?;
        }

        Ok(())
    }

    /// The back-reference table as an entry list, ordered by reference.
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.documents.values()
    }
}

/// Content digest of a serialized bundle (xxh3, 16 hex digits).
pub fn digest(image: &str) -> String {
    format!("{:016x}", xxh3_64(image.as_bytes()))
}

/// Writes a bundle image, creating parent directories as needed.
pub fn write_bundle(path: &Path, image: &str) -> Result<(), BundleWriteError> {
    let wrap = |source| BundleWriteError {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(wrap)?;
    }
    std::fs::write(path, image).map_err(wrap)?;
    tracing::debug!("Wrote search bundle to {}", path.display());
    Ok(())
}
