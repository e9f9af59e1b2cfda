//! Index entries: the unit the search index is built over.

use serde::{Deserialize, Serialize};
use std::ops::Index;

/// What an entry stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    ApiSymbol,
    Title,
    Term,
    None,
}

/// An entry before it has been given a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub source_file: String,
    pub kind: EntryKind,
    pub object_type: String,
    pub namespace_prefix: String,
    pub short_prefix: String,
    pub name: String,
    pub display_name: String,
    pub anchor_id: String,
}

impl EntryDraft {
    /// Attaches a reference, producing the immutable entry.
    pub(crate) fn into_entry(self, reference: u32) -> IndexEntry {
        IndexEntry {
            reference,
            source_file: self.source_file,
            kind: self.kind,
            object_type: self.object_type,
            namespace_prefix: self.namespace_prefix,
            short_prefix: self.short_prefix,
            name: self.name,
            display_name: self.display_name,
            anchor_id: self.anchor_id,
        }
    }
}

/// One indexable unit together with everything needed to render it as a result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexEntry {
    pub reference: u32,
    pub source_file: String,
    pub kind: EntryKind,
    #[serde(default)]
    pub object_type: String,
    pub namespace_prefix: String,
    pub short_prefix: String,
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub anchor_id: String,
}

impl IndexEntry {
    pub fn has_anchor(&self) -> bool {
        !self.anchor_id.is_empty()
    }
}

/// Entries in extraction order, with contiguous ascending references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntrySet {
    entries: Vec<IndexEntry>,
}

impl EntrySet {
    /// Wraps entries whose references ascend without gaps.
    pub(crate) const fn from_dense(entries: Vec<IndexEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndexEntry> {
        self.entries.iter()
    }

    /// Looks an entry up by its reference.
    pub fn get(&self, reference: u32) -> Option<&IndexEntry> {
        self.entries
            .binary_search_by_key(&reference, |entry| entry.reference)
            .ok()
            .map(|position| &self.entries[position])
    }

    pub fn into_vec(self) -> Vec<IndexEntry> {
        self.entries
    }
}

impl Index<usize> for EntrySet {
    type Output = IndexEntry;

    fn index(&self, index: usize) -> &IndexEntry {
        &self.entries[index]
    }
}

impl<'a> IntoIterator for &'a EntrySet {
    type Item = &'a IndexEntry;
    type IntoIter = std::slice::Iter<'a, IndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
