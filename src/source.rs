//! The documentation generator's per-build index, as handed to the search builder.
//!
//! The generator writes one JSON image per build with its object, title and term tables.
//! Everything here is read-only; scalar-or-list values are normalized while deserializing
//! so nothing downstream has to care which shape the generator chose.

use crate::error::Result;
use anyhow::{Context, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One row of the object table: `[document_index, object_type_index, priority, anchor]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "(usize, usize, i32, String)")]
pub struct ObjectRecord {
    pub document: usize,
    pub object_type: usize,
    pub priority: i32,
    pub anchor: String,
}

impl From<(usize, usize, i32, String)> for ObjectRecord {
    fn from((document, object_type, priority, anchor): (usize, usize, i32, String)) -> Self {
        Self {
            document,
            object_type,
            priority,
            anchor,
        }
    }
}

/// Document indices for a term, normalized to a list.
///
/// The generator stores a bare integer when a term occurs in a single document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "OneOrMany")]
pub struct DocIndices(Vec<usize>);

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(usize),
    Many(Vec<usize>),
}

impl From<OneOrMany> for DocIndices {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(index) => Self(vec![index]),
            OneOrMany::Many(indices) => Self(indices),
        }
    }
}

impl DocIndices {
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<usize>> for DocIndices {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

/// Object table: namespace prefix → symbol name → record.
pub type ObjectTable = BTreeMap<String, BTreeMap<String, ObjectRecord>>;

/// Term table: term → documents containing it.
pub type TermTable = BTreeMap<String, DocIndices>;

/// The generator's raw search index for one build.
///
/// Tables are ordered maps, so iteration (and therefore reference assignment) is
/// deterministic for a given input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneratorIndex {
    /// Document base names (newer generators).
    #[serde(default)]
    docnames: Option<Vec<String>>,
    /// Document file names (older generators, or alongside `docnames`).
    #[serde(default)]
    filenames: Option<Vec<String>>,
    #[serde(default)]
    pub titles: Vec<String>,
    #[serde(default)]
    pub objects: ObjectTable,
    #[serde(default)]
    pub objtypes: BTreeMap<usize, String>,
    #[serde(default)]
    pub titleterms: TermTable,
    #[serde(default)]
    pub terms: TermTable,
}

impl GeneratorIndex {
    /// Parses a generator index image.
    pub fn from_json(json: &str) -> Result<Self> {
        let index: Self =
            serde_json::from_str(json).context("Failed to parse generator search index")?;
        if index.docnames.is_none() && index.filenames.is_none() {
            bail!("Generator search index lists neither 'docnames' nor 'filenames'");
        }
        Ok(index)
    }

    /// Reads and parses a generator index image from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read generator index {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Invalid index in {}", path.display()))
    }

    /// Document base names used for result links, `docnames` taking precedence.
    pub fn document_names(&self) -> &[String] {
        self.docnames
            .as_deref()
            .or(self.filenames.as_deref())
            .unwrap_or_default()
    }

    /// Builder-style constructor for in-memory indexes.
    pub fn with_documents(documents: Vec<String>, titles: Vec<String>) -> Self {
        Self {
            docnames: Some(documents),
            titles,
            ..Self::default()
        }
    }

    /// Adds one object-table row, registering its object type when new.
    pub fn add_object(
        &mut self,
        prefix: &str,
        name: &str,
        document: usize,
        object_type: &str,
        anchor: &str,
    ) {
        let type_index = match self.objtypes.iter().find(|(_, t)| *t == object_type) {
            Some((&index, _)) => index,
            None => {
                let index = self.objtypes.len();
                self.objtypes.insert(index, object_type.to_string());
                index
            }
        };
        self.objects.entry(prefix.to_string()).or_default().insert(
            name.to_string(),
            ObjectRecord {
                document,
                object_type: type_index,
                priority: 1,
                anchor: anchor.to_string(),
            },
        );
    }
}
